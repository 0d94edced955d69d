//! 棋谱记录格式
//!
//! 支持 JSON 格式的棋谱存储，以及 "1. e4 e5" 形式的着法文本

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{ChessError, Result};
use crate::game::Game;
use crate::moves::UciMove;
use crate::outcome::GameResult;

/// 棋谱版本
pub const RECORD_VERSION: &str = "1.0";

/// 对局元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    /// 白方玩家名
    pub white_player: String,
    /// 黑方玩家名
    pub black_player: String,
    /// 对局日期
    pub date: String,
    /// 对局结果
    pub result: Option<GameResult>,
}

/// 走法记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// UCI 走法
    pub uci: UciMove,
    /// 代数记谱
    pub san: String,
    /// 走完后的局面
    pub fen: String,
}

/// 完整的棋谱记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    /// 版本号
    pub version: String,
    /// 元数据
    pub metadata: GameMetadata,
    /// 初始局面 FEN
    pub initial_fen: String,
    /// 走法列表
    pub moves: Vec<MoveRecord>,
}

impl GameRecord {
    /// 从对局生成棋谱
    pub fn from_game(game: &Game, white_player: String, black_player: String) -> Self {
        let positions = game.positions();
        let moves = game
            .history()
            .iter()
            .zip(positions.iter().skip(1))
            .map(|(mv, fen)| MoveRecord {
                uci: mv.to_uci(),
                san: mv.notation().to_string(),
                fen: fen.clone(),
            })
            .collect();

        Self {
            version: RECORD_VERSION.to_string(),
            metadata: GameMetadata {
                white_player,
                black_player,
                date: Utc::now().format("%Y-%m-%d").to_string(),
                result: game.result(),
            },
            initial_fen: positions.first().cloned().unwrap_or_default(),
            moves,
        }
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 生成着法文本（如 "1. e4 e5 2. Nf3 1-0"）
    pub fn to_movetext(&self) -> String {
        let mut tokens = Vec::new();

        for (ply, (mv, before)) in self
            .moves
            .iter()
            .zip(std::iter::once(&self.initial_fen).chain(self.moves.iter().map(|m| &m.fen)))
            .enumerate()
        {
            let mut fields = before.split_whitespace();
            let white_to_move = fields.nth(1) == Some("w");
            let number = fields.nth(3).and_then(|n| n.parse::<u32>().ok()).unwrap_or(1);

            if white_to_move {
                tokens.push(format!("{}.", number));
            } else if ply == 0 {
                tokens.push(format!("{}...", number));
            }
            tokens.push(mv.san.clone());
        }

        if let Some(result) = &self.metadata.result {
            tokens.push(result.to_string());
        }

        tokens.join(" ")
    }

    /// 按记录重放对局，每一步都核对局面
    pub fn replay(&self) -> Result<Game> {
        let mut game = Game::from_fen(&self.initial_fen)?;

        for (ply, record) in self.moves.iter().enumerate() {
            game.apply(&record.uci)?;
            if game.fen() != record.fen {
                return Err(ChessError::fen(format!(
                    "Recorded position diverges at ply {}",
                    ply + 1
                )));
            }
        }

        Ok(game)
    }
}
