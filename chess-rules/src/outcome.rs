//! 走法结果与对局结果

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::piece::Color;

/// 走棋或载入局面后的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// 对局继续
    Moved,
    /// 对局继续，走子方被将军
    Check,
    /// 将死
    Checkmate,
    /// 逼和
    Stalemate,
    /// 五十回合和棋
    FiftyMoveDraw,
}

impl MoveOutcome {
    /// 对局是否结束
    pub fn is_game_over(&self) -> bool {
        matches!(
            self,
            MoveOutcome::Checkmate | MoveOutcome::Stalemate | MoveOutcome::FiftyMoveDraw
        )
    }
}

/// 对局状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Active,
    Checkmate,
    Stalemate,
    FiftyMoveDraw,
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        *self != GameStatus::Active
    }
}

/// 游戏结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// 白方胜
    WhiteWin(WinReason),
    /// 黑方胜
    BlackWin(WinReason),
    /// 和棋
    Draw(DrawReason),
}

/// 胜利原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    /// 将死
    Checkmate,
}

/// 和棋原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    /// 无子可动（逼和）
    Stalemate,
    /// 50 回合无吃子无动兵
    FiftyMoves,
}

impl GameResult {
    /// 根据终局状态与走子方得出结果，对局未结束时返回 None
    pub fn from_status(status: GameStatus, side_to_move: Color) -> Option<GameResult> {
        match status {
            GameStatus::Active => None,
            GameStatus::Checkmate => Some(match side_to_move {
                Color::White => GameResult::BlackWin(WinReason::Checkmate),
                Color::Black => GameResult::WhiteWin(WinReason::Checkmate),
            }),
            GameStatus::Stalemate => Some(GameResult::Draw(DrawReason::Stalemate)),
            GameStatus::FiftyMoveDraw => Some(GameResult::Draw(DrawReason::FiftyMoves)),
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score = match self {
            GameResult::WhiteWin(_) => "1-0",
            GameResult::BlackWin(_) => "0-1",
            GameResult::Draw(_) => "1/2-1/2",
        };
        f.write_str(score)
    }
}
