//! 棋谱存储
//!
//! 棋谱以 JSON 文件保存在系统数据目录下，文件名带时间戳与双方名称。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use chess_rules::{GameRecord, GameResult};

/// 棋谱存储管理器
pub struct GameStorage {
    games_dir: PathBuf,
}

impl GameStorage {
    /// 使用系统数据目录
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_dir().context("No data directory on this platform")?;
        Self::with_dir(data_dir.join("chess-rules").join("games"))
    }

    /// 使用指定目录
    pub fn with_dir(games_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&games_dir)
            .with_context(|| format!("Failed to create games directory {:?}", games_dir))?;
        Ok(Self { games_dir })
    }

    /// 保存棋谱，返回文件名
    pub fn save(&self, record: &GameRecord) -> Result<String> {
        let filename = generate_filename(
            &Utc::now(),
            &record.metadata.white_player,
            &record.metadata.black_player,
        );
        let path = self.games_dir.join(&filename);

        let content = record.to_json().context("Failed to serialize game record")?;
        fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;

        debug!("Saved game to {:?}", path);
        Ok(filename)
    }

    /// 加载棋谱
    pub fn load(&self, game_id: &str) -> Result<GameRecord> {
        let path = self.games_dir.join(game_id);
        if !path.exists() {
            anyhow::bail!("No saved game named {}", game_id);
        }

        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        GameRecord::from_json(&content).with_context(|| format!("Invalid game record {:?}", path))
    }

    /// 列出保存的棋谱（最新的在前），无法解析的文件跳过
    pub fn list(&self) -> Result<Vec<SavedGame>> {
        let entries = fs::read_dir(&self.games_dir)
            .with_context(|| format!("Failed to read games directory {:?}", self.games_dir))?;

        let mut games = Vec::new();
        for entry in entries {
            let path = entry.context("Failed to read directory entry")?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(game_id) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };

            match self.load(game_id) {
                Ok(record) => games.push(SavedGame {
                    game_id: game_id.to_string(),
                    white_player: record.metadata.white_player,
                    black_player: record.metadata.black_player,
                    date: record.metadata.date,
                    result: record.metadata.result,
                    move_count: record.moves.len(),
                }),
                Err(e) => warn!("Skipping {}: {:#}", game_id, e),
            }
        }

        // 文件名以时间戳开头
        games.sort_by(|a, b| b.game_id.cmp(&a.game_id));
        Ok(games)
    }

    /// 存储目录
    pub fn games_directory(&self) -> &Path {
        &self.games_dir
    }
}

/// 保存的棋谱摘要
#[derive(Debug, Clone)]
pub struct SavedGame {
    /// 文件名
    pub game_id: String,
    pub white_player: String,
    pub black_player: String,
    pub date: String,
    pub result: Option<GameResult>,
    /// 半回合数
    pub move_count: usize,
}

fn generate_filename(timestamp: &DateTime<Utc>, white: &str, black: &str) -> String {
    format!(
        "{}_{}_vs_{}.json",
        timestamp.format("%Y%m%d_%H%M%S%3f"),
        sanitize_filename(white),
        sanitize_filename(black)
    )
}

fn sanitize_filename(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
