//! 命令行设置
//!
//! 设置以 JSON 保存在系统配置目录下，文件不存在时使用默认值。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use chess_rules::Color;
use chess_uci::{SuggesterBackend, UciConfig};

/// 默认日志过滤
pub const DEFAULT_LOG_FILTER: &str = "chess_cli=info,chess_rules=warn";

/// 设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 走法建议后端
    pub backend: SuggesterBackend,
    /// 引擎执棋方
    pub engine_color: Color,
    /// UCI 引擎配置
    pub uci: UciConfig,
    /// 日志过滤（RUST_LOG 优先）
    pub log_filter: String,
    /// 每步后打印棋盘
    pub show_board: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: SuggesterBackend::default(),
            engine_color: Color::Black,
            uci: UciConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            show_board: true,
        }
    }
}

impl Settings {
    /// 获取设置文件路径
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("chess-rules");
            path.push("settings.json");
            path
        })
    }

    /// 从默认位置加载设置
    pub fn load() -> Result<Self> {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// 从指定文件加载，文件不存在时返回默认设置
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file {:?}", path))
    }

    /// 保存到默认位置
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::settings_path().context("No config directory on this platform")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// 保存到指定文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {:?}", path))?;

        info!("Settings saved to {:?}", path);
        Ok(())
    }
}
