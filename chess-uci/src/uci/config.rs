//! UCI 引擎配置

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use chess_rules::DEFAULT_SUGGESTION_DEPTH;

/// UCI 引擎配置
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UciConfig {
    /// 引擎可执行文件，默认 "stockfish"（从 PATH 查找）
    pub program: String,
    /// 额外的命令行参数
    pub args: Vec<String>,
    /// 搜索深度
    pub depth: u8,
    /// 单次搜索的超时（秒）
    pub timeout_secs: u64,
    /// 引擎棋力 0-20（Stockfish 的 Skill Level）
    pub skill_level: Option<u8>,
    /// 搜索线程数
    pub threads: Option<u32>,
    /// 其他 setoption 选项
    pub options: BTreeMap<String, String>,
}

impl Default for UciConfig {
    fn default() -> Self {
        Self {
            program: "stockfish".to_string(),
            args: Vec::new(),
            depth: DEFAULT_SUGGESTION_DEPTH,
            timeout_secs: 30,
            skill_level: None,
            threads: None,
            options: BTreeMap::new(),
        }
    }
}

impl UciConfig {
    /// 握手后需要发送的 setoption 列表
    pub fn engine_options(&self) -> Vec<(String, String)> {
        let mut options = Vec::new();
        if let Some(level) = self.skill_level {
            options.push(("Skill Level".to_string(), level.min(20).to_string()));
        }
        if let Some(threads) = self.threads {
            options.push(("Threads".to_string(), threads.max(1).to_string()));
        }
        options.extend(
            self.options
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        options
    }
}
