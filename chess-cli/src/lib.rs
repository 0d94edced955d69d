//! 国际象棋命令行前端
//!
//! 提供 perft/divide、局面查看与交互式对局，以及设置与棋谱的持久化。

pub mod commands;
pub mod session;
pub mod settings;
pub mod storage;

pub use commands::Command;
pub use session::{Reply, Session};
pub use settings::{Settings, DEFAULT_LOG_FILTER};
pub use storage::{GameStorage, SavedGame};
