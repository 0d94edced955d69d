//! UCI 引擎集成模块
//!
//! 通过 UCI 协议驱动本地引擎进程（如 Stockfish）给出走法建议。

mod client;
mod config;
mod engine;
mod parser;

pub use client::UciClient;
pub use config::UciConfig;
pub use engine::{SuggesterBackend, UciEngine};
pub use parser::{EngineReply, UciParser};
