//! 走法建议提供者
//!
//! 包含:
//! - UCI 引擎进程客户端与输出解析
//! - 随机合法走法（无引擎时的后备）

mod random;
mod uci;

pub use random::RandomSuggester;
pub use uci::{EngineReply, SuggesterBackend, UciClient, UciConfig, UciEngine, UciParser};
