//! 国际象棋规则引擎
//!
//! 包含:
//! - 坐标、棋子、走法描述与伪合法走法生成
//! - 基于射线的将军与牵制判定
//! - 可撤销的走法、代数记谱 (SAN)
//! - 对局状态机（将军、将死、逼和、五十回合、历史浏览）
//! - FEN 解析与生成、perft 计数
//! - 棋谱格式 (JSON) 与外部走法建议接口

mod board;
mod constants;
mod coordinate;
mod error;
mod fen;
mod game;
mod movement;
mod moves;
mod oracle;
mod outcome;
mod piece;
mod record;
mod suggest;

pub mod perft;

pub use board::{Board, SquareIndex};
pub use constants::*;
pub use coordinate::Coordinate;
pub use error::{ChessError, ErrorKind, Result};
pub use fen::Fen;
pub use game::{Game, MovePair};
pub use movement::{Movement, Reach};
pub use moves::{Move, UciMove};
pub use oracle::{LegalityOracle, LineOracle};
pub use outcome::{DrawReason, GameResult, GameStatus, MoveOutcome, WinReason};
pub use perft::PerftReport;
pub use piece::{CastleSide, Color, Piece, PieceKind};
pub use record::{GameMetadata, GameRecord, MoveRecord, RECORD_VERSION};
pub use suggest::{Evaluation, MoveSuggester, Suggestion, SuggestionRequest};
