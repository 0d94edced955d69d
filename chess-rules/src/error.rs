//! 错误类型定义

use thiserror::Error;

use crate::coordinate::Coordinate;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 外部输入格式错误（FEN、坐标字符串等），解析整体失败
    MalformedInput,
    /// 非法走法，局面保持不变
    IllegalMove,
    /// 内部不变量被破坏（属于缺陷信号）
    InvariantViolation,
    /// 悔棋顺序错误
    UndoOrdering,
}

/// 国际象棋规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChessError {
    /// 坐标越界
    #[error("Coordinate out of range: ({row}, {col})")]
    InvalidCoordinate { row: i16, col: i16 },

    /// 无效的代数坐标字符串
    #[error("Invalid square: {text:?}")]
    InvalidSquare { text: String },

    /// 无效的 FEN 字符串
    #[error("Invalid FEN string: {reason}")]
    InvalidFen { reason: String },

    /// 无法识别的棋子字母
    #[error("Unknown piece symbol: {symbol:?}")]
    InvalidPiece { symbol: char },

    /// 无效的 UCI 走法字符串
    #[error("Invalid UCI move: {text:?}")]
    InvalidUciMove { text: String },

    /// 起点没有棋子
    #[error("No piece at {square}")]
    NoPiece { square: Coordinate },

    /// 不是该方的回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 非法走法
    #[error("Illegal move: {from} -> {to}")]
    IllegalMove { from: Coordinate, to: Coordinate },

    /// 对局已结束
    #[error("Game is already over")]
    GameOver,

    /// 正在浏览历史局面，不能走棋
    #[error("Viewing history, moves are disabled")]
    ViewingHistory,

    /// 走法建议对应的局面已经过期
    #[error("Suggestion does not match the current position")]
    StaleSuggestion,

    /// 内部不变量被破坏
    #[error("Invariant violation: {detail}")]
    InvariantViolation { detail: String },

    /// 悔棋顺序错误（回合数不一致）
    #[error("Undo out of order: move was made at clock {expected}, board is at {actual}")]
    UndoOrdering { expected: u32, actual: u32 },

    /// 没有可以悔的棋
    #[error("No move to undo")]
    NothingToUndo,

    /// 历史局面索引越界
    #[error("History index {index} out of range (len {len})")]
    HistoryOutOfRange { index: usize, len: usize },
}

impl ChessError {
    /// 获取错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChessError::InvalidCoordinate { .. }
            | ChessError::InvalidSquare { .. }
            | ChessError::InvalidFen { .. }
            | ChessError::InvalidPiece { .. }
            | ChessError::InvalidUciMove { .. }
            | ChessError::HistoryOutOfRange { .. } => ErrorKind::MalformedInput,
            ChessError::NoPiece { .. }
            | ChessError::NotYourTurn
            | ChessError::IllegalMove { .. }
            | ChessError::GameOver
            | ChessError::ViewingHistory
            | ChessError::StaleSuggestion => ErrorKind::IllegalMove,
            ChessError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            ChessError::UndoOrdering { .. } | ChessError::NothingToUndo => ErrorKind::UndoOrdering,
        }
    }

    pub(crate) fn fen(reason: impl Into<String>) -> Self {
        ChessError::InvalidFen {
            reason: reason.into(),
        }
    }

    pub(crate) fn invariant(detail: impl Into<String>) -> Self {
        ChessError::InvariantViolation {
            detail: detail.into(),
        }
    }
}

/// 规则操作结果类型
pub type Result<T> = std::result::Result<T, ChessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ChessError::fen("empty").kind(), ErrorKind::MalformedInput);
        assert_eq!(ChessError::NotYourTurn.kind(), ErrorKind::IllegalMove);
        assert_eq!(ChessError::invariant("rook missing").kind(), ErrorKind::InvariantViolation);
        assert_eq!(
            ChessError::UndoOrdering { expected: 3, actual: 4 }.kind(),
            ErrorKind::UndoOrdering
        );
    }

    #[test]
    fn test_error_display() {
        let err = ChessError::IllegalMove {
            from: Coordinate::new_unchecked(6, 4),
            to: Coordinate::new_unchecked(3, 4),
        };
        assert_eq!(err.to_string(), "Illegal move: e2 -> e5");
    }
}
