//! 规则常量定义

/// 棋盘边长
pub const BOARD_SIZE: usize = 8;

/// 棋盘格子总数
pub const SQUARE_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// 滑动棋子单方向最大步数
pub const MAX_SLIDE: i8 = 7;

/// 五十回合规则对应的半回合数
pub const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// 走法建议默认搜索深度
pub const DEFAULT_SUGGESTION_DEPTH: u8 = 6;

/// 初始局面 FEN
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
