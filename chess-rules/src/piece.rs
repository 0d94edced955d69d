//! 棋子定义

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::ChessError;
use crate::movement::{Movement, DIAGONAL, KING_STEPS, KNIGHT_LEAPS, ORTHOGONAL, ROYAL};

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// 兵
    Pawn,
    /// 马
    Knight,
    /// 象
    Bishop,
    /// 车
    Rook,
    /// 后
    Queen,
    /// 王
    King,
}

impl PieceKind {
    /// 升变可选的棋子（按常用顺序）
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// 获取棋子字母（大写）
    pub fn letter(&self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    /// 从字母解析（忽略大小写）
    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_uppercase() {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// 走法描述
    pub fn movement(&self) -> Movement {
        match self {
            PieceKind::Pawn => Movement::Pawn,
            PieceKind::Knight => Movement::Step(&KNIGHT_LEAPS),
            PieceKind::Bishop => Movement::Slide(&DIAGONAL),
            PieceKind::Rook => Movement::Slide(&ORTHOGONAL),
            PieceKind::Queen => Movement::Slide(&ROYAL),
            PieceKind::King => Movement::Step(&KING_STEPS),
        }
    }

    /// 是否为滑动棋子
    pub fn is_slider(&self) -> bool {
        matches!(self.movement(), Movement::Slide(_))
    }
}

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// 白方（先手，在下方）
    White,
    /// 黑方（后手，在上方）
    Black,
}

impl Color {
    /// 获取对方阵营
    pub fn opponent(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// 数组下标
    pub fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// 获取 FEN 字符
    pub fn to_fen_char(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    /// 兵前进的行方向（白方朝行 0）
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// 底线所在行
    pub fn back_rank(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// 兵的起始行
    pub fn pawn_row(&self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// 兵升变所在行
    pub fn promotion_row(&self) -> u8 {
        self.opponent().back_rank()
    }

    /// 吃过路兵时目标格所在行
    pub fn en_passant_row(&self) -> u8 {
        match self {
            Color::White => 2,
            Color::Black => 5,
        }
    }
}

/// 易位方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastleSide {
    /// 短易位
    KingSide,
    /// 长易位
    QueenSide,
}

impl CastleSide {
    /// 车的初始列
    pub fn rook_col(&self) -> u8 {
        match self {
            CastleSide::KingSide => 7,
            CastleSide::QueenSide => 0,
        }
    }

    /// 易位后车所在列
    pub fn rook_target_col(&self) -> u8 {
        match self {
            CastleSide::KingSide => 5,
            CastleSide::QueenSide => 3,
        }
    }

    /// 易位后王所在列
    pub fn king_target_col(&self) -> u8 {
        match self {
            CastleSide::KingSide => 6,
            CastleSide::QueenSide => 2,
        }
    }

    /// 根据王的目标列判断易位方向
    pub fn from_king_target(col: u8) -> Option<CastleSide> {
        match col {
            6 => Some(CastleSide::KingSide),
            2 => Some(CastleSide::QueenSide),
            _ => None,
        }
    }

    /// 代数记谱
    pub fn notation(&self) -> &'static str {
        match self {
            CastleSide::KingSide => "O-O",
            CastleSide::QueenSide => "O-O-O",
        }
    }
}

/// 王的初始列
pub const KING_HOME_COL: u8 = 4;

/// 棋子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub coord: Coordinate,
    /// 是否已经走过（决定易位权与兵的两步走）
    pub has_moved: bool,
    /// 射线上朝向敌方王依次遇到的有子格，末尾为敌方王。
    /// 长度 1 表示正在将军，长度 2 表示中间的棋子可能被牵制。
    #[serde(skip)]
    line_to_king: Vec<Coordinate>,
}

impl Piece {
    /// 创建新棋子
    pub fn new(kind: PieceKind, color: Color, coord: Coordinate) -> Self {
        Self {
            kind,
            color,
            coord,
            has_moved: false,
            line_to_king: Vec::new(),
        }
    }

    /// 从 FEN 字符解析（白方大写，黑方小写）
    pub fn from_fen_char(c: char, coord: Coordinate) -> Result<Piece, ChessError> {
        let kind = PieceKind::from_letter(c).ok_or(ChessError::InvalidPiece { symbol: c })?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Ok(Piece::new(kind, color, coord))
    }

    /// 获取 FEN 字符
    pub fn to_fen_char(&self) -> char {
        match self.color {
            Color::White => self.kind.letter(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }

    /// 棋子的 Unicode 图形
    pub fn symbol(&self) -> char {
        match (self.kind, self.color) {
            (PieceKind::King, Color::White) => '♔',
            (PieceKind::Queen, Color::White) => '♕',
            (PieceKind::Rook, Color::White) => '♖',
            (PieceKind::Bishop, Color::White) => '♗',
            (PieceKind::Knight, Color::White) => '♘',
            (PieceKind::Pawn, Color::White) => '♙',
            (PieceKind::King, Color::Black) => '♚',
            (PieceKind::Queen, Color::Black) => '♛',
            (PieceKind::Rook, Color::Black) => '♜',
            (PieceKind::Bishop, Color::Black) => '♝',
            (PieceKind::Knight, Color::Black) => '♞',
            (PieceKind::Pawn, Color::Black) => '♟',
        }
    }

    /// 是否为指定阵营的王
    pub fn is_king_of(&self, color: Color) -> bool {
        self.kind == PieceKind::King && self.color == color
    }

    /// 朝向敌方王的射线
    pub fn line_to_king(&self) -> &[Coordinate] {
        &self.line_to_king
    }

    /// 是否正在将军
    pub fn gives_check(&self) -> bool {
        self.line_to_king.len() == 1
    }

    pub(crate) fn set_line_to_king(&mut self, line: Vec<Coordinate>) {
        self.line_to_king = line;
    }
}
