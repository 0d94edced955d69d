//! 走法

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::board::Board;
use crate::coordinate::Coordinate;
use crate::error::{ChessError, Result};
use crate::piece::{CastleSide, Color, Piece, PieceKind};

/// UCI 格式的走法（如 "e2e4"、"e7e8q"），序列化为同样的字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct UciMove {
    pub from: Coordinate,
    pub to: Coordinate,
    pub promotion: Option<PieceKind>,
}

impl UciMove {
    pub fn new(from: Coordinate, to: Coordinate, promotion: Option<PieceKind>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }
}

impl fmt::Display for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

impl FromStr for UciMove {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ChessError::InvalidUciMove {
            text: s.to_string(),
        };

        let s = s.trim();
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(invalid());
        }

        let from: Coordinate = s[0..2].parse().map_err(|_| invalid())?;
        let to: Coordinate = s[2..4].parse().map_err(|_| invalid())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_letter(c) {
                Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
                _ => return Err(invalid()),
            },
        };

        Ok(UciMove::new(from, to, promotion))
    }
}

impl From<UciMove> for String {
    fn from(mv: UciMove) -> Self {
        mv.to_string()
    }
}

impl TryFrom<String> for UciMove {
    type Error = ChessError;

    fn try_from(text: String) -> Result<Self> {
        text.parse()
    }
}

/// 一步走法（半回合）
///
/// 构造时完成校验与分类，执行后补全将军标记。
/// 撤销必须使用执行时的同一个走法对象。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    from: Coordinate,
    to: Coordinate,
    /// 走子前的棋子快照
    piece: Piece,
    /// 被吃的棋子（保留原坐标，过路兵的坐标不是目标格）
    captured: Option<Piece>,
    en_passant: bool,
    promotion: Option<PieceKind>,
    castle: Option<CastleSide>,
    gives_check: bool,
    checkmate: bool,
    san: String,
    notation: String,
    /// 走完这一步后棋盘应有的完整回合数
    move_clock: u32,
    prev_en_passant: Option<Coordinate>,
    prev_halfmove: u32,
}

impl Move {
    /// 创建走法，兵到底线默认升变为后
    pub fn new(board: &Board, from: Coordinate, to: Coordinate) -> Result<Self> {
        Self::with_promotion(board, from, to, PieceKind::Queen)
    }

    /// 从 UCI 走法创建
    pub fn from_uci(board: &Board, uci: &UciMove) -> Result<Self> {
        Self::with_promotion(
            board,
            uci.from,
            uci.to,
            uci.promotion.unwrap_or(PieceKind::Queen),
        )
    }

    /// 创建走法并指定升变棋子（非升变走法忽略该参数）
    pub fn with_promotion(
        board: &Board,
        from: Coordinate,
        to: Coordinate,
        promotion: PieceKind,
    ) -> Result<Self> {
        let piece = board.get(from).ok_or(ChessError::NoPiece { square: from })?;
        if piece.color != board.side_to_move() {
            return Err(ChessError::NotYourTurn);
        }
        if !board.is_legal(from, to) {
            return Err(ChessError::IllegalMove { from, to });
        }

        let is_pawn = piece.kind == PieceKind::Pawn;
        let promotion = if is_pawn && to.row() == piece.color.promotion_row() {
            if !PieceKind::PROMOTIONS.contains(&promotion) {
                return Err(ChessError::IllegalMove { from, to });
            }
            Some(promotion)
        } else {
            None
        };

        let castle = (piece.kind == PieceKind::King && from.col().abs_diff(to.col()) == 2)
            .then(|| CastleSide::from_king_target(to.col()))
            .flatten();

        let en_passant = is_pawn && from.col() != to.col() && board.get(to).is_none();
        let captured = if en_passant {
            board
                .get(Coordinate::new_unchecked(from.row(), to.col()))
                .cloned()
        } else {
            board.get(to).cloned()
        };

        let move_clock = match piece.color {
            Color::White => board.fullmove_number(),
            Color::Black => board.fullmove_number() + 1,
        };

        let san = san_prefix(board, piece, to, captured.is_some(), promotion, castle);

        Ok(Self {
            from,
            to,
            piece: piece.clone(),
            captured,
            en_passant,
            promotion,
            castle,
            gives_check: false,
            checkmate: false,
            notation: san.clone(),
            san,
            move_clock,
            prev_en_passant: board.en_passant(),
            prev_halfmove: board.halfmove_clock(),
        })
    }

    pub fn from(&self) -> Coordinate {
        self.from
    }

    pub fn to(&self) -> Coordinate {
        self.to
    }

    /// 走子前的棋子
    pub fn piece(&self) -> &Piece {
        &self.piece
    }

    pub fn color(&self) -> Color {
        self.piece.color
    }

    pub fn captured(&self) -> Option<&Piece> {
        self.captured.as_ref()
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_en_passant(&self) -> bool {
        self.en_passant
    }

    pub fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    pub fn castle(&self) -> Option<CastleSide> {
        self.castle
    }

    /// 执行后是否将军
    pub fn gives_check(&self) -> bool {
        self.gives_check
    }

    /// 执行后是否将死
    pub fn is_checkmate(&self) -> bool {
        self.checkmate
    }

    /// 代数记谱（执行后带 "+" / "#"）
    pub fn notation(&self) -> &str {
        &self.notation
    }

    pub fn move_clock(&self) -> u32 {
        self.move_clock
    }

    pub fn prev_en_passant(&self) -> Option<Coordinate> {
        self.prev_en_passant
    }

    pub fn prev_halfmove(&self) -> u32 {
        self.prev_halfmove
    }

    /// 对应的 UCI 走法
    pub fn to_uci(&self) -> UciMove {
        UciMove::new(self.from, self.to, self.promotion)
    }

    /// 在棋盘上移动棋子（不处理走子方与回合计数）
    pub(crate) fn make(&self, board: &mut Board) -> Result<()> {
        let Some(moving) = board.get(self.from) else {
            return Err(self.violation(format!("no piece on {}", self.from)));
        };
        if board
            .get(self.to)
            .is_some_and(|target| target.color == moving.color)
        {
            return Err(self.violation(format!("{} is occupied by a friendly piece", self.to)));
        }

        let rook_squares = self.rook_squares();
        if let Some((rook_from, _)) = rook_squares {
            let rook_ready = board
                .get(rook_from)
                .is_some_and(|rook| rook.kind == PieceKind::Rook && rook.color == moving.color);
            if !rook_ready {
                return Err(self.violation(format!("castling rook missing on {}", rook_from)));
            }
        }

        if let Some(captured) = &self.captured {
            board.take(captured.coord);
        }

        let mut piece = match (board.take(self.from), self.promotion) {
            (Some(piece), Some(kind)) => Piece::new(kind, piece.color, self.to),
            (Some(piece), None) => piece,
            (None, _) => return Err(self.violation(format!("no piece on {}", self.from))),
        };
        piece.has_moved = true;
        board.set(self.to, Some(piece));

        if let Some((rook_from, rook_to)) = rook_squares {
            if let Some(mut rook) = board.take(rook_from) {
                rook.has_moved = true;
                board.set(rook_to, Some(rook));
            }
        }

        let double_step =
            self.piece.kind == PieceKind::Pawn && self.from.row().abs_diff(self.to.row()) == 2;
        board.set_en_passant(if double_step {
            Some(Coordinate::new_unchecked(
                (self.from.row() + self.to.row()) / 2,
                self.from.col(),
            ))
        } else {
            None
        });

        Ok(())
    }

    /// 还原棋子位置（不处理走子方与回合计数）
    pub(crate) fn unmake(&self, board: &mut Board) -> Result<()> {
        let moved_back = board
            .get(self.to)
            .is_some_and(|piece| piece.color == self.piece.color);
        if !moved_back {
            return Err(self.violation(format!("moved piece missing on {}", self.to)));
        }

        let rook_squares = self.rook_squares();
        if let Some((_, rook_to)) = rook_squares {
            let rook_ready = board
                .get(rook_to)
                .is_some_and(|rook| rook.kind == PieceKind::Rook && rook.color == self.color());
            if !rook_ready {
                return Err(self.violation(format!("castled rook missing on {}", rook_to)));
            }
        }

        board.take(self.to);
        board.set(self.from, Some(self.piece.clone()));

        if let Some(captured) = &self.captured {
            board.set(captured.coord, Some(captured.clone()));
        }

        if let Some((rook_from, rook_to)) = rook_squares {
            if let Some(mut rook) = board.take(rook_to) {
                rook.has_moved = false;
                board.set(rook_from, Some(rook));
            }
        }

        board.set_en_passant(self.prev_en_passant);
        Ok(())
    }

    /// 根据执行后的局面补全将军标记与记谱后缀
    pub(crate) fn finalize(&mut self, board: &Board) {
        self.gives_check = board.in_check(board.side_to_move());
        self.checkmate = self.gives_check && board.legal().is_empty();

        self.notation = self.san.clone();
        if self.checkmate {
            self.notation.push('#');
        } else if self.gives_check {
            self.notation.push('+');
        }
    }

    /// 易位时车的起点与终点
    fn rook_squares(&self) -> Option<(Coordinate, Coordinate)> {
        self.castle.map(|side| {
            let row = self.from.row();
            (
                Coordinate::new_unchecked(row, side.rook_col()),
                Coordinate::new_unchecked(row, side.rook_target_col()),
            )
        })
    }

    fn violation(&self, detail: String) -> ChessError {
        error!("Invariant violation while handling {}: {}", self, detail);
        ChessError::invariant(detail)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// 生成不含将军后缀的代数记谱
fn san_prefix(
    board: &Board,
    piece: &Piece,
    to: Coordinate,
    capture: bool,
    promotion: Option<PieceKind>,
    castle: Option<CastleSide>,
) -> String {
    if let Some(side) = castle {
        return side.notation().to_string();
    }

    let from = piece.coord;
    let mut san = String::new();

    if piece.kind == PieceKind::Pawn {
        if capture {
            san.push(from.file_char());
            san.push('x');
        }
        san.push_str(&to.to_string());
        if let Some(kind) = promotion {
            san.push('=');
            san.push(kind.letter());
        }
        return san;
    }

    san.push(piece.kind.letter());

    // 同类棋子也能走到目标格时需要消歧义：优先列，其次行，都冲突时两者都写
    let rivals: Vec<Coordinate> = board
        .legal()
        .origins(to)
        .iter()
        .copied()
        .filter(|&origin| origin != from)
        .filter(|&origin| {
            board
                .get(origin)
                .is_some_and(|other| other.kind == piece.kind && other.color == piece.color)
        })
        .collect();
    if !rivals.is_empty() {
        let shares_file = rivals.iter().any(|rival| rival.col() == from.col());
        let shares_rank = rivals.iter().any(|rival| rival.row() == from.row());
        if !shares_file {
            san.push(from.file_char());
        } else if !shares_rank {
            san.push(from.rank_char());
        } else {
            san.push(from.file_char());
            san.push(from.rank_char());
        }
    }

    if capture {
        san.push('x');
    }
    san.push_str(&to.to_string());
    san
}
