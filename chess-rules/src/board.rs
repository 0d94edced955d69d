//! 棋盘状态

use std::fmt;

use tracing::{debug, warn};

use crate::constants::{BOARD_SIZE, SQUARE_COUNT};
use crate::coordinate::Coordinate;
use crate::error::{ChessError, Result};
use crate::movement::{self, Reach};
use crate::moves::{Move, UciMove};
use crate::oracle::LegalityOracle;
use crate::piece::{CastleSide, Color, Piece, PieceKind, KING_HOME_COL};

/// 目标格 -> 能走到（或控制）该格的棋子坐标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquareIndex {
    origins: Vec<Vec<Coordinate>>,
}

impl SquareIndex {
    /// 创建空索引
    pub fn new() -> Self {
        Self {
            origins: vec![Vec::new(); SQUARE_COUNT],
        }
    }

    /// 能到达目标格的棋子
    pub fn origins(&self, to: Coordinate) -> &[Coordinate] {
        &self.origins[to.to_index()]
    }

    /// 目标格是否有棋子能到达
    pub fn contains(&self, to: Coordinate) -> bool {
        !self.origins[to.to_index()].is_empty()
    }

    /// 是否包含 from -> to
    pub fn contains_move(&self, from: Coordinate, to: Coordinate) -> bool {
        self.origins[to.to_index()].contains(&from)
    }

    /// 走法（起点、终点对）总数
    pub fn len(&self) -> usize {
        self.origins.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.iter().all(Vec::is_empty)
    }

    /// 遍历全部 (起点, 终点)
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
        Coordinate::all().flat_map(move |to| {
            self.origins[to.to_index()]
                .iter()
                .map(move |&from| (from, to))
        })
    }

    fn insert(&mut self, to: Coordinate, from: Coordinate) {
        self.origins[to.to_index()].push(from);
    }

    fn clear(&mut self) {
        self.origins.iter_mut().for_each(Vec::clear);
    }
}

impl Default for SquareIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// 棋盘
///
/// 持有全部棋子、走子方、过路兵目标格与两个回合计数，
/// 以及由棋子位置推导出的伪合法索引、控制索引和合法走法索引。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// 8x8 棋盘，索引为 row * 8 + col
    squares: Vec<Option<Piece>>,
    side_to_move: Color,
    /// 过路兵目标格，仅在兵走两步后的下一步有效
    en_passant: Option<Coordinate>,
    /// 自上次吃子或动兵以来的半回合数
    halfmove_clock: u32,
    /// 完整回合数（黑方走完后 +1）
    fullmove_number: u32,
    pseudo: [SquareIndex; 2],
    control: [SquareIndex; 2],
    legal: SquareIndex,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: vec![None; SQUARE_COUNT],
            side_to_move: Color::White,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            pseudo: [SquareIndex::new(), SquareIndex::new()],
            control: [SquareIndex::new(), SquareIndex::new()],
            legal: SquareIndex::new(),
        }
    }

    /// 获取指定位置的棋子
    pub fn get(&self, coord: Coordinate) -> Option<&Piece> {
        self.squares[coord.to_index()].as_ref()
    }

    /// 放置或移除棋子，棋子的坐标随之更新
    pub(crate) fn set(&mut self, coord: Coordinate, piece: Option<Piece>) {
        self.squares[coord.to_index()] = piece.map(|mut piece| {
            piece.coord = coord;
            piece
        });
    }

    pub(crate) fn take(&mut self, coord: Coordinate) -> Option<Piece> {
        self.squares[coord.to_index()].take()
    }

    /// 根据 FEN 字母创建棋子并放到棋盘上
    ///
    /// 兵在起始行、王在初始格、车在角格时视为未走过，其余棋子视为已走过。
    pub fn create_piece(&mut self, symbol: char, coord: Coordinate) -> Result<()> {
        let mut piece = Piece::from_fen_char(symbol, coord).inspect_err(|err| {
            warn!("Cannot create piece at {}: {}", coord, err);
        })?;

        let home_row = piece.color.back_rank();
        piece.has_moved = match piece.kind {
            PieceKind::Pawn => coord.row() != piece.color.pawn_row(),
            PieceKind::King => coord != Coordinate::new_unchecked(home_row, KING_HOME_COL),
            PieceKind::Rook => coord.row() != home_row || (coord.col() != 0 && coord.col() != 7),
            _ => true,
        };

        self.set(coord, Some(piece));
        Ok(())
    }

    /// 当前走子方
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// 过路兵目标格
    pub fn en_passant(&self) -> Option<Coordinate> {
        self.en_passant
    }

    /// 半回合计数
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// 完整回合数
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub(crate) fn set_side_to_move(&mut self, side: Color) {
        self.side_to_move = side;
    }

    pub(crate) fn set_en_passant(&mut self, square: Option<Coordinate>) {
        self.en_passant = square;
    }

    pub(crate) fn set_clocks(&mut self, halfmove: u32, fullmove: u32) {
        self.halfmove_clock = halfmove;
        self.fullmove_number = fullmove;
    }

    /// 指定阵营的全部棋子
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = &Piece> + '_ {
        self.all_pieces().filter(move |piece| piece.color == color)
    }

    /// 全部棋子（从 a8 到 h1）
    pub fn all_pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.squares.iter().flatten()
    }

    /// 查找指定阵营的王
    pub fn find_king(&self, color: Color) -> Option<Coordinate> {
        self.pieces(color)
            .find(|piece| piece.kind == PieceKind::King)
            .map(|piece| piece.coord)
    }

    /// 某格是否受指定阵营控制
    pub fn is_attacked(&self, coord: Coordinate, by: Color) -> bool {
        self.control[by.index()].contains(coord)
    }

    /// 指定阵营的王是否被将军
    pub fn in_check(&self, color: Color) -> bool {
        self.find_king(color)
            .is_some_and(|king| self.is_attacked(king, color.opponent()))
    }

    /// 是否仍保有易位权（王与对应的车都未走过）
    pub fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        let row = color.back_rank();
        let king_ready = self
            .get(Coordinate::new_unchecked(row, KING_HOME_COL))
            .is_some_and(|king| king.is_king_of(color) && !king.has_moved);
        let rook_ready = self
            .get(Coordinate::new_unchecked(row, side.rook_col()))
            .is_some_and(|rook| {
                rook.kind == PieceKind::Rook && rook.color == color && !rook.has_moved
            });
        king_ready && rook_ready
    }

    /// 伪合法走法索引
    pub fn pseudo_legal(&self, color: Color) -> &SquareIndex {
        &self.pseudo[color.index()]
    }

    /// 控制格索引
    pub fn control(&self, color: Color) -> &SquareIndex {
        &self.control[color.index()]
    }

    /// 走子方的合法走法索引
    pub fn legal(&self) -> &SquareIndex {
        &self.legal
    }

    /// 重新生成双方的伪合法索引、控制索引与射线
    pub fn update_pseudo_legal_moves(&mut self) {
        let reaches: Vec<(Coordinate, Color, Reach)> = self
            .all_pieces()
            .map(|piece| (piece.coord, piece.color, movement::generate(self, piece)))
            .collect();

        for index in self.pseudo.iter_mut().chain(self.control.iter_mut()) {
            index.clear();
        }

        for (from, color, reach) in reaches {
            for to in reach.moves {
                self.pseudo[color.index()].insert(to, from);
            }
            for to in reach.control {
                self.control[color.index()].insert(to, from);
            }
            if let Some(piece) = self.squares[from.to_index()].as_mut() {
                piece.set_line_to_king(reach.line_to_king);
            }
        }
    }

    /// 重新生成伪合法索引，再经合法性判定过滤出走子方的合法走法
    pub fn update_legal_moves(&mut self, oracle: &dyn LegalityOracle) {
        self.update_pseudo_legal_moves();

        let mut legal = SquareIndex::new();
        for (from, to) in self.pseudo[self.side_to_move.index()].iter() {
            if !oracle.leaves_king_in_check(self, from, to) {
                legal.insert(to, from);
            }
        }
        self.legal = legal;
    }

    /// 走法是否合法
    pub fn is_legal(&self, from: Coordinate, to: Coordinate) -> bool {
        self.legal.contains_move(from, to)
    }

    /// 某个棋子的合法目标格
    pub fn legal_destinations(&self, from: Coordinate) -> Vec<Coordinate> {
        self.legal
            .iter()
            .filter(|&(origin, _)| origin == from)
            .map(|(_, to)| to)
            .collect()
    }

    /// 全部合法走法（兵到底线时展开为四种升变）
    pub fn legal_moves(&self) -> Vec<UciMove> {
        let mut moves = Vec::with_capacity(self.legal.len());
        for (from, to) in self.legal.iter() {
            let promotes = self.get(from).is_some_and(|piece| {
                piece.kind == PieceKind::Pawn && to.row() == piece.color.promotion_row()
            });
            if promotes {
                for kind in PieceKind::PROMOTIONS {
                    moves.push(UciMove::new(from, to, Some(kind)));
                }
            } else {
                moves.push(UciMove::new(from, to, None));
            }
        }
        moves
    }

    /// 合法走法数量（升变按四种计）
    pub fn legal_move_count(&self) -> usize {
        self.legal_moves().len()
    }

    /// 执行走法（唯一的修改入口）
    ///
    /// 走法必须在合法索引中；执行后切换走子方、更新计数、刷新索引，
    /// 并补全走法的将军标记与记谱后缀。
    pub fn apply_move(&mut self, mv: &mut Move, oracle: &dyn LegalityOracle) -> Result<()> {
        let (from, to) = (mv.from(), mv.to());

        if mv.color() != self.side_to_move {
            warn!("Rejected {}: not {:?}'s turn", mv, mv.color());
            return Err(ChessError::NotYourTurn);
        }
        let same_piece = self
            .get(from)
            .is_some_and(|piece| piece.kind == mv.piece().kind && piece.color == mv.color());
        if !same_piece || !self.is_legal(from, to) {
            warn!("Rejected illegal move {}", mv);
            return Err(ChessError::IllegalMove { from, to });
        }

        mv.make(self)?;

        if mv.piece().kind == PieceKind::Pawn || mv.captured().is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.opponent();

        self.update_legal_moves(oracle);
        mv.finalize(self);

        debug!("Applied {} ({})", mv.notation(), mv);
        Ok(())
    }

    /// 撤销最近一次执行的走法
    pub fn undo_move(&mut self, mv: &Move, oracle: &dyn LegalityOracle) -> Result<()> {
        if mv.move_clock() != self.fullmove_number || mv.color() == self.side_to_move {
            warn!(
                "Undo out of order for {}: move clock {}, board clock {}",
                mv,
                mv.move_clock(),
                self.fullmove_number
            );
            return Err(ChessError::UndoOrdering {
                expected: mv.move_clock(),
                actual: self.fullmove_number,
            });
        }

        mv.unmake(self)?;

        if mv.color() == Color::Black {
            self.fullmove_number -= 1;
        }
        self.halfmove_clock = mv.prev_halfmove();
        self.side_to_move = mv.color();

        self.update_legal_moves(oracle);

        debug!("Undid {}", mv.notation());
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE as u8 {
            write!(f, "{} ", BOARD_SIZE as u8 - row)?;
            for col in 0..BOARD_SIZE as u8 {
                let symbol = self
                    .get(Coordinate::new_unchecked(row, col))
                    .map_or('.', Piece::to_fen_char);
                write!(f, " {}", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}
