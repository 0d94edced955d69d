//! FEN 格式解析和生成
//!
//! 国际象棋 FEN 格式：
//! `<棋盘> <走子方> <易位权> <过路兵> <半回合数> <回合数>`
//!
//! 示例：
//! `rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1`
//!
//! 最后两个计数字段可以省略，默认为 `0 1`。

use tracing::warn;

use crate::board::Board;
use crate::constants::{BOARD_SIZE, START_FEN};
use crate::coordinate::Coordinate;
use crate::error::{ChessError, Result};
use crate::oracle::{LegalityOracle, LineOracle};
use crate::piece::{CastleSide, Color, PieceKind};

/// 易位权字段的四个字母
const CASTLING_FLAGS: [(char, Color, CastleSide); 4] = [
    ('K', Color::White, CastleSide::KingSide),
    ('Q', Color::White, CastleSide::QueenSide),
    ('k', Color::Black, CastleSide::KingSide),
    ('q', Color::Black, CastleSide::QueenSide),
];

/// FEN 格式处理
pub struct Fen;

impl Fen {
    /// 解析 FEN 字符串为棋盘（使用默认的射线判定）
    pub fn parse(fen: &str) -> Result<Board> {
        Self::parse_with(fen, &LineOracle)
    }

    /// 解析 FEN 字符串为棋盘，并用指定判定生成合法走法
    pub fn parse_with(fen: &str, oracle: &dyn LegalityOracle) -> Result<Board> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.is_empty() {
            return Err(ChessError::fen("Empty FEN string"));
        }
        if parts.len() != 4 && parts.len() != 6 {
            return Err(ChessError::fen(format!(
                "Expected 4 or 6 fields, got {}",
                parts.len()
            )));
        }

        let mut board = Self::parse_board(parts[0])?;

        let side = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(ChessError::fen(format!("Invalid side to move: {}", other))),
        };
        board.set_side_to_move(side);

        let rights = Self::parse_castling(parts[2])?;
        Self::reconcile_castling(&mut board, &rights);

        board.set_en_passant(Self::parse_en_passant(parts[3], side)?);

        let (halfmove, fullmove) = if parts.len() == 6 {
            (
                Self::parse_clock(parts[4], "halfmove clock")?,
                Self::parse_clock(parts[5], "fullmove number")?,
            )
        } else {
            (0, 1)
        };
        if fullmove == 0 {
            return Err(ChessError::fen("Fullmove number starts at 1"));
        }
        board.set_clocks(halfmove, fullmove);

        board.update_legal_moves(oracle);
        Ok(board)
    }

    /// 解析棋盘部分
    fn parse_board(board_str: &str) -> Result<Board> {
        let mut board = Board::empty();
        let ranks: Vec<&str> = board_str.split('/').collect();

        if ranks.len() != BOARD_SIZE {
            return Err(ChessError::fen(format!(
                "Expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        // FEN 从第 8 横线写到第 1 横线，与行号顺序一致
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;

            for c in rank.chars() {
                if col >= BOARD_SIZE {
                    return Err(ChessError::fen(format!(
                        "Rank {} has too many squares",
                        BOARD_SIZE - row
                    )));
                }

                if let Some(empty) = c.to_digit(10) {
                    if !(1..=8).contains(&empty) {
                        return Err(ChessError::fen(format!("Invalid empty count: {}", c)));
                    }
                    col += empty as usize;
                } else {
                    let coord = Coordinate::new_unchecked(row as u8, col as u8);
                    board
                        .create_piece(c, coord)
                        .map_err(|_| ChessError::fen(format!("Invalid piece character: {}", c)))?;
                    col += 1;
                }
            }

            if col != BOARD_SIZE {
                return Err(ChessError::fen(format!(
                    "Rank {} has {} squares, expected 8",
                    BOARD_SIZE - row,
                    col
                )));
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces(color)
                .filter(|piece| piece.kind == PieceKind::King)
                .count();
            if kings != 1 {
                return Err(ChessError::fen(format!(
                    "Expected one {:?} king, found {}",
                    color, kings
                )));
            }
        }

        if let Some(pawn) = board.all_pieces().find(|piece| {
            piece.kind == PieceKind::Pawn && (piece.coord.row() == 0 || piece.coord.row() == 7)
        }) {
            return Err(ChessError::fen(format!("Pawn on back rank at {}", pawn.coord)));
        }

        Ok(board)
    }

    /// 解析易位权字段，返回声明的 (阵营, 方向)
    fn parse_castling(field: &str) -> Result<Vec<(Color, CastleSide)>> {
        if field == "-" {
            return Ok(Vec::new());
        }

        let mut rights = Vec::new();
        for c in field.chars() {
            let Some(&(_, color, side)) = CASTLING_FLAGS.iter().find(|(flag, ..)| *flag == c)
            else {
                return Err(ChessError::fen(format!("Invalid castling field: {}", field)));
            };
            if rights.contains(&(color, side)) {
                return Err(ChessError::fen(format!("Duplicate castling flag: {}", c)));
            }
            rights.push((color, side));
        }
        Ok(rights)
    }

    /// 易位权不单独保存：没有易位权的一侧把角上的车标记为已走过
    fn reconcile_castling(board: &mut Board, rights: &[(Color, CastleSide)]) {
        for &(flag, color, side) in &CASTLING_FLAGS {
            let claimed = rights.contains(&(color, side));
            if claimed {
                if !board.can_castle(color, side) {
                    warn!(
                        "Castling flag '{}' does not match the position, ignoring it",
                        flag
                    );
                }
                continue;
            }

            let corner = Coordinate::new_unchecked(color.back_rank(), side.rook_col());
            if let Some(mut rook) = board.get(corner).cloned() {
                if rook.kind == PieceKind::Rook && rook.color == color {
                    rook.has_moved = true;
                    board.set(corner, Some(rook));
                }
            }
        }
    }

    /// 解析过路兵字段：目标格必须在对方刚走过两步的那一行后面
    fn parse_en_passant(field: &str, side: Color) -> Result<Option<Coordinate>> {
        if field == "-" {
            return Ok(None);
        }

        let square: Coordinate = field
            .parse()
            .map_err(|_| ChessError::fen(format!("Invalid en passant square: {}", field)))?;
        if square.row() != side.en_passant_row() {
            return Err(ChessError::fen(format!(
                "En passant square {} is not on the expected rank",
                square
            )));
        }
        Ok(Some(square))
    }

    fn parse_clock(field: &str, name: &str) -> Result<u32> {
        field
            .parse()
            .map_err(|_| ChessError::fen(format!("Invalid {}: {}", name, field)))
    }

    /// 将棋盘转换为 FEN 字符串
    pub fn to_string(board: &Board) -> String {
        let castling: String = CASTLING_FLAGS
            .iter()
            .filter(|(_, color, side)| board.can_castle(*color, *side))
            .map(|(flag, ..)| *flag)
            .collect();

        format!(
            "{} {} {} {} {} {}",
            Self::board_to_string(board),
            board.side_to_move().to_fen_char(),
            if castling.is_empty() { "-" } else { castling.as_str() },
            board
                .en_passant()
                .map_or_else(|| "-".to_string(), |square| square.to_string()),
            board.halfmove_clock(),
            board.fullmove_number()
        )
    }

    /// 将棋盘转换为 FEN 棋盘部分
    pub fn board_to_string(board: &Board) -> String {
        let mut ranks = Vec::with_capacity(BOARD_SIZE);

        for row in 0..BOARD_SIZE as u8 {
            let mut rank = String::new();
            let mut empty_count = 0;

            for col in 0..BOARD_SIZE as u8 {
                if let Some(piece) = board.get(Coordinate::new_unchecked(row, col)) {
                    if empty_count > 0 {
                        rank.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    rank.push(piece.to_fen_char());
                } else {
                    empty_count += 1;
                }
            }

            if empty_count > 0 {
                rank.push_str(&empty_count.to_string());
            }

            ranks.push(rank);
        }

        ranks.join("/")
    }

    /// 解析初始局面
    pub fn initial() -> Board {
        Self::parse(START_FEN).expect("Initial FEN should be valid")
    }
}
