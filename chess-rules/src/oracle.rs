//! 合法性判定（将军与牵制过滤）
//!
//! 伪合法走法生成时，每个棋子都记录了朝向敌方王的射线。
//! 判定某个走法是否让己方王暴露时，只需要读取这些射线，不需要复制棋盘重新模拟。

use std::fmt::Debug;

use crate::board::Board;
use crate::coordinate::Coordinate;
use crate::piece::{Color, PieceKind};

/// 合法性判定接口
///
/// 调用前棋盘的伪合法索引与射线数据必须是最新的。
pub trait LegalityOracle: Debug + Send + Sync {
    /// 走法是否会让走子方的王处于被将军状态
    fn leaves_king_in_check(&self, board: &Board, from: Coordinate, to: Coordinate) -> bool;
}

/// 基于射线的增量判定
#[derive(Debug, Clone, Copy, Default)]
pub struct LineOracle;

impl LegalityOracle for LineOracle {
    fn leaves_king_in_check(&self, board: &Board, from: Coordinate, to: Coordinate) -> bool {
        let Some(piece) = board.get(from) else {
            return true;
        };
        let color = piece.color;
        let enemy = color.opponent();

        if piece.kind == PieceKind::King {
            return Self::king_step_unsafe(board, from, to, enemy);
        }

        let Some(king) = board.find_king(color) else {
            // 没有王的局面不存在被将军
            return false;
        };

        let en_passant_victim = (piece.kind == PieceKind::Pawn
            && from.col() != to.col()
            && board.get(to).is_none())
        .then(|| Coordinate::new_unchecked(from.row(), to.col()));

        let mut checkers = 0;
        for attacker in board.pieces(enemy) {
            let line = attacker.line_to_king();
            match line.len() {
                1 => {
                    checkers += 1;
                    if checkers > 1 {
                        // 双将只能走王
                        return true;
                    }
                    let resolves = to == attacker.coord
                        || en_passant_victim == Some(attacker.coord)
                        || (attacker.kind.is_slider()
                            && Coordinate::between(attacker.coord, king).contains(&to));
                    if !resolves {
                        return true;
                    }
                }
                2 if line[0] == from || Some(line[0]) == en_passant_victim => {
                    // 被牵制的棋子只能沿牵制线移动（含吃掉牵制者）
                    let stays = to == attacker.coord
                        || Coordinate::between(attacker.coord, king).contains(&to);
                    if !stays {
                        return true;
                    }
                }
                _ => {}
            }
        }

        match en_passant_victim {
            Some(victim) => Self::en_passant_exposes_rank(board, from, victim, king, enemy),
            None => false,
        }
    }
}

impl LineOracle {
    /// 王的走法：目标格受攻击即非法；易位还要求起点与经过格不受攻击
    fn king_step_unsafe(board: &Board, from: Coordinate, to: Coordinate, enemy: Color) -> bool {
        if board.is_attacked(to, enemy) {
            return true;
        }

        if (to.col() as i8 - from.col() as i8).abs() == 2 {
            let transit = Coordinate::new_unchecked(from.row(), (from.col() + to.col()) / 2);
            return board.is_attacked(from, enemy) || board.is_attacked(transit, enemy);
        }

        false
    }

    /// 吃过路兵后同一横线上两个兵同时消失，可能让车/后直接看到王
    fn en_passant_exposes_rank(
        board: &Board,
        from: Coordinate,
        victim: Coordinate,
        king: Coordinate,
        enemy: Color,
    ) -> bool {
        if king.row() != from.row() {
            return false;
        }

        for dc in [-1i8, 1i8] {
            let mut current = king;
            while let Some(next) = current.offset(0, dc) {
                current = next;
                if next == from || next == victim {
                    continue;
                }
                if let Some(piece) = board.get(next) {
                    if piece.color == enemy
                        && matches!(piece.kind, PieceKind::Rook | PieceKind::Queen)
                    {
                        return true;
                    }
                    break;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::Fen;

    fn sq(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn exposes(fen: &str, from: &str, to: &str) -> bool {
        let board = Fen::parse(fen).unwrap();
        LineOracle.leaves_king_in_check(&board, sq(from), sq(to))
    }

    #[test]
    fn test_pinned_knight_cannot_move() {
        let fen = "4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1";
        assert!(exposes(fen, "e2", "c3"));
        assert!(exposes(fen, "e2", "g1"));
    }

    #[test]
    fn test_pinned_rook_moves_along_line() {
        let fen = "4r1k1/8/8/8/8/8/4R3/4K3 w - - 0 1";
        assert!(!exposes(fen, "e2", "e5"));
        assert!(!exposes(fen, "e2", "e8"));
        assert!(exposes(fen, "e2", "d2"));
    }

    #[test]
    fn test_block_or_capture_checker() {
        // e8 黑车将军，白象可以挡在 e 线上，也可以去别处（非法）
        let fen = "4r1k1/8/8/8/8/2B5/8/4K3 w - - 0 1";
        assert!(!exposes(fen, "c3", "e5"));
        assert!(exposes(fen, "c3", "d4"));
    }

    #[test]
    fn test_knight_check_must_capture() {
        // d3 黑马将军，d1 白车只能吃马
        let fen = "6k1/8/8/8/8/3n4/8/3RK3 w - - 0 1";
        assert!(!exposes(fen, "d1", "d3"));
        assert!(exposes(fen, "d1", "d2"));
        assert!(exposes(fen, "d1", "a1"));
    }

    #[test]
    fn test_double_check_only_king() {
        // 车与马同时将军，吃掉马也不能解将
        let fen = "4r1k1/8/8/8/8/3n4/8/3RK3 w - - 0 1";
        assert!(exposes(fen, "d1", "d3"));
        assert!(exposes(fen, "e1", "f2"));
        assert!(!exposes(fen, "e1", "f1"));
    }

    #[test]
    fn test_king_cannot_retreat_along_check_line() {
        let fen = "6k1/8/8/8/r3K3/8/8/8 w - - 0 1";
        assert!(exposes(fen, "e4", "f4"));
        assert!(!exposes(fen, "e4", "e5"));
    }

    #[test]
    fn test_king_cannot_capture_defended_piece() {
        let fen = "6k1/8/8/8/8/8/3qr3/4K3 w - - 0 1";
        assert!(exposes(fen, "e1", "e2"));
    }

    #[test]
    fn test_en_passant_horizontal_pin() {
        // 白王 a5，白兵 b5 吃 c5 过路兵后，h5 黑车直接看到白王
        let fen = "8/8/8/KPp4r/8/8/8/7k w - c6 0 2";
        assert!(exposes(fen, "b5", "c6"));
        assert!(!exposes(fen, "b5", "b6"));
    }

    #[test]
    fn test_en_passant_captures_checking_pawn() {
        // 黑兵 d5 刚走两步将军 e4 白王，e5 白兵吃过路兵解将
        let fen = "7k/8/8/3pP3/4K3/8/8/8 w - d6 0 2";
        assert!(!exposes(fen, "e5", "d6"));
    }
}
