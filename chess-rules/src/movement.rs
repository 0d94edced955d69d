//! 走法描述与通用生成例程
//!
//! 每种棋子只对应一个走法描述：定步、滑动或兵的特殊规则。
//! 生成结果同时包含可走格、控制格和朝向敌方王的射线。

use crate::board::Board;
use crate::constants::MAX_SLIDE;
use crate::coordinate::Coordinate;
use crate::piece::{CastleSide, Piece, PieceKind, KING_HOME_COL};

/// 直线方向
pub const ORTHOGONAL: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// 斜线方向
pub const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// 直线加斜线
pub const ROYAL: [(i8, i8); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

/// 马的跳跃偏移
pub const KNIGHT_LEAPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

/// 王的单步偏移
pub const KING_STEPS: [(i8, i8); 8] = ROYAL;

/// 走法描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// 固定偏移（马、王）
    Step(&'static [(i8, i8)]),
    /// 沿方向滑动（象、车、后）
    Slide(&'static [(i8, i8)]),
    /// 兵：前进与吃子不对称
    Pawn,
}

/// 单个棋子的生成结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reach {
    /// 伪合法目标格
    pub moves: Vec<Coordinate>,
    /// 控制格（含己方棋子占据的格子）
    pub control: Vec<Coordinate>,
    /// 朝向敌方王的射线
    pub line_to_king: Vec<Coordinate>,
}

/// 按走法描述生成棋子的伪合法走法
pub fn generate(board: &Board, piece: &Piece) -> Reach {
    let mut reach = Reach::default();

    match piece.kind.movement() {
        Movement::Step(offsets) => step(board, piece, offsets, &mut reach),
        Movement::Slide(directions) => slide(board, piece, directions, &mut reach),
        Movement::Pawn => pawn(board, piece, &mut reach),
    }

    if piece.kind == PieceKind::King {
        castling(board, piece, &mut reach);
    }

    reach
}

/// 定步生成
fn step(board: &Board, piece: &Piece, offsets: &[(i8, i8)], reach: &mut Reach) {
    for &(dr, dc) in offsets {
        let Some(to) = piece.coord.offset(dr, dc) else {
            continue;
        };

        reach.control.push(to);

        match board.get(to) {
            Some(target) if target.color == piece.color => {}
            Some(target) => {
                reach.moves.push(to);
                // 王不会将军
                if target.is_king_of(piece.color.opponent()) && piece.kind != PieceKind::King {
                    reach.line_to_king = vec![to];
                }
            }
            None => reach.moves.push(to),
        }
    }
}

/// 滑动生成（射线投射）
fn slide(board: &Board, piece: &Piece, directions: &[(i8, i8)], reach: &mut Reach) {
    let enemy = piece.color.opponent();

    for &(dr, dc) in directions {
        let mut moving = true;
        let mut controlling = true;
        let mut tracing = true;
        let mut line = Vec::new();

        for distance in 1..=MAX_SLIDE {
            let Some(to) = piece.coord.offset(dr * distance, dc * distance) else {
                break;
            };
            let occupant = board.get(to);

            if moving {
                match occupant {
                    None => reach.moves.push(to),
                    Some(target) => {
                        if target.color != piece.color {
                            reach.moves.push(to);
                        }
                        moving = false;
                    }
                }
            }

            // 控制线穿过敌方王，王不能沿将军线后退
            if controlling {
                reach.control.push(to);
                if let Some(target) = occupant {
                    controlling = target.is_king_of(enemy);
                }
            }

            if tracing {
                if let Some(target) = occupant {
                    line.push(to);
                    if target.is_king_of(enemy) {
                        reach.line_to_king = std::mem::take(&mut line);
                        tracing = false;
                    } else if line.len() == 2 {
                        tracing = false;
                    }
                }
            }

            if !moving && !controlling && !tracing {
                break;
            }
        }
    }
}

/// 兵的生成
fn pawn(board: &Board, piece: &Piece, reach: &mut Reach) {
    let forward = piece.color.pawn_direction();

    // 前进只能走到空格
    if let Some(one) = piece.coord.offset(forward, 0) {
        if board.get(one).is_none() {
            reach.moves.push(one);

            if !piece.has_moved {
                if let Some(two) = one.offset(forward, 0) {
                    if board.get(two).is_none() {
                        reach.moves.push(two);
                    }
                }
            }
        }
    }

    // 斜向吃子，或吃过路兵
    for dc in [-1i8, 1i8] {
        let Some(to) = piece.coord.offset(forward, dc) else {
            continue;
        };

        reach.control.push(to);

        match board.get(to) {
            Some(target) if target.color != piece.color => {
                reach.moves.push(to);
                if target.kind == PieceKind::King {
                    reach.line_to_king = vec![to];
                }
            }
            Some(_) => {}
            None => {
                if board.en_passant() == Some(to) && to.row() == piece.color.en_passant_row() {
                    reach.moves.push(to);
                }
            }
        }
    }
}

/// 王车易位的目标格（只检查结构条件，受攻击与否由合法性判定负责）
fn castling(board: &Board, king: &Piece, reach: &mut Reach) {
    let row = king.color.back_rank();
    if king.has_moved || king.coord != Coordinate::new_unchecked(row, KING_HOME_COL) {
        return;
    }

    for side in [CastleSide::KingSide, CastleSide::QueenSide] {
        let rook_square = Coordinate::new_unchecked(row, side.rook_col());
        let rook_ready = board.get(rook_square).is_some_and(|rook| {
            rook.kind == PieceKind::Rook && rook.color == king.color && !rook.has_moved
        });
        if !rook_ready {
            continue;
        }

        let path_clear = Coordinate::between(king.coord, rook_square)
            .iter()
            .all(|&square| board.get(square).is_none());
        if path_clear {
            reach
                .moves
                .push(Coordinate::new_unchecked(row, side.king_target_col()));
        }
    }
}
