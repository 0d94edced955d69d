//! 走法枚举计数（perft）
//!
//! 在同一块棋盘上执行、递归、撤销，统计给定深度的叶子局面数。

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::board::Board;
use crate::error::Result;
use crate::fen::Fen;
use crate::moves::{Move, UciMove};
use crate::oracle::{LegalityOracle, LineOracle};

/// 一次 perft 运行的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerftReport {
    pub depth: u32,
    pub nodes: u64,
    pub elapsed: Duration,
}

impl PerftReport {
    /// 每秒节点数
    pub fn nodes_per_second(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.nodes as f64 / secs) as u64
        } else {
            self.nodes
        }
    }
}

/// 统计叶子节点数，返回时棋盘恢复原状
pub fn perft(board: &mut Board, depth: u32, oracle: &dyn LegalityOracle) -> Result<u64> {
    if depth == 0 {
        return Ok(1);
    }

    let moves = board.legal_moves();
    if depth == 1 {
        return Ok(moves.len() as u64);
    }

    let mut nodes = 0;
    for uci in moves {
        let mut mv = Move::from_uci(board, &uci)?;
        board.apply_move(&mut mv, oracle)?;
        nodes += perft(board, depth - 1, oracle)?;
        board.undo_move(&mv, oracle)?;
    }
    Ok(nodes)
}

/// 按第一步拆分的节点数
pub fn divide(
    board: &mut Board,
    depth: u32,
    oracle: &dyn LegalityOracle,
) -> Result<Vec<(UciMove, u64)>> {
    let mut split = Vec::new();
    if depth == 0 {
        return Ok(split);
    }

    for uci in board.legal_moves() {
        let mut mv = Move::from_uci(board, &uci)?;
        board.apply_move(&mut mv, oracle)?;
        let nodes = perft(board, depth - 1, oracle)?;
        board.undo_move(&mv, oracle)?;

        debug!("{}: {}", uci, nodes);
        split.push((uci, nodes));
    }
    Ok(split)
}

/// 从 FEN 开始运行 perft 并计时
pub fn run(fen: &str, depth: u32) -> Result<PerftReport> {
    let mut board = Fen::parse(fen)?;

    let start = Instant::now();
    let nodes = perft(&mut board, depth, &LineOracle)?;
    let report = PerftReport {
        depth,
        nodes,
        elapsed: start.elapsed(),
    };

    info!(
        "perft({}) = {} in {:?} ({} nps)",
        depth,
        nodes,
        report.elapsed,
        report.nodes_per_second()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::START_FEN;

    #[test]
    fn test_perft_start_shallow() {
        let mut board = Fen::parse(START_FEN).unwrap();
        assert_eq!(perft(&mut board, 0, &LineOracle).unwrap(), 1);
        assert_eq!(perft(&mut board, 1, &LineOracle).unwrap(), 20);
        assert_eq!(perft(&mut board, 2, &LineOracle).unwrap(), 400);
    }

    #[test]
    fn test_perft_leaves_board_unchanged() {
        let mut board = Fen::parse(START_FEN).unwrap();
        let before = board.clone();
        perft(&mut board, 3, &LineOracle).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn test_divide_sums_to_perft() {
        let mut board = Fen::parse(START_FEN).unwrap();
        let split = divide(&mut board, 2, &LineOracle).unwrap();
        assert_eq!(split.len(), 20);
        assert!(split.iter().all(|(_, nodes)| *nodes == 20));
        assert_eq!(split.iter().map(|(_, nodes)| nodes).sum::<u64>(), 400);
    }

    #[test]
    fn test_run_report() {
        let report = run(START_FEN, 3).unwrap();
        assert_eq!(report.depth, 3);
        assert_eq!(report.nodes, 8902);
    }
}
