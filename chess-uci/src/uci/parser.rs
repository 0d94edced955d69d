//! UCI 输出解析器
//!
//! 解析引擎的 `info ... score` 与 `bestmove` 行，并验证走法合法性。

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use chess_rules::{Board, Evaluation, UciMove};

/// 一次搜索的结果（分值为走子方视角）
#[derive(Debug, Clone, PartialEq)]
pub struct EngineReply {
    pub best_move: UciMove,
    pub score: Option<Evaluation>,
}

/// UCI 输出解析器
pub struct UciParser;

impl UciParser {
    /// 从 info 行中解析分值，不含 score 字段时返回 None
    pub fn parse_score(line: &str) -> Option<Evaluation> {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("info") {
            return None;
        }

        while let Some(token) = tokens.next() {
            if token != "score" {
                continue;
            }
            let kind = tokens.next()?;
            let value: i32 = tokens.next()?.parse().ok()?;
            return match kind {
                "cp" => Some(Evaluation::from_centipawns(value)),
                "mate" => Some(Evaluation::MateIn(value)),
                _ => None,
            };
        }
        None
    }

    /// 解析 bestmove 行，引擎无棋可走（"bestmove (none)"）时返回 None
    pub fn parse_bestmove(line: &str) -> Result<Option<UciMove>> {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("bestmove") {
            bail!("Not a bestmove line: {}", line);
        }

        match tokens.next() {
            None | Some("(none)") | Some("0000") => Ok(None),
            Some(text) => text
                .parse()
                .map(Some)
                .with_context(|| format!("Invalid move in engine output: {}", text)),
        }
    }

    /// 从一次搜索的全部输出中取出最佳走法和最后一次报告的分值
    pub fn parse_search(lines: &[String]) -> Result<EngineReply> {
        let score = lines.iter().filter_map(|line| Self::parse_score(line)).last();

        let bestmove_line = lines
            .iter()
            .rev()
            .find(|line| line.starts_with("bestmove"))
            .context("Engine output has no bestmove line")?;

        let best_move = Self::parse_bestmove(bestmove_line)?
            .context("Engine reported no legal move")?;

        debug!("Engine reply: {} ({:?})", best_move, score);
        Ok(EngineReply { best_move, score })
    }

    /// 验证走法在局面中是否合法
    pub fn validate_move(mv: &UciMove, board: &Board) -> Result<()> {
        if !board.legal_moves().contains(mv) {
            warn!("Engine suggested illegal move: {}", mv);
            bail!("Move is not legal: {}", mv);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_rules::{Fen, START_FEN};

    #[test]
    fn test_parse_score() {
        let line = "info depth 6 seldepth 8 multipv 1 score cp 35 nodes 1234 pv e2e4 e7e5";
        assert_eq!(UciParser::parse_score(line), Some(Evaluation::Pawns(0.35)));

        let mate = "info depth 10 score mate -3 pv h7h8";
        assert_eq!(UciParser::parse_score(mate), Some(Evaluation::MateIn(-3)));

        assert_eq!(UciParser::parse_score("info string NNUE enabled"), None);
        assert_eq!(UciParser::parse_score("bestmove e2e4"), None);
    }

    #[test]
    fn test_parse_bestmove() {
        let mv = UciParser::parse_bestmove("bestmove e2e4 ponder e7e5").unwrap();
        assert_eq!(mv.unwrap().to_string(), "e2e4");

        let promo = UciParser::parse_bestmove("bestmove a7a8q").unwrap().unwrap();
        assert_eq!(promo.to_string(), "a7a8q");

        assert_eq!(UciParser::parse_bestmove("bestmove (none)").unwrap(), None);
        assert!(UciParser::parse_bestmove("bestmove zz").is_err());
        assert!(UciParser::parse_bestmove("readyok").is_err());
    }

    #[test]
    fn test_parse_search_uses_last_score() {
        let lines: Vec<String> = [
            "info depth 1 score cp 10 pv d2d4",
            "info depth 2 score cp -20 pv e2e4",
            "bestmove e2e4",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let reply = UciParser::parse_search(&lines).unwrap();
        assert_eq!(reply.best_move.to_string(), "e2e4");
        assert_eq!(reply.score, Some(Evaluation::Pawns(-0.2)));
    }

    #[test]
    fn test_parse_search_without_bestmove() {
        let lines = vec!["info depth 1 score cp 10".to_string()];
        assert!(UciParser::parse_search(&lines).is_err());

        let none = vec!["bestmove (none)".to_string()];
        assert!(UciParser::parse_search(&none).is_err());
    }

    #[test]
    fn test_validate_move() {
        let board = Fen::parse(START_FEN).unwrap();
        assert!(UciParser::validate_move(&"e2e4".parse().unwrap(), &board).is_ok());
        assert!(UciParser::validate_move(&"e2e5".parse().unwrap(), &board).is_err());
    }
}
