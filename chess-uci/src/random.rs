//! 随机走法建议（没有配置引擎时使用）

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::debug;

use chess_rules::{Fen, MoveSuggester, Suggestion, SuggestionRequest};

/// 从合法走法中随机选择
#[derive(Debug, Default)]
pub struct RandomSuggester;

impl RandomSuggester {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MoveSuggester for RandomSuggester {
    fn name(&self) -> &str {
        "random"
    }

    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion> {
        let board = Fen::parse(&request.fen).context("Invalid FEN in suggestion request")?;
        let moves = board.legal_moves();
        let best_move = moves
            .choose(&mut rand::thread_rng())
            .copied()
            .context("No legal moves in this position")?;

        debug!("Random pick {} out of {} moves", best_move, moves.len());
        Ok(Suggestion {
            best_move,
            evaluation: None,
        })
    }
}
