//! UCI 引擎走法建议
//!
//! 每次请求启动一次引擎进程：握手、设置局面、按深度搜索，失败时重试。

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use chess_rules::{Fen, MoveSuggester, Suggestion, SuggestionRequest};

use super::{UciClient, UciConfig, UciParser};
use crate::random::RandomSuggester;

/// UCI 引擎
pub struct UciEngine {
    config: UciConfig,
    /// 最大尝试次数
    max_retries: u32,
}

impl UciEngine {
    /// 创建新的 UCI 引擎
    pub fn new(config: UciConfig) -> Self {
        Self {
            config,
            max_retries: 2,
        }
    }

    /// 设置最大尝试次数
    pub fn set_max_retries(&mut self, retries: u32) {
        self.max_retries = retries.max(1);
    }

    /// 获取配置
    pub fn config(&self) -> &UciConfig {
        &self.config
    }

    /// 单次搜索
    async fn search(&self, request: &SuggestionRequest) -> Result<Suggestion> {
        let board = Fen::parse(&request.fen).context("Invalid FEN in suggestion request")?;
        let depth = if request.depth == 0 {
            self.config.depth
        } else {
            request.depth
        };

        let mut client = UciClient::spawn(&self.config).await?;
        client.handshake(&self.config.engine_options()).await?;
        client.send("ucinewgame").await?;
        client.send(&format!("position fen {}", request.fen)).await?;
        client.send(&format!("go depth {}", depth)).await?;
        let lines = client
            .read_until(|line| line.starts_with("bestmove"))
            .await?;
        client.quit().await;

        let reply = UciParser::parse_search(&lines)?;
        UciParser::validate_move(&reply.best_move, &board)?;

        Ok(Suggestion {
            best_move: reply.best_move,
            evaluation: reply
                .score
                .map(|score| score.from_side_to_move(board.side_to_move())),
        })
    }
}

#[async_trait]
impl MoveSuggester for UciEngine {
    fn name(&self) -> &str {
        &self.config.program
    }

    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion> {
        for attempt in 1..=self.max_retries {
            info!(
                "Engine search attempt {}/{} (depth {})",
                attempt, self.max_retries, request.depth
            );

            match self.search(request).await {
                Ok(suggestion) => {
                    info!("Engine suggests {}", suggestion.best_move);
                    return Ok(suggestion);
                }
                Err(e) => warn!("Engine search failed (attempt {}): {:#}", attempt, e),
            }
        }

        bail!(
            "Engine failed to suggest a move after {} attempts",
            self.max_retries
        )
    }
}

/// 走法建议后端类型
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggesterBackend {
    /// 不使用
    #[default]
    None,
    /// 外部 UCI 引擎
    Uci,
    /// 随机合法走法
    Random,
}

impl SuggesterBackend {
    /// 创建对应的走法建议提供者
    pub fn build(&self, config: &UciConfig) -> Option<Box<dyn MoveSuggester>> {
        match self {
            SuggesterBackend::None => None,
            SuggesterBackend::Uci => Some(Box::new(UciEngine::new(config.clone()))),
            SuggesterBackend::Random => Some(Box::new(RandomSuggester::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_rules::{Evaluation, START_FEN};

    #[test]
    fn test_backend_default() {
        assert_eq!(SuggesterBackend::default(), SuggesterBackend::None);
        assert!(SuggesterBackend::None.build(&UciConfig::default()).is_none());

        let random = SuggesterBackend::Random.build(&UciConfig::default()).unwrap();
        assert_eq!(random.name(), "random");
    }

    #[test]
    fn test_backend_serde() {
        let json = serde_json::to_string(&SuggesterBackend::Uci).unwrap();
        assert_eq!(json, "\"uci\"");
    }

    #[cfg(unix)]
    fn scripted(script: &str) -> UciConfig {
        UciConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[cfg(unix)]
    const FAKE_ENGINE: &str = r#"while read line; do
        case "$line" in
            uci) echo "id name Scripted"; echo uciok;;
            isready) echo readyok;;
            go*) echo "info depth 1 score cp 25 pv e7e5"; echo "bestmove e7e5 ponder g1f3";;
            quit) exit 0;;
        esac
    done"#;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_suggest_with_scripted_engine() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let engine = UciEngine::new(scripted(FAKE_ENGINE));
        let request = SuggestionRequest {
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".to_string(),
            depth: 4,
        };
        let suggestion = engine.suggest(&request).await.unwrap();
        assert_eq!(suggestion.best_move.to_string(), "e7e5");
        // 引擎给出的是黑方视角的分值
        assert_eq!(suggestion.evaluation, Some(Evaluation::Pawns(-0.25)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_illegal_engine_move_fails() {
        let mut engine = UciEngine::new(scripted(FAKE_ENGINE));
        engine.set_max_retries(1);
        // 白方走棋时引擎回答了黑方的走法
        let request = SuggestionRequest {
            fen: START_FEN.to_string(),
            depth: 4,
        };
        assert!(engine.suggest(&request).await.is_err());
    }
}
