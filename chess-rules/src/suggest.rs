//! 走法建议接口
//!
//! 规则库本身不做搜索，只定义与外部引擎交互的数据类型。

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::moves::UciMove;
use crate::piece::Color;

/// 请求：当前局面与搜索深度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub fen: String,
    pub depth: u8,
}

/// 局面评估（白方视角）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Evaluation {
    /// 兵值，正数白方占优
    Pawns(f32),
    /// N 步杀，正数白方将杀
    MateIn(i32),
}

impl Evaluation {
    /// 从走子方视角的分值换算为白方视角
    pub fn from_side_to_move(self, side: Color) -> Evaluation {
        match (self, side) {
            (eval, Color::White) => eval,
            (Evaluation::Pawns(pawns), Color::Black) => Evaluation::Pawns(-pawns),
            (Evaluation::MateIn(moves), Color::Black) => Evaluation::MateIn(-moves),
        }
    }

    /// 从厘兵分值创建
    pub fn from_centipawns(cp: i32) -> Evaluation {
        Evaluation::Pawns(cp as f32 / 100.0)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Pawns(pawns) => write!(f, "{:+.2}", pawns),
            Evaluation::MateIn(moves) if *moves < 0 => write!(f, "-#{}", moves.abs()),
            Evaluation::MateIn(moves) => write!(f, "#{}", moves),
        }
    }
}

/// 应答：最佳走法与可选的评估
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub best_move: UciMove,
    pub evaluation: Option<Evaluation>,
}

/// 走法建议提供者
#[async_trait]
pub trait MoveSuggester: Send + Sync {
    /// 提供者名称（用于日志）
    fn name(&self) -> &str;

    /// 给出局面的最佳走法
    async fn suggest(&self, request: &SuggestionRequest) -> anyhow::Result<Suggestion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(UciMove);

    #[async_trait]
    impl MoveSuggester for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn suggest(&self, _request: &SuggestionRequest) -> anyhow::Result<Suggestion> {
            Ok(Suggestion {
                best_move: self.0,
                evaluation: Some(Evaluation::Pawns(0.3)),
            })
        }
    }

    #[test]
    fn test_evaluation_display() {
        assert_eq!(Evaluation::Pawns(0.35).to_string(), "+0.35");
        assert_eq!(Evaluation::Pawns(-1.5).to_string(), "-1.50");
        assert_eq!(Evaluation::MateIn(3).to_string(), "#3");
        assert_eq!(Evaluation::MateIn(-2).to_string(), "-#2");
    }

    #[test]
    fn test_evaluation_perspective() {
        assert_eq!(Evaluation::from_centipawns(-42), Evaluation::Pawns(-0.42));
        assert_eq!(
            Evaluation::Pawns(1.0).from_side_to_move(Color::Black),
            Evaluation::Pawns(-1.0)
        );
        assert_eq!(
            Evaluation::MateIn(2).from_side_to_move(Color::White),
            Evaluation::MateIn(2)
        );
    }

    #[tokio::test]
    async fn test_suggester_trait_object() {
        let suggester: Box<dyn MoveSuggester> = Box::new(Fixed("e2e4".parse().unwrap()));
        let request = SuggestionRequest {
            fen: crate::constants::START_FEN.to_string(),
            depth: 6,
        };
        let suggestion = suggester.suggest(&request).await.unwrap();
        assert_eq!(suggestion.best_move.to_string(), "e2e4");
        assert_eq!(suggester.name(), "fixed");
    }
}
