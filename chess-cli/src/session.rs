//! 交互式对局会话
//!
//! 解析一行输入并作用于对局；轮到引擎时向走法建议提供者请求应着。

use anyhow::{Context, Result};
use tracing::{debug, info};

use chess_rules::{Color, Fen, Game, GameRecord, MoveOutcome, MoveSuggester, UciMove};

use crate::settings::Settings;
use crate::storage::GameStorage;

/// 会话对一行输入的应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 继续，打印文本
    Continue(String),
    /// 退出
    Quit,
}

pub const HELP: &str = "\
commands:
  <uci move>      play a move, e.g. e2e4 or e7e8q
  undo            take back the last move
  history <ply>   show the position after <ply> moves
  tip             return to the current position
  board           print the board
  fen             print the current FEN
  moves           list legal moves
  notation        print the move list
  save            save the game record
  quit            leave";

/// 对局会话
pub struct Session {
    game: Game,
    settings: Settings,
    suggester: Option<Box<dyn MoveSuggester>>,
    storage: Option<GameStorage>,
    /// 引擎失败时的局面，局面改变前不再请求
    engine_paused_at: Option<String>,
}

impl Session {
    /// 按设置创建会话
    pub fn new(game: Game, settings: Settings) -> Self {
        let suggester = settings.backend.build(&settings.uci);
        Self {
            game,
            settings,
            suggester,
            storage: None,
            engine_paused_at: None,
        }
    }

    /// 替换走法建议提供者
    pub fn with_suggester(mut self, suggester: Box<dyn MoveSuggester>) -> Self {
        self.suggester = Some(suggester);
        self
    }

    /// 启用棋谱保存
    pub fn with_storage(mut self, storage: GameStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// 提示符
    pub fn prompt(&self) -> String {
        match self.game.viewed_ply() {
            Some(ply) => format!("[ply {}]> ", ply),
            None => format!("{}> ", color_name(self.game.side_to_move())),
        }
    }

    /// 是否轮到引擎走棋
    pub fn engine_to_move(&self) -> bool {
        self.suggester.is_some()
            && !self.game.is_game_over()
            && !self.game.is_viewing_history()
            && self.game.side_to_move() == self.settings.engine_color
            && self.engine_paused_at.as_deref() != Some(self.game.fen().as_str())
    }

    /// 请求并执行引擎的应着，失败后在局面改变前不再请求
    pub async fn engine_move(&mut self) -> Result<String> {
        let result = self.request_engine_move().await;
        if result.is_err() {
            self.engine_paused_at = Some(self.game.fen());
        }
        result
    }

    async fn request_engine_move(&mut self) -> Result<String> {
        let suggester = self.suggester.as_ref().context("No move suggester configured")?;
        let request = self
            .game
            .suggestion_request(self.settings.uci.depth)
            .context("The game is not accepting moves")?;

        debug!("Asking {} for a move at depth {}", suggester.name(), request.depth);
        let suggestion = suggester.suggest(&request).await?;
        let name = suggester.name().to_string();
        let outcome = self.game.apply_suggestion(&request, &suggestion)?;

        let mut text = format!("{} plays {}", name, self.last_move_text(outcome));
        if let Some(evaluation) = suggestion.evaluation {
            text.push_str(&format!(" ({})", evaluation));
        }
        Ok(self.with_board(text))
    }

    /// 处理一行输入
    pub fn handle(&mut self, line: &str) -> Result<Reply> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Reply::Continue(String::new()));
        };

        let text = match command {
            "quit" | "exit" => return Ok(Reply::Quit),
            "help" => HELP.to_string(),
            "board" => self.game.board().to_string(),
            "fen" => Fen::to_string(self.game.board()),
            "moves" => {
                let moves: Vec<String> = self
                    .game
                    .legal_moves()
                    .iter()
                    .map(UciMove::to_string)
                    .collect();
                format!("{} legal moves: {}", moves.len(), moves.join(" "))
            }
            "notation" => self.notation_text(),
            "undo" => {
                let outcome = self.game.undo_last_move()?;
                self.with_board(format!("move taken back, {}", outcome_text(outcome)))
            }
            "history" => {
                let ply = words
                    .next()
                    .context("usage: history <ply>")?
                    .parse::<usize>()
                    .context("ply must be a number")?;
                self.game.view_history(ply)?;
                self.game.board().to_string()
            }
            "tip" => {
                self.game.return_to_tip();
                self.game.board().to_string()
            }
            "save" => self.save()?,
            _ => {
                let uci: UciMove = command.parse()?;
                let outcome = self.game.apply(&uci)?;
                self.with_board(self.last_move_text(outcome))
            }
        };
        Ok(Reply::Continue(text))
    }

    fn save(&self) -> Result<String> {
        let storage = self.storage.as_ref().context("Game storage is not available")?;
        let engine = self.suggester.as_ref().map(|s| s.name().to_string());
        let player = |color: Color| match (&engine, color == self.settings.engine_color) {
            (Some(name), true) => name.clone(),
            _ => "Human".to_string(),
        };

        let record = GameRecord::from_game(&self.game, player(Color::White), player(Color::Black));
        let game_id = storage.save(&record)?;
        info!("Saved game {}", game_id);
        Ok(format!("saved as {}", game_id))
    }

    fn last_move_text(&self, outcome: MoveOutcome) -> String {
        let san = self
            .game
            .history()
            .last()
            .map(|mv| mv.notation().to_string())
            .unwrap_or_default();
        match outcome {
            MoveOutcome::Moved | MoveOutcome::Check => san,
            _ => format!("{}  {}", san, outcome_text(outcome)),
        }
    }

    fn with_board(&self, text: String) -> String {
        if self.settings.show_board {
            format!("{}\n{}", text, self.game.board())
        } else {
            text
        }
    }

    fn notation_text(&self) -> String {
        let mut lines: Vec<String> = self
            .game
            .notation()
            .iter()
            .map(|pair| {
                format!(
                    "{}. {} {}",
                    pair.number,
                    pair.white.as_deref().unwrap_or("..."),
                    pair.black.as_deref().unwrap_or("")
                )
                .trim_end()
                .to_string()
            })
            .collect();
        if let Some(result) = self.game.result() {
            lines.push(result.to_string());
        }
        lines.join("\n")
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

fn outcome_text(outcome: MoveOutcome) -> &'static str {
    match outcome {
        MoveOutcome::Moved => "game continues",
        MoveOutcome::Check => "check",
        MoveOutcome::Checkmate => "checkmate",
        MoveOutcome::Stalemate => "stalemate",
        MoveOutcome::FiftyMoveDraw => "draw by the fifty-move rule",
    }
}
