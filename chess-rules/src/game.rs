//! 对局状态机
//!
//! 持有唯一的棋盘、走法历史、记谱与逐步的 FEN 历史。
//! 所有走棋请求（玩家或外部引擎）都经过 [`Game::apply_move_with_promotion`]。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::constants::{FIFTY_MOVE_HALFMOVES, START_FEN};
use crate::coordinate::Coordinate;
use crate::error::{ChessError, Result};
use crate::fen::Fen;
use crate::moves::{Move, UciMove};
use crate::oracle::{LegalityOracle, LineOracle};
use crate::outcome::{GameResult, GameStatus, MoveOutcome};
use crate::perft;
use crate::piece::{Color, PieceKind};
use crate::suggest::{Evaluation, Suggestion, SuggestionRequest};

/// 一个完整回合的记谱（白方、黑方各一个半回合）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePair {
    pub number: u32,
    pub white: Option<String>,
    pub black: Option<String>,
}

/// 正在浏览的历史局面
#[derive(Debug, Clone)]
struct HistoryView {
    ply: usize,
    board: Board,
}

/// 对局
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    oracle: Arc<dyn LegalityOracle>,
    checked: bool,
    status: GameStatus,
    history: Vec<Move>,
    notation: Vec<MovePair>,
    /// 每一步之后的 FEN，下标 0 为载入的局面
    positions: Vec<String>,
    view: Option<HistoryView>,
    evaluation: Option<Evaluation>,
}

impl Game {
    /// 从初始局面开始
    pub fn new() -> Self {
        Self::with_oracle(Arc::new(LineOracle))
    }

    /// 使用指定的合法性判定
    pub fn with_oracle(oracle: Arc<dyn LegalityOracle>) -> Self {
        let board = Fen::parse_with(START_FEN, oracle.as_ref())
            .expect("Initial FEN should be valid");
        let mut game = Self {
            board,
            oracle,
            checked: false,
            status: GameStatus::Active,
            history: Vec::new(),
            notation: Vec::new(),
            positions: Vec::new(),
            view: None,
            evaluation: None,
        };
        game.reset_history();
        game
    }

    /// 从 FEN 开始
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut game = Self::new();
        game.load_position(fen)?;
        Ok(game)
    }

    /// 载入局面，清空历史并重新计算终局标记
    ///
    /// 解析失败时对局保持不变。
    pub fn load_position(&mut self, fen: &str) -> Result<MoveOutcome> {
        let board = Fen::parse_with(fen, self.oracle.as_ref()).inspect_err(|err| {
            warn!("Rejected position {:?}: {}", fen, err);
        })?;

        self.board = board;
        self.reset_history();
        let outcome = self.refresh_status();
        info!("Loaded position {} ({:?})", self.fen(), outcome);
        Ok(outcome)
    }

    /// 重新开始
    pub fn restart(&mut self) -> MoveOutcome {
        self.board = Fen::parse_with(START_FEN, self.oracle.as_ref())
            .expect("Initial FEN should be valid");
        self.reset_history();
        self.refresh_status()
    }

    /// 走棋，兵到底线升变为后
    pub fn apply_move(&mut self, from: Coordinate, to: Coordinate) -> Result<MoveOutcome> {
        self.apply_move_with_promotion(from, to, PieceKind::Queen)
    }

    /// 按 UCI 走法走棋
    pub fn apply(&mut self, uci: &UciMove) -> Result<MoveOutcome> {
        self.apply_move_with_promotion(
            uci.from,
            uci.to,
            uci.promotion.unwrap_or(PieceKind::Queen),
        )
    }

    /// 走棋并指定升变棋子
    pub fn apply_move_with_promotion(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        promotion: PieceKind,
    ) -> Result<MoveOutcome> {
        if self.view.is_some() {
            return Err(ChessError::ViewingHistory);
        }
        if self.status.is_over() {
            return Err(ChessError::GameOver);
        }

        let mut mv = Move::with_promotion(&self.board, from, to, promotion).inspect_err(|err| {
            warn!("Rejected move {}{}: {}", from, to, err);
        })?;
        self.board.apply_move(&mut mv, self.oracle.as_ref())?;

        self.record_notation(&mv);
        self.positions.push(Fen::to_string(&self.board));
        self.history.push(mv);

        let outcome = self.refresh_status();
        debug!("Position after move: {} ({:?})", self.fen(), outcome);
        Ok(outcome)
    }

    /// 悔一步棋
    pub fn undo_last_move(&mut self) -> Result<MoveOutcome> {
        if self.view.is_some() {
            return Err(ChessError::ViewingHistory);
        }
        let mv = self.history.last().ok_or(ChessError::NothingToUndo)?;
        self.board.undo_move(mv, self.oracle.as_ref())?;

        let color = mv.color();
        self.history.pop();
        self.positions.pop();
        if let Some(pair) = self.notation.last_mut() {
            match color {
                Color::White => pair.white = None,
                Color::Black => pair.black = None,
            }
            if pair.white.is_none() && pair.black.is_none() {
                self.notation.pop();
            }
        }

        self.evaluation = None;
        Ok(self.refresh_status())
    }

    /// 浏览第 `ply` 个半回合之后的局面（0 为载入的局面），浏览期间不能走棋
    pub fn view_history(&mut self, ply: usize) -> Result<MoveOutcome> {
        let len = self.positions.len();
        let fen = self
            .positions
            .get(ply)
            .ok_or(ChessError::HistoryOutOfRange { index: ply, len })?;

        if ply + 1 == len {
            return Ok(self.return_to_tip());
        }

        let board = Fen::parse_with(fen, self.oracle.as_ref())?;
        let outcome = Self::assess(&board).1;
        self.view = Some(HistoryView { ply, board });
        debug!("Viewing ply {} of {}", ply, len - 1);
        Ok(outcome)
    }

    /// 回到当前局面
    pub fn return_to_tip(&mut self) -> MoveOutcome {
        self.view = None;
        self.refresh_status()
    }

    /// 是否正在浏览历史
    pub fn is_viewing_history(&self) -> bool {
        self.view.is_some()
    }

    /// 正在浏览的半回合序号
    pub fn viewed_ply(&self) -> Option<usize> {
        self.view.as_ref().map(|view| view.ply)
    }

    /// 用于显示的棋盘（浏览历史时为历史局面）
    pub fn board(&self) -> &Board {
        self.view.as_ref().map_or(&self.board, |view| &view.board)
    }

    /// 当前对局的棋盘
    pub fn live_board(&self) -> &Board {
        &self.board
    }

    /// 某个棋子当前可走的目标格（不能走棋时为空）
    pub fn legal_destinations(&self, from: Coordinate) -> Vec<Coordinate> {
        if self.view.is_some() || self.status.is_over() {
            return Vec::new();
        }
        self.board.legal_destinations(from)
    }

    /// 全部合法走法（不能走棋时为空）
    pub fn legal_moves(&self) -> Vec<UciMove> {
        if self.view.is_some() || self.status.is_over() {
            return Vec::new();
        }
        self.board.legal_moves()
    }

    /// 在当前局面的副本上运行 perft
    pub fn perft(&self, depth: u32) -> Result<u64> {
        let mut board = self.board.clone();
        perft::perft(&mut board, depth, self.oracle.as_ref())
    }

    /// 生成走法建议请求，不能走棋时返回 None
    pub fn suggestion_request(&self, depth: u8) -> Option<SuggestionRequest> {
        if self.view.is_some() || self.status.is_over() {
            return None;
        }
        Some(SuggestionRequest {
            fen: self.fen(),
            depth,
        })
    }

    /// 应用外部引擎的建议（与玩家走棋走同一入口）
    ///
    /// 请求发出后局面已变化的应答会被拒绝。
    pub fn apply_suggestion(
        &mut self,
        request: &SuggestionRequest,
        suggestion: &Suggestion,
    ) -> Result<MoveOutcome> {
        if request.fen != self.fen() {
            warn!(
                "Discarding stale suggestion {} for {}",
                suggestion.best_move, request.fen
            );
            return Err(ChessError::StaleSuggestion);
        }

        let outcome = self.apply(&suggestion.best_move)?;
        self.evaluation = suggestion.evaluation;
        Ok(outcome)
    }

    /// 当前局面 FEN
    pub fn fen(&self) -> String {
        Fen::to_string(&self.board)
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// 走子方是否被将军
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_over()
    }

    /// 对局结果，未结束时为 None
    pub fn result(&self) -> Option<GameResult> {
        GameResult::from_status(self.status, self.board.side_to_move())
    }

    /// 走法历史
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// 按回合配对的记谱
    pub fn notation(&self) -> &[MovePair] {
        &self.notation
    }

    /// 每一步之后的 FEN
    pub fn positions(&self) -> &[String] {
        &self.positions
    }

    /// 最近一次外部引擎给出的评估
    pub fn evaluation(&self) -> Option<Evaluation> {
        self.evaluation
    }

    fn reset_history(&mut self) {
        self.history.clear();
        self.notation.clear();
        self.positions = vec![Fen::to_string(&self.board)];
        self.view = None;
        self.evaluation = None;
    }

    fn record_notation(&mut self, mv: &Move) {
        let san = Some(mv.notation().to_string());
        match mv.color() {
            Color::White => self.notation.push(MovePair {
                number: mv.move_clock(),
                white: san,
                black: None,
            }),
            Color::Black => {
                let number = mv.move_clock() - 1;
                match self.notation.last_mut() {
                    Some(pair) if pair.number == number && pair.black.is_none() => {
                        pair.black = san;
                    }
                    _ => self.notation.push(MovePair {
                        number,
                        white: None,
                        black: san,
                    }),
                }
            }
        }
    }

    /// 根据当前棋盘重新计算将军与终局标记
    fn refresh_status(&mut self) -> MoveOutcome {
        let ((checked, status), outcome) = Self::assess(&self.board);
        self.checked = checked;
        self.status = status;
        if status.is_over() {
            info!("Game over: {:?}", status);
        }
        outcome
    }

    fn assess(board: &Board) -> ((bool, GameStatus), MoveOutcome) {
        let checked = board.in_check(board.side_to_move());
        let no_moves = board.legal().is_empty();

        let status = if no_moves && checked {
            GameStatus::Checkmate
        } else if no_moves {
            GameStatus::Stalemate
        } else if board.halfmove_clock() >= FIFTY_MOVE_HALFMOVES {
            GameStatus::FiftyMoveDraw
        } else {
            GameStatus::Active
        };

        let outcome = match status {
            GameStatus::Checkmate => MoveOutcome::Checkmate,
            GameStatus::Stalemate => MoveOutcome::Stalemate,
            GameStatus::FiftyMoveDraw => MoveOutcome::FiftyMoveDraw,
            GameStatus::Active if checked => MoveOutcome::Check,
            GameStatus::Active => MoveOutcome::Moved,
        };

        ((checked, status), outcome)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn play(game: &mut Game, moves: &[&str]) -> MoveOutcome {
        let mut outcome = MoveOutcome::Moved;
        for uci in moves {
            outcome = game.apply(&uci.parse().unwrap()).unwrap();
        }
        outcome
    }

    #[test]
    fn test_new_game() {
        let game = Game::new();
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.status(), GameStatus::Active);
        assert!(!game.is_checked());
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.positions(), &[START_FEN.to_string()]);
    }

    #[test]
    fn test_fools_mate_by_moves() {
        let mut game = Game::new();
        let outcome = play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(outcome, MoveOutcome::Checkmate);
        assert!(game.is_game_over());
        assert_eq!(
            game.result(),
            Some(GameResult::BlackWin(crate::outcome::WinReason::Checkmate))
        );
        assert_eq!(
            game.apply_move(sq("a2"), sq("a3")),
            Err(ChessError::GameOver)
        );
    }

    #[test]
    fn test_load_checkmate_position() {
        let mut game = Game::new();
        let outcome = game
            .load_position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Checkmate);
        assert!(game.is_checked());
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.live_board().legal_move_count(), 0);
    }

    #[test]
    fn test_stalemate() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::Stalemate);
        assert!(!game.is_checked());
    }

    #[test]
    fn test_fifty_move_draw() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
        assert_eq!(game.status(), GameStatus::Active);
        let outcome = game.apply_move(sq("a1"), sq("a2")).unwrap();
        assert_eq!(outcome, MoveOutcome::FiftyMoveDraw);
        assert_eq!(
            game.result(),
            Some(GameResult::Draw(crate::outcome::DrawReason::FiftyMoves))
        );
    }

    #[test]
    fn test_check_outcome() {
        let mut game = Game::new();
        let outcome = play(&mut game, &["e2e4", "f7f6", "d1h5"]);
        assert_eq!(outcome, MoveOutcome::Check);
        assert!(game.is_checked());
        assert_eq!(game.notation().last().unwrap().white.as_deref(), Some("Qh5+"));
    }

    #[test]
    fn test_rejected_move_leaves_state() {
        let mut game = Game::new();
        let fen = game.fen();
        assert!(game.apply_move(sq("e2"), sq("e5")).is_err());
        assert!(game.apply_move(sq("e7"), sq("e5")).is_err());
        assert_eq!(game.fen(), fen);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_invalid_fen_keeps_game() {
        let mut game = Game::new();
        play(&mut game, &["e2e4"]);
        let fen = game.fen();
        assert!(game.load_position("not a fen").is_err());
        assert_eq!(game.fen(), fen);
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_notation_pairs() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "e7e5", "g1f3"]);
        let pairs = game.notation();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].white.as_deref(), Some("e4"));
        assert_eq!(pairs[0].black.as_deref(), Some("e5"));
        assert_eq!(pairs[1].number, 2);
        assert_eq!(pairs[1].black, None);
    }

    #[test]
    fn test_notation_starting_with_black() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 7").unwrap();
        play(&mut game, &["e8d8", "e2e4"]);
        let pairs = game.notation();
        assert_eq!(pairs[0].number, 7);
        assert_eq!(pairs[0].white, None);
        assert_eq!(pairs[0].black.as_deref(), Some("Kd8"));
        assert_eq!(pairs[1].number, 8);
    }

    #[test]
    fn test_undo() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "e7e5"]);
        game.undo_last_move().unwrap();
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.positions().len(), 2);
        assert_eq!(game.notation()[0].black, None);
        assert_eq!(game.side_to_move(), Color::Black);

        game.undo_last_move().unwrap();
        assert!(game.notation().is_empty());
        assert_eq!(game.fen(), START_FEN);
        assert_eq!(game.undo_last_move(), Err(ChessError::NothingToUndo));
    }

    #[test]
    fn test_undo_after_checkmate_resumes_game() {
        let mut game = Game::new();
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert!(game.is_game_over());
        assert_eq!(game.undo_last_move().unwrap(), MoveOutcome::Moved);
        assert!(!game.is_game_over());
    }

    #[test]
    fn test_view_history() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "e7e5", "g1f3"]);
        let tip = game.fen();

        game.view_history(1).unwrap();
        assert!(game.is_viewing_history());
        assert_eq!(game.viewed_ply(), Some(1));
        assert_eq!(game.board().side_to_move(), Color::Black);
        assert!(game.board().get(sq("e4")).is_some());
        assert!(game.board().get(sq("e5")).is_none());
        assert_eq!(
            game.apply_move(sq("b8"), sq("c6")),
            Err(ChessError::ViewingHistory)
        );
        assert!(game.legal_destinations(sq("b8")).is_empty());
        assert!(game.legal_moves().is_empty());
        assert!(game.suggestion_request(6).is_none());

        game.return_to_tip();
        assert!(!game.is_viewing_history());
        assert_eq!(game.fen(), tip);
        assert_eq!(game.legal_moves().len(), 29);
        game.apply_move(sq("b8"), sq("c6")).unwrap();

        // 选中最后一个局面等同于回到当前局面
        let last = game.positions().len() - 1;
        game.view_history(last).unwrap();
        assert!(!game.is_viewing_history());

        assert_eq!(
            game.view_history(99),
            Err(ChessError::HistoryOutOfRange { index: 99, len: 5 })
        );
    }

    #[test]
    fn test_legal_destinations() {
        let game = Game::new();
        let mut dests = game.legal_destinations(sq("g1"));
        dests.sort();
        let mut expected = vec![sq("f3"), sq("h3")];
        expected.sort();
        assert_eq!(dests, expected);
        assert!(game.legal_destinations(sq("e4")).is_empty());
    }

    #[test]
    fn test_perft_on_copy() {
        let game = Game::new();
        assert_eq!(game.perft(2).unwrap(), 400);
        assert_eq!(game.fen(), START_FEN);
    }

    #[test]
    fn test_apply_suggestion() {
        let mut game = Game::new();
        let request = game.suggestion_request(6).unwrap();
        let suggestion = Suggestion {
            best_move: "e2e4".parse().unwrap(),
            evaluation: Some(Evaluation::Pawns(0.3)),
        };
        game.apply_suggestion(&request, &suggestion).unwrap();
        assert_eq!(game.evaluation(), Some(Evaluation::Pawns(0.3)));
        assert_eq!(game.side_to_move(), Color::Black);

        // 同一个请求的应答再次到达时局面已经变了
        assert_eq!(
            game.apply_suggestion(&request, &suggestion),
            Err(ChessError::StaleSuggestion)
        );
    }

    #[test]
    fn test_restart() {
        let mut game = Game::new();
        play(&mut game, &["e2e4"]);
        assert_eq!(game.restart(), MoveOutcome::Moved);
        assert_eq!(game.fen(), START_FEN);
        assert!(game.history().is_empty());
    }
}
