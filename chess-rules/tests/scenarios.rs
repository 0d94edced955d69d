//! 局面场景测试：往返、可逆性、过路兵时效、牵制、将死与易位

use chess_rules::{
    Board, Color, Coordinate, Fen, Game, GameStatus, LineOracle, Move, MoveOutcome, PieceKind,
    START_FEN,
};

fn sq(s: &str) -> Coordinate {
    s.parse().unwrap()
}

/// 遍历给定深度内所有局面，对每个局面执行检查
fn walk(board: &mut Board, depth: u32, check: &mut dyn FnMut(&mut Board)) {
    check(board);
    if depth == 0 {
        return;
    }
    for uci in board.legal_moves() {
        let mut mv = Move::from_uci(board, &uci).unwrap();
        board.apply_move(&mut mv, &LineOracle).unwrap();
        walk(board, depth - 1, check);
        board.undo_move(&mv, &LineOracle).unwrap();
    }
}

#[test]
fn test_fen_roundtrip_for_reachable_positions() {
    for fen in [
        START_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    ] {
        let mut board = Fen::parse(fen).unwrap();
        walk(&mut board, 2, &mut |board| {
            let text = Fen::to_string(board);
            let parsed = Fen::parse(&text).unwrap();
            assert_eq!(&parsed, board, "round trip failed for {}", text);
        });
    }
}

#[test]
fn test_make_unmake_is_reversible() {
    let mut board = Fen::parse("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1")
        .unwrap();
    walk(&mut board, 2, &mut |board| {
        for uci in board.legal_moves() {
            let before = board.clone();
            let mut mv = Move::from_uci(board, &uci).unwrap();
            board.apply_move(&mut mv, &LineOracle).unwrap();
            board.undo_move(&mv, &LineOracle).unwrap();
            assert_eq!(*board, before, "{} is not reversible", uci);
        }
    });
}

#[test]
fn test_no_legal_moves_iff_game_over() {
    let mut board = Fen::parse(START_FEN).unwrap();
    walk(&mut board, 2, &mut |board| {
        let side = board.side_to_move();
        let game = Game::from_fen(&Fen::to_string(board)).unwrap();
        let no_moves = board.legal_moves().is_empty();
        assert_eq!(
            no_moves,
            matches!(game.status(), GameStatus::Checkmate | GameStatus::Stalemate)
        );
        assert_eq!(
            game.status() == GameStatus::Checkmate,
            no_moves && board.in_check(side)
        );
    });
}

#[test]
fn test_fools_mate_position() {
    let mut game = Game::new();
    let outcome = game
        .load_position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
        .unwrap();

    assert_eq!(outcome, MoveOutcome::Checkmate);
    assert_eq!(game.status(), GameStatus::Checkmate);
    assert_eq!(game.side_to_move(), Color::White);
    assert!(game.legal_moves().is_empty());
    assert!(game.live_board().legal().is_empty());
}

#[test]
fn test_castling_scenario() {
    let mut game = Game::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
    let dests = game.legal_destinations(sq("e1"));
    assert!(dests.contains(&sq("g1")));
    assert!(dests.contains(&sq("c1")));

    assert!(!game.live_board().get(sq("e1")).unwrap().has_moved);
    assert!(!game.live_board().get(sq("h1")).unwrap().has_moved);

    game.apply_move(sq("e1"), sq("g1")).unwrap();
    let board = game.live_board();
    let king = board.get(sq("g1")).unwrap();
    let rook = board.get(sq("f1")).unwrap();
    assert_eq!(king.kind, PieceKind::King);
    assert_eq!(rook.kind, PieceKind::Rook);
    assert!(king.has_moved);
    assert!(rook.has_moved);
    assert!(board.get(sq("h1")).is_none());
    assert_eq!(game.notation()[0].white.as_deref(), Some("O-O"));
    assert!(game.fen().contains(" kq "));
}

#[test]
fn test_castling_blocked_by_attacks() {
    // f1 受黑象攻击，不能短易位；长易位只要求 d1、c1 安全
    let game = Game::from_fen("r3k2r/8/8/8/8/7b/8/R3K2R w KQkq - 0 1").unwrap();
    let dests = game.legal_destinations(sq("e1"));
    assert!(!dests.contains(&sq("g1")));
    assert!(dests.contains(&sq("c1")));

    // 被将军时不能易位
    let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    assert!(game.legal_destinations(sq("e1")).contains(&sq("g1")));
    let game = Game::from_fen("r3k2r/8/8/b7/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    assert!(game.is_checked());
    let dests = game.legal_destinations(sq("e1"));
    assert!(!dests.contains(&sq("g1")));
    assert!(!dests.contains(&sq("c1")));

    // 车与王之间有子
    let game = Game::from_fen("r3k2r/8/8/8/8/8/8/Rn2K2R w KQkq - 0 1").unwrap();
    assert!(!game.legal_destinations(sq("e1")).contains(&sq("c1")));

    // b1 受攻击不影响长易位
    let game = Game::from_fen("1r2k2r/8/8/8/8/8/8/R3K2R w KQk - 0 1").unwrap();
    assert!(game.legal_destinations(sq("e1")).contains(&sq("c1")));
}

#[test]
fn test_en_passant_window() {
    let mut game = Game::from_fen("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1").unwrap();
    game.apply_move(sq("d7"), sq("d5")).unwrap();
    assert_eq!(game.live_board().en_passant(), Some(sq("d6")));
    assert!(game.legal_destinations(sq("e5")).contains(&sq("d6")));

    // 白方走了别的棋，过路兵机会消失
    game.apply_move(sq("e1"), sq("f1")).unwrap();
    assert_eq!(game.live_board().en_passant(), None);
    game.apply_move(sq("e8"), sq("f8")).unwrap();
    assert!(!game.legal_destinations(sq("e5")).contains(&sq("d6")));
    assert!(game.apply_move(sq("e5"), sq("d6")).is_err());
}

#[test]
fn test_pinned_piece_stays_on_line() {
    // e2 白象被 e8 黑车牵制在 e 线上，只有沿线的走法（象没有）
    let game = Game::from_fen("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
    assert!(game.legal_destinations(sq("e2")).is_empty());

    // 斜线牵制：象可以沿牵制线走，包括吃掉牵制者
    let game = Game::from_fen("6k1/8/8/b7/8/2B5/8/4K3 w - - 0 1").unwrap();
    let mut dests = game.legal_destinations(sq("c3"));
    dests.sort();
    let mut expected = vec![sq("a5"), sq("b4"), sq("d2")];
    expected.sort();
    assert_eq!(dests, expected);
}

#[test]
fn test_promotion_choice() {
    let mut game = Game::from_fen("8/P6k/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    game.apply_move_with_promotion(sq("a7"), sq("a8"), PieceKind::Rook)
        .unwrap();
    assert_eq!(game.live_board().get(sq("a8")).unwrap().kind, PieceKind::Rook);
    assert_eq!(game.notation()[0].white.as_deref(), Some("a8=R"));

    game.undo_last_move().unwrap();
    assert_eq!(game.live_board().get(sq("a7")).unwrap().kind, PieceKind::Pawn);

    game.apply_move(sq("a7"), sq("a8")).unwrap();
    assert_eq!(game.live_board().get(sq("a8")).unwrap().kind, PieceKind::Queen);
}
