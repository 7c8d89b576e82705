//! Snapshot persistence: full-state round trips, corrupt-data failures,
//! and mid-game save/reload cycles.

use cardroom::GameLogic;
use cardroom::games::TableGame;
use cardroom::games::blackjack::{
    BlackjackGame, BlackjackOptions, BlackjackPayout, BlackjackPhase, DoubleDownRule, HandSlot,
    RulesProfile, SplitRule,
};
use cardroom::{Card, Deck, GameStatus, PlayerId, SnapshotError, Suit};

fn card(id: u32, rank: u8) -> Card {
    Card::new(id, rank, Suit::Heart)
}

fn mid_hand_game() -> BlackjackGame {
    let mut options = BlackjackOptions {
        starting_chips: 900,
        base_bet: 25,
        table_min_bet: 10,
        table_max_bet: 200,
        deck_count: 2,
        players_cards_face_up: false,
        turn_timer_seconds: 30,
        ..BlackjackOptions::default()
    };
    options.apply_profile(RulesProfile::Friendly);
    options.blackjack_payout = BlackjackPayout::SixToFive;
    options.double_down_rule = DoubleDownRule::TenToEleven;

    let mut game = BlackjackGame::with_seed(options, 17);
    game.add_player("host", "Host", false);
    game.add_player("guest", "Guest", false);
    game.status = GameStatus::Playing;
    game.phase = BlackjackPhase::Insurance;
    game.hand_number = 4;
    game.deck = Deck::from_cards(vec![card(30, 5), card(31, 9), card(32, 12)]);
    game.dealer_hand = vec![card(20, 1), card(21, 13)];
    game.turn_order
        .set(vec![PlayerId::new("host"), PlayerId::new("guest")], true);

    let host = &mut game.players[0];
    host.hand = vec![card(1, 1), card(2, 13)];
    host.has_blackjack = true;
    host.bet = 25;
    host.chips = 875;
    host.insurance_bet = 12;
    host.insurance_decision_done = true;
    host.took_even_money = true;
    host.split_hand = vec![card(3, 1), card(4, 10)];
    host.split_bet = 25;
    host.split_has_blackjack = true;
    host.active_hand = HandSlot::Split;
    host.main_from_split_aces = true;
    host.split_from_split_aces = true;
    game
}

#[test]
fn test_round_trip_preserves_observable_state() {
    let game = TableGame::Blackjack(mid_hand_game());
    let snapshot = game.to_snapshot().unwrap();
    let mut restored = TableGame::from_snapshot(snapshot).unwrap();
    restored.rebuild_runtime_state();

    let TableGame::Blackjack(restored) = restored else {
        panic!("snapshot restored to the wrong game type");
    };

    assert_eq!(restored.status, GameStatus::Playing);
    assert_eq!(restored.phase, BlackjackPhase::Insurance);
    assert_eq!(restored.hand_number, 4);
    assert_eq!(restored.options.table_min_bet, 10);
    assert_eq!(restored.options.table_max_bet, 200);
    assert_eq!(restored.options.blackjack_payout, BlackjackPayout::SixToFive);
    assert_eq!(
        restored.options.double_down_rule,
        DoubleDownRule::TenToEleven
    );
    assert_eq!(restored.options.split_rule, SplitRule::SameValue);
    assert!(restored.options.split_aces_count_as_blackjack);
    assert!(!restored.options.players_cards_face_up);

    let host = &restored.players[0];
    assert_eq!(host.chips, 875);
    assert_eq!(host.bet, 25);
    assert_eq!(host.insurance_bet, 12);
    assert!(host.took_even_money);
    assert!(host.main_from_split_aces);
    assert!(host.split_from_split_aces);
    assert!(host.split_has_blackjack);
    assert_eq!(host.active_hand, HandSlot::Split);
    assert_eq!(host.hand, vec![card(1, 1), card(2, 13)]);

    // Deck composition survives in draw order.
    let original_deck: Vec<u32> = mid_hand_game().deck.iter().map(|c| c.id).collect();
    let restored_deck: Vec<u32> = restored.deck.iter().map(|c| c.id).collect();
    assert_eq!(original_deck, restored_deck);

    assert_eq!(
        restored.turn_order.current(),
        Some(&PlayerId::new("host"))
    );
}

#[test]
fn test_snapshot_twice_is_idempotent() {
    let game = TableGame::Blackjack(mid_hand_game());
    let first = game.to_snapshot().unwrap();
    let restored = TableGame::from_snapshot(first.clone()).unwrap();
    let second = restored.to_snapshot().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_malformed_snapshot_fails_loudly() {
    let result = TableGame::from_snapshot(serde_json::json!({"game_type": "blackjack"}));
    assert!(matches!(result, Err(SnapshotError::Malformed(_))));

    let result = TableGame::from_snapshot(serde_json::json!({"game_type": "roulette"}));
    assert!(matches!(result, Err(SnapshotError::Malformed(_))));
}

#[test]
fn test_inconsistent_snapshot_is_rejected() {
    let mut game = mid_hand_game();
    game.turn_order
        .set(vec![PlayerId::new("nobody")], true);
    let snapshot = TableGame::Blackjack(game).to_snapshot().unwrap();
    let result = TableGame::from_snapshot(snapshot);
    assert!(matches!(result, Err(SnapshotError::Inconsistent(_))));
}

#[test]
fn test_bot_game_completes_across_save_reload_cycles() {
    let mut game = TableGame::Blackjack({
        let mut game = BlackjackGame::with_seed(
            BlackjackOptions {
                starting_chips: 60,
                base_bet: 10,
                table_min_bet: 5,
                table_max_bet: 20,
                deck_count: 1,
                turn_timer_seconds: 0,
                ..BlackjackOptions::default()
            },
            67890,
        );
        for index in 0..3 {
            let id = format!("bot{index}");
            let name = format!("Bot{index}");
            game.add_player(&id, &name, true);
        }
        game.on_start();
        game
    });

    let mut ticks = 0u64;
    while game.status() != GameStatus::Finished {
        ticks += 1;
        assert!(ticks < 250_000, "bot game did not terminate across reloads");

        if ticks % 75 == 0 {
            let snapshot = game.to_snapshot().unwrap();
            game = TableGame::from_snapshot(snapshot).unwrap();
            game.rebuild_runtime_state();
        }
        game.on_tick();
    }
}
