//! End-to-end blackjack scenarios driven through the public API.

use cardroom::GameLogic;
use cardroom::games::blackjack::{BlackjackGame, BlackjackOptions};
use cardroom::{GameStatus, PlayerId, TableMessage};

const MAX_TICKS: u64 = 200_000;

fn three_bot_game(seed: u64) -> BlackjackGame {
    let mut game = BlackjackGame::with_seed(
        BlackjackOptions {
            starting_chips: 40,
            base_bet: 10,
            deck_count: 1,
            turn_timer_seconds: 0,
            ..BlackjackOptions::default()
        },
        seed,
    );
    for index in 0..3 {
        let id = format!("bot{index}");
        let name = format!("Bot{index}");
        game.add_player(&id, &name, true);
    }
    game
}

#[test]
fn test_seeded_bot_game_terminates() {
    let mut game = three_bot_game(12345);
    assert!(game.prestart_validate().is_empty());
    game.on_start();

    let mut ticks = 0u64;
    while game.status != GameStatus::Finished {
        ticks += 1;
        assert!(ticks < MAX_TICKS, "bot game did not terminate");
        game.on_tick();
    }

    // At most one stack remains funded in multiplayer.
    let funded = game.players.iter().filter(|p| p.chips > 0).count();
    assert!(funded <= 1);

    let result = game.build_game_result();
    assert_eq!(result.player_results.len(), 3);
    let final_chips = result.payload.get("final_chips").unwrap();
    assert_eq!(final_chips.as_object().unwrap().len(), 3);
}

#[test]
fn test_turn_order_integrity_holds_throughout() {
    let mut game = three_bot_game(777);
    game.on_start();

    let mut ticks = 0u64;
    while game.status != GameStatus::Finished && ticks < MAX_TICKS {
        ticks += 1;
        game.on_tick();

        if game.status == GameStatus::Playing
            && matches!(game.phase_name(), "players" | "insurance")
            && let Some(current) = game.turn_order.current().cloned()
        {
            // The current turn-holder is always a seated player with at
            // least one enabled action.
            let views = game.visible_actions(&current);
            assert!(
                views.iter().any(|v| v.denied.is_none()),
                "current player has no enabled action at tick {ticks}"
            );
        }
    }
    assert_eq!(game.status, GameStatus::Finished);
}

#[test]
fn test_finished_message_is_emitted_once() {
    let mut game = three_bot_game(999);
    game.on_start();

    let mut finished_messages = 0;
    let mut ticks = 0u64;
    while game.status != GameStatus::Finished && ticks < MAX_TICKS {
        ticks += 1;
        game.on_tick();
        for message in game.drain_messages() {
            if matches!(message, TableMessage::Finished) {
                finished_messages += 1;
            }
        }
    }
    for message in game.drain_messages() {
        if matches!(message, TableMessage::Finished) {
            finished_messages += 1;
        }
    }
    assert_eq!(finished_messages, 1);
}

#[test]
fn test_spectators_cannot_act() {
    let mut game = three_bot_game(31);
    game.add_player("watcher", "Watcher", false);
    game.players[3].seat.is_spectator = true;
    game.on_start();

    let before: Vec<usize> = game.players.iter().map(|p| p.hand.len()).collect();
    game.execute_action(&PlayerId::new("watcher"), "hit", None);
    let after: Vec<usize> = game.players.iter().map(|p| p.hand.len()).collect();

    assert_eq!(before, after);
    assert!(game.visible_actions(&PlayerId::new("watcher")).is_empty());
}

#[test]
fn test_turn_timer_substitutes_fallback_action() {
    let mut game = BlackjackGame::with_seed(
        BlackjackOptions {
            starting_chips: 100,
            base_bet: 10,
            turn_timer_seconds: 1,
            ..BlackjackOptions::default()
        },
        61,
    );
    game.add_player("human", "Human", false);
    game.add_player("other", "Other", false);
    game.on_start();

    // Never act; the timer must eventually resolve every turn and reach
    // settlement on its own.
    for _ in 0..2_000 {
        if game.phase_name() == "settle" || game.status == GameStatus::Finished {
            return;
        }
        game.on_tick();
    }
    panic!("turn timer never resolved the hand");
}
