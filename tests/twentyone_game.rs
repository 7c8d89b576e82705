//! End-to-end Survival 21 scenarios.

use cardroom::GameLogic;
use cardroom::games::TableGame;
use cardroom::games::twentyone::{TwentyOneGame, TwentyOneOptions};
use cardroom::{ConfigError, GameStatus};

const MAX_TICKS: u64 = 300_000;

fn two_bot_game(seed: u64) -> TwentyOneGame {
    let mut game = TwentyOneGame::with_seed(TwentyOneOptions::default(), seed);
    game.add_player("a", "Ada", true);
    game.add_player("b", "Brin", true);
    game
}

#[test]
fn test_seeded_bot_duel_terminates() {
    let mut game = two_bot_game(4242);
    assert!(game.prestart_validate().is_empty());
    game.on_start();

    let mut ticks = 0u64;
    while game.status != GameStatus::Finished {
        ticks += 1;
        assert!(ticks < MAX_TICKS, "duel did not terminate");
        game.on_tick();
    }

    // Exactly one player is out of HP at the end.
    let busted = game.players.iter().filter(|p| p.hp == 0).count();
    assert_eq!(busted, 1);

    let result = game.build_game_result();
    let rounds = result.payload.get("rounds_played").unwrap().as_u64().unwrap();
    assert!(rounds >= 1);
    let winner_hp = result.payload.get("winner_hp").unwrap().as_u64().unwrap();
    assert!(winner_hp > 0);
}

#[test]
fn test_round_starter_rotates() {
    let mut game = two_bot_game(7);
    game.on_start();
    let first_starter = game.turn_order.current().cloned().unwrap();

    // Run until at least the second round begins.
    let mut ticks = 0u64;
    while game.round_number < 2 && game.status == GameStatus::Playing {
        ticks += 1;
        assert!(ticks < MAX_TICKS);
        game.on_tick();
    }
    if game.status == GameStatus::Playing {
        let second_starter = game.turn_order.current().cloned().unwrap();
        assert_ne!(first_starter, second_starter);
    }
}

#[test]
fn test_prestart_rejects_wrong_player_count() {
    let mut game = TwentyOneGame::new(TwentyOneOptions::default());
    game.add_player("solo", "Solo", false);
    assert!(
        game.prestart_validate()
            .contains(&ConfigError::NotEnoughPlayers { required: 2 })
    );
}

#[test]
fn test_twentyone_snapshot_round_trip() {
    let mut game = two_bot_game(99);
    game.on_start();
    for _ in 0..50 {
        game.on_tick();
    }
    let hp_before: Vec<u32> = game.players.iter().map(|p| p.hp).collect();
    let round_before = game.round_number;
    let deck_before: Vec<u32> = game.deck.iter().map(|c| c.id).collect();

    let snapshot = TableGame::TwentyOne(game).to_snapshot().unwrap();
    let mut restored = TableGame::from_snapshot(snapshot).unwrap();
    restored.rebuild_runtime_state();

    let TableGame::TwentyOne(restored) = restored else {
        panic!("snapshot restored to the wrong game type");
    };
    let hp_after: Vec<u32> = restored.players.iter().map(|p| p.hp).collect();
    let deck_after: Vec<u32> = restored.deck.iter().map(|c| c.id).collect();
    assert_eq!(hp_before, hp_after);
    assert_eq!(round_before, restored.round_number);
    assert_eq!(deck_before, deck_after);
}
