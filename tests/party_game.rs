//! End-to-end party game scenarios.

use cardroom::GameLogic;
use cardroom::games::party::{
    CardPack, JudgeSelection, PackRegistry, PartyGame, PartyOptions,
};
use cardroom::{ConfigError, GameStatus};

const MAX_TICKS: u64 = 300_000;

fn test_registry() -> PackRegistry {
    let prompts: Vec<String> = (0..24)
        .map(|i| {
            if i % 3 == 0 {
                format!("Prompt {i}: _ plus _.")
            } else {
                format!("Prompt {i}: why _?")
            }
        })
        .collect();
    let answers: Vec<String> = (0..60).map(|i| format!("Answer {i}.")).collect();
    PackRegistry::new(vec![CardPack {
        name: "base".to_string(),
        prompts,
        answers,
    }])
}

fn three_bot_game(seed: u64) -> PartyGame {
    let mut game = PartyGame::with_seed(
        PartyOptions {
            winning_score: 3,
            card_packs: vec!["base".to_string()],
            ..PartyOptions::default()
        },
        test_registry(),
        seed,
    );
    game.add_player("a", "Ada", true);
    game.add_player("b", "Brin", true);
    game.add_player("c", "Cy", true);
    game
}

#[test]
fn test_seeded_bot_party_terminates_with_winner() {
    let mut game = three_bot_game(2024);
    assert!(game.prestart_validate().is_empty());
    game.on_start();

    let mut ticks = 0u64;
    while game.status != GameStatus::Finished {
        ticks += 1;
        assert!(ticks < MAX_TICKS, "party game did not terminate");
        game.on_tick();
    }

    let result = game.build_game_result();
    let winner_score = result
        .payload
        .get("winner_score")
        .unwrap()
        .as_u64()
        .unwrap();
    assert_eq!(winner_score, 3);
    let rounds = result.payload.get("rounds_played").unwrap().as_u64().unwrap();
    assert!(rounds >= 3);
}

#[test]
fn test_judge_rotates_between_rounds() {
    let mut game = three_bot_game(5);
    game.on_start();
    assert_eq!(game.judge_indices, vec![0]);

    let mut ticks = 0u64;
    while game.round < 2 && game.status == GameStatus::Playing {
        ticks += 1;
        assert!(ticks < MAX_TICKS);
        game.on_tick();
    }
    if game.status == GameStatus::Playing {
        assert_eq!(game.judge_indices, vec![1]);
    }
}

#[test]
fn test_most_recent_winner_judges_next() {
    let mut game = PartyGame::with_seed(
        PartyOptions {
            winning_score: 5,
            judge_selection: JudgeSelection::MostRecentWinner,
            card_packs: vec!["base".to_string()],
            ..PartyOptions::default()
        },
        test_registry(),
        8,
    );
    game.add_player("a", "Ada", true);
    game.add_player("b", "Brin", true);
    game.add_player("c", "Cy", true);
    game.on_start();

    let mut ticks = 0u64;
    while game.round < 2 && game.status == GameStatus::Playing {
        ticks += 1;
        assert!(ticks < MAX_TICKS);
        game.on_tick();
    }
    if game.status == GameStatus::Playing {
        let winner_pos = game.last_winner_index.unwrap();
        assert_eq!(game.judge_indices, vec![winner_pos]);
    }
}

#[test]
fn test_prestart_requires_packs_and_players() {
    let mut game = PartyGame::new(PartyOptions::default(), PackRegistry::default());
    game.add_player("a", "Ada", false);
    let errors = game.prestart_validate();
    assert!(errors.contains(&ConfigError::NotEnoughPlayers { required: 3 }));
    assert!(errors.contains(&ConfigError::NoCardPacks));
}

#[test]
fn test_submissions_are_shuffled_then_revealed() {
    let mut game = three_bot_game(64);
    game.on_start();

    // Run until the first judging phase to observe the shuffled order.
    let mut ticks = 0u64;
    while game.phase.as_str() != "judging" && game.status == GameStatus::Playing {
        ticks += 1;
        assert!(ticks < MAX_TICKS);
        game.on_tick();
    }
    if game.status == GameStatus::Playing {
        // Two non-judges submitted; presentation order covers both.
        assert_eq!(game.submissions.len(), 2);
        let mut order = game.submission_order.clone();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1]);
    }
}
