//! # Cardroom
//!
//! A rules/state engine for turn-based multiplayer card games, designed to
//! be embedded in a larger chat-server host. Three games share one
//! contract: Blackjack (the reference instance), Survival 21 (a two-player
//! 21 variant with modifier cards), and a party judging game.
//!
//! ## Architecture
//!
//! Every game is a deterministic state machine behind the [`game::GameLogic`]
//! trait, dispatched over the [`games::TableGame`] enum with `enum_dispatch`:
//!
//! - an external dispatcher feeds player intents through `execute_action`;
//! - a declarative action registry checks legality and visibility, with one
//!   call path for humans, bots, and timer fallbacks;
//! - a periodic `on_tick` drives turn timers, between-round waits, and
//!   deferred bot decisions ("jolts");
//! - handlers emit localization-key messages to an outbox the host drains
//!   and renders per recipient locale.
//!
//! All mutation happens synchronously inside `execute_action` or `on_tick`;
//! the host serializes calls per instance. Games snapshot to JSON values
//! and restore with `rebuild_runtime_state` re-arming transient timers and
//! bot schedules.
//!
//! ## Core modules
//!
//! - [`game`]: entities, hand evaluators, turn machinery, action registry
//! - [`games`]: the three game instances and the dispatch enum
//! - [`bot`]: tick-driven bot scheduling
//! - [`table`]: host-facing messages, results, and snapshot errors
//!
//! ## Example
//!
//! ```
//! use cardroom::GameLogic;
//! use cardroom::games::blackjack::{BlackjackGame, BlackjackOptions};
//!
//! let mut game = BlackjackGame::new(BlackjackOptions::default());
//! game.add_player("p1", "Ada", false);
//! assert!(game.prestart_validate().is_empty());
//! game.on_start();
//! ```

pub mod bot;
pub mod game;
pub mod games;
pub mod table;

pub use game::{
    BotChoice, ConfigError, GameLogic, GameStatus, GameType,
    actions::{ActionView, Visibility},
    entities::{Card, Chips, Deck, DeckFactory, PlayerId, PlayerIdentity, Suit},
    scoring,
};
pub use games::TableGame;
pub use table::{ArgValue, GameResult, SnapshotError, TableMessage};
