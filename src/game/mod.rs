//! Core engine: entities, evaluators, turn machinery, the action registry,
//! and the contract every game type implements.
//!
//! All state mutation happens synchronously inside either an incoming
//! `execute_action` or the periodic `on_tick`; the host serializes calls
//! per game instance. Nothing here blocks: "waiting for a player" is state,
//! not a suspended call.

use std::collections::VecDeque;
use std::fmt;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod actions;
pub mod constants;
pub mod entities;
pub mod scoring;
pub mod turns;

use crate::table::messages::TableMessage;
use crate::table::result::GameResult;
use actions::ActionView;
use entities::PlayerId;

/// Which game a table is running.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Blackjack,
    TwentyOne,
    Party,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Blackjack => "blackjack",
            Self::TwentyOne => "twentyone",
            Self::Party => "party",
        };
        write!(f, "{repr}")
    }
}

/// Session lifecycle of a game instance.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Lobby,
    Playing,
    Finished,
}

/// Pre-start configuration violations. Starting is refused until the list
/// from `prestart_validate` is empty.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ConfigError {
    #[error("base bet exceeds starting chips")]
    BetAboveStartingChips,
    #[error("table minimum bet exceeds table maximum")]
    TableLimitsInvalid,
    #[error("base bet below table minimum")]
    BetBelowTableMin,
    #[error("base bet above table maximum")]
    BetAboveTableMax,
    #[error("need at least {required} players")]
    NotEnoughPlayers { required: usize },
    #[error("at most {max} players allowed")]
    TooManyPlayers { max: usize },
    #[error("no card packs selected")]
    NoCardPacks,
    #[error("selected packs have no prompt cards")]
    NoPromptCards,
    #[error("selected packs have too few answer cards")]
    NotEnoughAnswerCards,
}

/// A bot's chosen action: an action id plus the sub-choice value for
/// input-carrying actions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BotChoice {
    pub action: String,
    pub input: Option<String>,
}

impl BotChoice {
    #[must_use]
    pub fn plain(action: &str) -> Self {
        Self {
            action: action.to_string(),
            input: None,
        }
    }

    #[must_use]
    pub fn with_input(action: &str, input: String) -> Self {
        Self {
            action: action.to_string(),
            input: Some(input),
        }
    }
}

/// The per-game state machine contract.
///
/// An external dispatcher calls `execute_action` for the current game
/// instance; the action registry validates legality, the handler mutates
/// state and emits messages, and the turn machinery advances. A periodic
/// `on_tick` drives timers, deferred round-start delays, and autonomous bot
/// execution.
#[enum_dispatch]
pub trait GameLogic {
    fn game_type(&self) -> GameType;

    fn status(&self) -> GameStatus;

    /// Game-specific phase, exposed as a stable string.
    fn phase_name(&self) -> &'static str;

    /// Configuration violations that must be empty before `on_start`.
    fn prestart_validate(&self) -> Vec<ConfigError>;

    fn on_start(&mut self);

    fn on_tick(&mut self);

    /// Single entry point for all player intents, human and bot alike.
    /// Illegal, unknown, and out-of-turn actions are absorbed here; they
    /// are expected network races, never hard errors.
    fn execute_action(&mut self, player: &PlayerId, action_id: &str, input: Option<&str>);

    /// The menu for one player: visible actions with label keys and
    /// enablement tokens.
    fn visible_actions(&self, player: &PlayerId) -> Vec<ActionView>;

    /// Pure-ish mapping from observable state to the action this player's
    /// bot would take right now, if any.
    fn bot_think(&mut self, player: &PlayerId) -> Option<BotChoice>;

    /// Pending outbound messages, in emission order.
    fn drain_messages(&mut self) -> VecDeque<TableMessage>;

    fn build_game_result(&self) -> GameResult;

    /// Re-arms transient scheduling state (turn timer, bot jolts) after a
    /// snapshot restore; persisted fields deliberately exclude these.
    fn rebuild_runtime_state(&mut self);

    /// Cross-field invariants a restored snapshot must satisfy.
    fn snapshot_integrity(&self) -> Result<(), &'static str>;
}
