//! Concrete game instances and the table-level dispatch enum.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

pub mod blackjack;
pub mod party;
pub mod twentyone;

use std::collections::VecDeque;

use crate::game::actions::ActionView;
use crate::game::entities::PlayerId;
use crate::game::{BotChoice, ConfigError, GameLogic, GameStatus, GameType};
use crate::table::messages::TableMessage;
use crate::table::result::GameResult;
use crate::table::snapshot::SnapshotError;
use blackjack::BlackjackGame;
use party::PartyGame;
use twentyone::TwentyOneGame;

/// Any hosted game, dispatched through [`GameLogic`] without dynamic
/// allocation. The serde tag doubles as the persisted game-type marker, so
/// one snapshot value identifies and restores any game.
#[enum_dispatch(GameLogic)]
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "game_type", rename_all = "lowercase")]
pub enum TableGame {
    Blackjack(BlackjackGame),
    #[serde(rename = "twentyone")]
    TwentyOne(TwentyOneGame),
    Party(PartyGame),
}

impl TableGame {
    /// Serializes the full observable game state. Call only while the
    /// instance is quiescent (no action or tick in flight); transient
    /// scheduling state is intentionally excluded.
    pub fn to_snapshot(&self) -> Result<serde_json::Value, SnapshotError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Reconstructs an instance from a snapshot, failing loudly on
    /// malformed or inconsistent data. The caller must follow up with
    /// [`GameLogic::rebuild_runtime_state`] before resuming ticks.
    pub fn from_snapshot(value: serde_json::Value) -> Result<Self, SnapshotError> {
        let game: Self = serde_json::from_value(value)?;
        game.snapshot_integrity()
            .map_err(SnapshotError::Inconsistent)?;
        Ok(game)
    }
}
