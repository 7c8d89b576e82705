//! Final standings snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::GameType;
use crate::game::entities::PlayerId;

/// Per-player result row.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlayerResult {
    pub player_id: PlayerId,
    pub player_name: String,
    pub is_bot: bool,
}

/// Immutable snapshot of a finished game. Created once at game end; the
/// `payload` carries game-specific standings (final chips, winner name,
/// rounds played) as free-form JSON.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GameResult {
    pub game_type: GameType,
    pub timestamp: DateTime<Utc>,
    pub duration_ticks: u64,
    pub player_results: Vec<PlayerResult>,
    pub payload: serde_json::Value,
}
