//! Turn rotation and the per-turn countdown timer.

use serde::{Deserialize, Serialize};

use super::constants::TICKS_PER_SECOND;
use super::entities::PlayerId;

/// The active rotation for a phase: an ordered list of player ids and the
/// current index. The machine only advances with wraparound; eligibility
/// re-checks and skip loops belong to the caller.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TurnOrder {
    ids: Vec<PlayerId>,
    index: usize,
}

impl TurnOrder {
    /// Establishes the rotation for a phase. With `reset_index` the rotation
    /// restarts from its first entry; otherwise the current index is kept
    /// (clamped into range).
    pub fn set(&mut self, ids: Vec<PlayerId>, reset_index: bool) {
        self.ids = ids;
        if reset_index || self.index >= self.ids.len() {
            self.index = 0;
        }
    }

    /// Moves to the next entry modulo length.
    pub fn advance(&mut self) {
        if !self.ids.is_empty() {
            self.index = (self.index + 1) % self.ids.len();
        }
    }

    /// Forces the rotation to start at `index` (clamped).
    pub fn set_index(&mut self, index: usize) {
        if self.ids.is_empty() {
            self.index = 0;
        } else {
            self.index = index % self.ids.len();
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&PlayerId> {
        self.ids.get(self.index)
    }

    #[must_use]
    pub fn ids(&self) -> &[PlayerId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.index = 0;
    }
}

/// Tick-driven turn timer. Zero seconds means disabled. The timer is
/// transient scheduling state and is rebuilt after a snapshot restore.
#[derive(Clone, Debug, Default)]
pub struct TurnTimer {
    remaining_ticks: u32,
}

impl TurnTimer {
    /// Starts a countdown of `seconds`; 0 disables the timer.
    pub fn start(&mut self, seconds: u32) {
        self.remaining_ticks = seconds * TICKS_PER_SECOND;
    }

    pub fn clear(&mut self) {
        self.remaining_ticks = 0;
    }

    /// Decrements once; returns true exactly on the tick the timer expires.
    pub fn tick(&mut self) -> bool {
        if self.remaining_ticks == 0 {
            return false;
        }
        self.remaining_ticks -= 1;
        self.remaining_ticks == 0
    }

    #[must_use]
    pub fn seconds_remaining(&self) -> u32 {
        self.remaining_ticks.div_ceil(TICKS_PER_SECOND)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.remaining_ticks > 0
    }
}
