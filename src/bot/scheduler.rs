//! Bot "jolt" scheduling.
//!
//! When it becomes a bot's turn, its decision is deferred by a randomized
//! tick delay rather than executing on the same tick, so bot turns read
//! like a player thinking. Pending bots live in an explicit countdown queue
//! polled once per tick; a ready bot's chosen action then runs through the
//! exact same `execute_action` path a human would use.

use crate::game::entities::PlayerId;

#[derive(Clone, Debug)]
struct BotTask {
    player: PlayerId,
    remaining_ticks: u32,
}

/// Countdown queue of deferred bot decisions. Transient scheduling state;
/// never persisted. Restored games re-jolt via `rebuild_runtime_state`.
#[derive(Debug, Default)]
pub struct BotScheduler {
    pending: Vec<BotTask>,
}

impl BotScheduler {
    /// Schedules `player` to act after `ticks`. Re-jolting replaces any
    /// pending entry for the same player.
    pub fn jolt(&mut self, player: PlayerId, ticks: u32) {
        self.cancel(&player);
        self.pending.push(BotTask {
            player,
            remaining_ticks: ticks.max(1),
        });
    }

    pub fn cancel(&mut self, player: &PlayerId) {
        self.pending.retain(|task| task.player != *player);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Decrements every pending entry and returns the players whose delay
    /// elapsed this tick, in jolt order.
    pub fn on_tick(&mut self) -> Vec<PlayerId> {
        let mut ready = Vec::new();
        self.pending.retain_mut(|task| {
            task.remaining_ticks -= 1;
            if task.remaining_ticks == 0 {
                ready.push(task.player.clone());
                false
            } else {
                true
            }
        });
        ready
    }

    #[must_use]
    pub fn is_pending(&self, player: &PlayerId) -> bool {
        self.pending.iter().any(|task| task.player == *player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jolt_fires_after_delay() {
        let mut bots = BotScheduler::default();
        bots.jolt(PlayerId::new("b1"), 3);

        assert!(bots.on_tick().is_empty());
        assert!(bots.on_tick().is_empty());
        let ready = bots.on_tick();
        assert_eq!(ready, vec![PlayerId::new("b1")]);
        assert!(!bots.is_pending(&PlayerId::new("b1")));
    }

    #[test]
    fn test_rejolt_replaces_pending_entry() {
        let mut bots = BotScheduler::default();
        bots.jolt(PlayerId::new("b1"), 1);
        bots.jolt(PlayerId::new("b1"), 3);

        assert!(bots.on_tick().is_empty());
        assert!(bots.on_tick().is_empty());
        assert_eq!(bots.on_tick(), vec![PlayerId::new("b1")]);
    }

    #[test]
    fn test_zero_tick_jolt_still_defers_one_tick() {
        let mut bots = BotScheduler::default();
        bots.jolt(PlayerId::new("b1"), 0);
        assert_eq!(bots.on_tick(), vec![PlayerId::new("b1")]);
    }

    #[test]
    fn test_cancel_drops_entry() {
        let mut bots = BotScheduler::default();
        bots.jolt(PlayerId::new("b1"), 2);
        bots.cancel(&PlayerId::new("b1"));
        assert!(bots.on_tick().is_empty());
        assert!(bots.on_tick().is_empty());
    }
}
