//! Engine-wide constants.

/// Tick rate assumed by every timer and wait counter in the engine.
///
/// The host drives games by calling `on_tick` at this rate; turn timers
/// convert seconds to ticks with it.
pub const TICKS_PER_SECOND: u32 = 10;

/// Hard cap on seats at any table, across all game types.
pub const MAX_TABLE_PLAYERS: usize = 10;
