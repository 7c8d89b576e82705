//! Bot runtime glue shared by every game type. Per-game decision logic
//! lives next to each game (`games::*`); this module owns the scheduling
//! that makes bots act on ticks instead of instantly.

pub mod scheduler;

pub use scheduler::BotScheduler;
