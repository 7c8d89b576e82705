//! Host-facing surfaces: the message outbox, final results, and snapshot
//! errors. Everything here is consumed by the session that embeds a game,
//! not by the games themselves.

pub mod messages;
pub mod result;
pub mod snapshot;

pub use messages::{ArgValue, MessageArgs, Outbox, TableMessage};
pub use result::{GameResult, PlayerResult};
pub use snapshot::SnapshotError;
