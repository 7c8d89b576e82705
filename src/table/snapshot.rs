//! Snapshot persistence errors.
//!
//! Games serialize to opaque JSON values for persistence and reconnect.
//! Unlike illegal actions (absorbed) and deck depletion (`None`), a snapshot
//! that cannot be reconstructed into a valid instance fails loudly at load
//! time rather than silently producing a broken game.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(&'static str),
}
