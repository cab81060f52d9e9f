//! Durable session history.
//!
//! History is the restart-surviving side of the engine. It receives one-way
//! snapshots from the live registry on lifecycle transitions and is never
//! used to reconstruct live records.

mod log;
mod model;

pub use log::{DEFAULT_HISTORY_LIMIT, HistoryLog};
pub use model::{
    FULL_DATA_VERSION, HistoryEntry, SUMMARY_DATA_VERSION, derive_reasoning_summary,
};
