//! tac-store
//!
//! Narrow storage interfaces consumed by the control services, plus simple
//! concrete implementations:
//!
//! - [`StateStore`]: every control table in memory, optionally mirrored to a
//!   pretty JSON snapshot rewritten after each mutation.
//! - [`PositionBook`]: in-memory signed positions per instrument/strategy.
//! - [`CsvOptimalPositionData`]: optimal-position series as CSV files.
//!
//! All trait methods take `&self`; implementations synchronize internally so
//! a store can be shared behind an `Arc` by every service. Multi-step updates
//! either go through the store's atomic read-modify-write methods or hold the
//! store's [`KeyedLocks`] slot for the key.

mod keyed_locks;
mod optimal_positions;
mod positions;
mod state;
mod traits;

pub use keyed_locks::KeyedLocks;
pub use optimal_positions::{CsvOptimalPositionData, LabeledSeries, SeriesRow, DATE_INDEX_NAME};
pub use positions::{PositionBook, PositionEntry};
pub use state::{
    ControlState, OverrideEntry, StateStore, TemporaryOverrideEntry, STATE_SNAPSHOT_VERSION,
};
pub use traits::{
    KeyGuards, LockStore, OverrideStore, PositionLimitStore, PositionReader, TemporaryStore, TradeLimitStore,
};
