//! tac-controls
//!
//! Trade admission domain model.
//!
//! Goals:
//! - Override severities and their join (`combine`)
//! - Position limit clamping with most-conservative composition
//! - Rolling-window trade limit accounting
//! - Read-time stale instrument / strategy filtering
//!
//! Deterministic, pure logic. No IO, no wall clock, no broker calls: callers
//! pass `now` in wherever a trade-limit window is involved.

mod error;
mod instrument;
mod order;
mod overrides;
mod position_limits;
mod stale;
mod trade_limits;

pub use error::{ControlError, ControlResult};
pub use instrument::{InstrumentStrategy, ALL_STRATEGIES};
pub use order::{most_conservative_order, Order};
pub use overrides::{Override, OverrideKey, OverrideWithReason, OVERRIDE_REASON_IN_DATABASE};
pub use position_limits::{
    PositionLimitAndPosition, PositionLimitForInstrument, PositionLimitForStrategyInstrument,
    PositionLimitScope,
};
pub use stale::{StaleFilter, StaleKeyed};
pub use trade_limits::{TradeLimit, TradeLimitScope};
