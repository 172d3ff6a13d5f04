//! tac-admission
//!
//! Control services that turn a proposed order into the most conservative
//! order every independently maintained constraint allows.
//!
//! Goals:
//! - Effective override from persisted and config-declared overrides
//! - Temporary overrides / temporary closes with exactly-once restore
//! - Rolling-window trade limit accounting, reserved atomically per key
//! - Position limit clamping against live positions
//! - Stale-filtered listings for every service
//!
//! Synchronous. Trade limit updates are atomic read-modify-writes in the
//! store; temporary stacks serialize per key on the store's
//! [`KeyedLocks`](tac_store::KeyedLocks). There is no global service lock.
//! Time is passed in by the caller.

mod composer;
mod config_source;
mod locks;
mod overrides;
mod position_limits;
mod temporary;
mod trade_limits;

pub use composer::{Admission, OrderAdmission};
pub use config_source::{ConfigSource, CATEGORY_OVERRIDES};
pub use locks::LockService;
pub use overrides::OverrideResolver;
pub use position_limits::PositionLimitEnforcer;
pub use temporary::{
    InstrumentOverrides, InstrumentPositionLimits, LiveSetting, TemporaryCloses,
    TemporaryOverrides, TemporaryStateStack,
};
pub use trade_limits::TradeLimitLedger;
