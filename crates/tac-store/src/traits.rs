//! Collaborator interfaces. Every method reports failure as a
//! [`ControlError`](tac_controls::ControlError); none of them silently
//! substitutes a permissive value for a read it could not perform.

use chrono::{DateTime, Utc};
use tac_controls::{
    ControlResult, InstrumentStrategy, Override, OverrideKey, PositionLimitForInstrument,
    PositionLimitForStrategyInstrument, TradeLimit, TradeLimitScope,
};

use crate::keyed_locks::KeyedLocks;

/// Per-key guards owned by a store. Every service built on the same store
/// takes the same slot for the same key.
pub trait KeyGuards {
    fn key_locks(&self) -> &KeyedLocks<String>;
}

/// Per-instrument lock flags.
pub trait LockStore {
    fn is_locked(&self, instrument_code: &str) -> ControlResult<bool>;
    fn set_lock(&self, instrument_code: &str) -> ControlResult<()>;
    fn clear_lock(&self, instrument_code: &str) -> ControlResult<()>;
    /// Sorted.
    fn list_locked(&self) -> ControlResult<Vec<String>>;
}

/// Persisted overrides. A missing entry reads as [`Override::Default`].
pub trait OverrideStore {
    fn get_override(&self, key: &OverrideKey) -> ControlResult<Override>;
    /// Writing `Default` removes the entry.
    fn set_override(&self, key: &OverrideKey, value: Override) -> ControlResult<()>;
    fn list_all(&self) -> ControlResult<Vec<(OverrideKey, Override)>>;
    /// Refused unless `confirm` is true.
    fn delete_all(&self, confirm: bool) -> ControlResult<()>;
}

/// Single-slot stash per instrument code.
pub trait TemporaryStore<V> {
    fn get(&self, key: &str) -> ControlResult<Option<V>>;
    /// `AlreadyStashed` if the slot is occupied.
    fn set(&self, key: &str, value: V) -> ControlResult<()>;
    fn clear(&self, key: &str) -> ControlResult<()>;
}

/// Rolling-window trade limits, keyed by (scope, period_days).
pub trait TradeLimitStore {
    fn get_limit(&self, scope: &TradeLimitScope, period_days: u32)
        -> ControlResult<Option<TradeLimit>>;
    /// Insert or replace the limit with the same scope and period.
    fn set_limit(&self, limit: TradeLimit) -> ControlResult<()>;
    /// Returns whether a limit was removed.
    fn delete_limit(&self, scope: &TradeLimitScope, period_days: u32) -> ControlResult<bool>;
    fn list_all(&self) -> ControlResult<Vec<TradeLimit>>;
    fn list_for_scope(&self, scope: &TradeLimitScope) -> ControlResult<Vec<TradeLimit>>;

    /// Atomic read-modify-write over every limit on any of `scopes`. `f`
    /// receives them rolled to `now` and its changes are stored in the same
    /// step. An error from `f` stores nothing.
    fn update_matching<R, F>(
        &self,
        scopes: &[TradeLimitScope],
        now: DateTime<Utc>,
        f: F,
    ) -> ControlResult<R>
    where
        F: FnOnce(&mut [TradeLimit]) -> ControlResult<R>;

    /// Atomic read-modify-write of one limit. `f` receives the stored limit,
    /// if any, and returns the limit to store.
    fn upsert_limit<F>(
        &self,
        scope: &TradeLimitScope,
        period_days: u32,
        f: F,
    ) -> ControlResult<TradeLimit>
    where
        F: FnOnce(Option<TradeLimit>) -> ControlResult<TradeLimit>;
}

/// Max absolute position per instrument and per instrument/strategy.
/// Reads of an unconfigured scope return a "no limit" record.
pub trait PositionLimitStore {
    fn get_instrument_limit(&self, instrument_code: &str)
        -> ControlResult<PositionLimitForInstrument>;
    fn set_instrument_limit(&self, instrument_code: &str, position_limit: u64)
        -> ControlResult<()>;
    fn delete_instrument_limit(&self, instrument_code: &str) -> ControlResult<()>;

    fn get_strategy_instrument_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<PositionLimitForStrategyInstrument>;
    fn set_strategy_instrument_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
        position_limit: u64,
    ) -> ControlResult<()>;
    fn delete_strategy_instrument_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<()>;

    fn instruments_with_limits(&self) -> ControlResult<Vec<String>>;
    fn instrument_strategies_with_limits(&self) -> ControlResult<Vec<InstrumentStrategy>>;
}

/// Live signed positions.
pub trait PositionReader {
    /// Summed across every strategy holding the instrument.
    fn instrument_position(&self, instrument_code: &str) -> ControlResult<i64>;
    fn strategy_instrument_position(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<i64>;
    /// Instruments with a non-zero net position, sorted.
    fn instruments_with_positions(&self) -> ControlResult<Vec<String>>;
    /// Pairs with a non-zero position, sorted.
    fn instrument_strategies_with_positions(&self) -> ControlResult<Vec<InstrumentStrategy>>;
}
