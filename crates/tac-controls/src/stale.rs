//! Read-time stale filtering.
//!
//! A record is stale when its instrument or strategy is no longer part of the
//! trading configuration. Filtering is a view over a collection; storage is
//! never touched, so the next listing re-evaluates against whatever the
//! configuration says then.

use std::collections::BTreeSet;

use crate::instrument::InstrumentStrategy;
use crate::overrides::OverrideKey;
use crate::position_limits::{PositionLimitAndPosition, PositionLimitScope};
use crate::trade_limits::{TradeLimit, TradeLimitScope};

/// Anything that can be tied back to an instrument and/or a strategy.
pub trait StaleKeyed {
    fn instrument_code(&self) -> Option<&str>;
    fn strategy_name(&self) -> Option<&str>;
}

/// Snapshot of the current configuration universe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaleFilter {
    stale_instruments: BTreeSet<String>,
    stale_strategies: BTreeSet<String>,
    active_instruments: Option<BTreeSet<String>>,
    active_strategies: Option<BTreeSet<String>>,
}

impl StaleFilter {
    pub fn new<I, S>(stale_instruments: I, stale_strategies: S) -> Self
    where
        I: IntoIterator<Item = String>,
        S: IntoIterator<Item = String>,
    {
        Self {
            stale_instruments: stale_instruments.into_iter().collect(),
            stale_strategies: stale_strategies.into_iter().collect(),
            active_instruments: None,
            active_strategies: None,
        }
    }

    /// Anything outside `instruments` is stale as well.
    pub fn with_active_instruments<I: IntoIterator<Item = String>>(mut self, instruments: I) -> Self {
        self.active_instruments = Some(instruments.into_iter().collect());
        self
    }

    /// Anything outside `strategies` is stale as well.
    pub fn with_active_strategies<S: IntoIterator<Item = String>>(mut self, strategies: S) -> Self {
        self.active_strategies = Some(strategies.into_iter().collect());
        self
    }

    pub fn is_stale_instrument(&self, instrument_code: &str) -> bool {
        self.stale_instruments.contains(instrument_code)
            || self
                .active_instruments
                .as_ref()
                .is_some_and(|active| !active.contains(instrument_code))
    }

    pub fn is_stale_strategy(&self, strategy_name: &str) -> bool {
        self.stale_strategies.contains(strategy_name)
            || self
                .active_strategies
                .as_ref()
                .is_some_and(|active| !active.contains(strategy_name))
    }

    pub fn is_stale<T: StaleKeyed + ?Sized>(&self, item: &T) -> bool {
        item.instrument_code()
            .is_some_and(|code| self.is_stale_instrument(code))
            || item
                .strategy_name()
                .is_some_and(|name| self.is_stale_strategy(name))
    }

    pub fn retain<T: StaleKeyed>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().filter(|i| !self.is_stale(i)).collect()
    }

    pub fn retain_instruments(&self, codes: Vec<String>) -> Vec<String> {
        codes
            .into_iter()
            .filter(|c| !self.is_stale_instrument(c))
            .collect()
    }
}

impl StaleKeyed for InstrumentStrategy {
    fn instrument_code(&self) -> Option<&str> {
        Some(&self.instrument_code)
    }

    fn strategy_name(&self) -> Option<&str> {
        if self.is_all_strategies() {
            None
        } else {
            Some(&self.strategy_name)
        }
    }
}

impl StaleKeyed for OverrideKey {
    fn instrument_code(&self) -> Option<&str> {
        match self {
            OverrideKey::Strategy { .. } => None,
            OverrideKey::Instrument { instrument_code } => Some(instrument_code),
            OverrideKey::InstrumentStrategy {
                instrument_strategy,
            } => Some(&instrument_strategy.instrument_code),
        }
    }

    fn strategy_name(&self) -> Option<&str> {
        match self {
            OverrideKey::Strategy { strategy_name } => Some(strategy_name),
            OverrideKey::Instrument { .. } => None,
            OverrideKey::InstrumentStrategy {
                instrument_strategy,
            } => StaleKeyed::strategy_name(instrument_strategy),
        }
    }
}

impl StaleKeyed for TradeLimitScope {
    fn instrument_code(&self) -> Option<&str> {
        Some(TradeLimitScope::instrument_code(self))
    }

    fn strategy_name(&self) -> Option<&str> {
        TradeLimitScope::strategy_name(self)
    }
}

impl StaleKeyed for TradeLimit {
    fn instrument_code(&self) -> Option<&str> {
        Some(self.scope.instrument_code())
    }

    fn strategy_name(&self) -> Option<&str> {
        self.scope.strategy_name()
    }
}

impl StaleKeyed for PositionLimitAndPosition {
    fn instrument_code(&self) -> Option<&str> {
        Some(self.scope.instrument_code())
    }

    fn strategy_name(&self) -> Option<&str> {
        self.scope.strategy_name()
    }
}

impl StaleKeyed for PositionLimitScope {
    fn instrument_code(&self) -> Option<&str> {
        Some(PositionLimitScope::instrument_code(self))
    }

    fn strategy_name(&self) -> Option<&str> {
        PositionLimitScope::strategy_name(self)
    }
}

impl<K: StaleKeyed, V> StaleKeyed for (K, V) {
    fn instrument_code(&self) -> Option<&str> {
        self.0.instrument_code()
    }

    fn strategy_name(&self) -> Option<&str> {
        self.0.strategy_name()
    }
}
