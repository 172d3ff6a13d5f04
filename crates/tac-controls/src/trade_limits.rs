use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::instrument::InstrumentStrategy;

/// What a trade limit counts trades for.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TradeLimitScope {
    Instrument { instrument_code: String },
    InstrumentStrategy { instrument_strategy: InstrumentStrategy },
}

impl TradeLimitScope {
    pub fn instrument(code: impl Into<String>) -> Self {
        Self::Instrument {
            instrument_code: code.into(),
        }
    }

    pub fn instrument_strategy(instrument_strategy: InstrumentStrategy) -> Self {
        Self::InstrumentStrategy {
            instrument_strategy,
        }
    }

    /// Scopes whose limits a trade on `instrument_strategy` must satisfy.
    /// Returned in `Ord` order so callers can lock them without deadlock.
    pub fn applicable_to(instrument_strategy: &InstrumentStrategy) -> [TradeLimitScope; 2] {
        let mut scopes = [
            Self::instrument(instrument_strategy.instrument_code.clone()),
            Self::instrument_strategy(instrument_strategy.clone()),
        ];
        scopes.sort();
        scopes
    }

    pub fn instrument_code(&self) -> &str {
        match self {
            TradeLimitScope::Instrument { instrument_code } => instrument_code,
            TradeLimitScope::InstrumentStrategy {
                instrument_strategy,
            } => &instrument_strategy.instrument_code,
        }
    }

    pub fn strategy_name(&self) -> Option<&str> {
        match self {
            TradeLimitScope::Instrument { .. } => None,
            TradeLimitScope::InstrumentStrategy {
                instrument_strategy,
            } => Some(&instrument_strategy.strategy_name),
        }
    }
}

impl fmt::Display for TradeLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeLimitScope::Instrument { instrument_code } => f.write_str(instrument_code),
            TradeLimitScope::InstrumentStrategy {
                instrument_strategy,
            } => write!(f, "{instrument_strategy}"),
        }
    }
}

/// Max total absolute volume tradeable within a rolling window of
/// `period_days`, plus the volume consumed in the current window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLimit {
    pub scope: TradeLimitScope,
    pub period_days: u32,
    pub max_trades: u64,
    pub consumed: u64,
    pub window_start: DateTime<Utc>,
}

impl TradeLimit {
    pub fn new(scope: TradeLimitScope, period_days: u32, max_trades: u64, now: DateTime<Utc>) -> Self {
        Self {
            scope,
            period_days,
            max_trades,
            consumed: 0,
            window_start: now,
        }
    }

    pub fn window_end(&self) -> DateTime<Utc> {
        self.window_start + Duration::days(i64::from(self.period_days))
    }

    /// The limit as seen at `now`: once the window has elapsed the counter
    /// starts over from zero with a fresh window.
    pub fn rolled(&self, now: DateTime<Utc>) -> TradeLimit {
        if now >= self.window_end() {
            let mut next = self.clone();
            next.consumed = 0;
            next.window_start = now;
            next
        } else {
            self.clone()
        }
    }

    pub fn remaining(&self) -> u64 {
        self.max_trades.saturating_sub(self.consumed)
    }

    /// `min(proposed, remaining)`. Never negative, never above the proposal.
    pub fn what_trade_is_possible(&self, proposed_abs_qty: u64) -> u64 {
        proposed_abs_qty.min(self.remaining())
    }

    pub fn add_trade(&mut self, abs_qty: u64) {
        self.consumed = self.consumed.saturating_add(abs_qty);
    }

    pub fn remove_trade(&mut self, abs_qty: u64) {
        self.consumed = self.consumed.saturating_sub(abs_qty);
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.consumed = 0;
        self.window_start = now;
    }

    /// Key used by sorted listings: `"<scope> <period_days>"`.
    pub fn sort_key(&self) -> String {
        format!("{} {}", self.scope, self.period_days)
    }
}

impl fmt::Display for TradeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} period_days={} max_trades={} consumed={} window_start={}",
            self.scope,
            self.period_days,
            self.max_trades,
            self.consumed,
            self.window_start.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_rolls_after_period() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut limit = TradeLimit::new(TradeLimitScope::instrument("X"), 1, 3, t0);
        limit.add_trade(2);

        let same_day = limit.rolled(t0 + Duration::hours(23));
        assert_eq!(same_day.consumed, 2);

        let next_day = limit.rolled(t0 + Duration::days(1));
        assert_eq!(next_day.consumed, 0);
        assert_eq!(next_day.window_start, t0 + Duration::days(1));
    }

    #[test]
    fn remove_trade_floors_at_zero() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut limit = TradeLimit::new(TradeLimitScope::instrument("X"), 1, 3, t0);
        limit.add_trade(1);
        limit.remove_trade(5);
        assert_eq!(limit.consumed, 0);
    }
}
