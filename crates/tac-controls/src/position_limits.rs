use serde::{Deserialize, Serialize};
use std::fmt;

use crate::instrument::InstrumentStrategy;
use crate::order::{signed_qty, Order};

/// What a position limit applies to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionLimitScope {
    Instrument { instrument_code: String },
    InstrumentStrategy { instrument_strategy: InstrumentStrategy },
}

impl PositionLimitScope {
    pub fn instrument_code(&self) -> &str {
        match self {
            PositionLimitScope::Instrument { instrument_code } => instrument_code,
            PositionLimitScope::InstrumentStrategy {
                instrument_strategy,
            } => &instrument_strategy.instrument_code,
        }
    }

    pub fn strategy_name(&self) -> Option<&str> {
        match self {
            PositionLimitScope::Instrument { .. } => None,
            PositionLimitScope::InstrumentStrategy {
                instrument_strategy,
            } => Some(&instrument_strategy.strategy_name),
        }
    }
}

impl fmt::Display for PositionLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionLimitScope::Instrument { instrument_code } => f.write_str(instrument_code),
            PositionLimitScope::InstrumentStrategy {
                instrument_strategy,
            } => write!(f, "{instrument_strategy}"),
        }
    }
}

/// Max absolute position for an instrument across all strategies.
/// `position_limit == None` means no limit is configured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLimitForInstrument {
    pub instrument_code: String,
    pub position_limit: Option<u64>,
}

impl PositionLimitForInstrument {
    pub fn new(instrument_code: impl Into<String>, position_limit: u64) -> Self {
        Self {
            instrument_code: instrument_code.into(),
            position_limit: Some(position_limit),
        }
    }

    pub fn no_limit(instrument_code: impl Into<String>) -> Self {
        Self {
            instrument_code: instrument_code.into(),
            position_limit: None,
        }
    }

    /// Smaller of this limit and a strategy limit; `None` when neither is set.
    pub fn minimum_position_limit(
        &self,
        other: &PositionLimitForStrategyInstrument,
    ) -> Option<u64> {
        match (self.position_limit, other.position_limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

impl fmt::Display for PositionLimitForInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.instrument_code, fmt_limit(self.position_limit))
    }
}

/// Max absolute position for one strategy in one instrument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLimitForStrategyInstrument {
    pub instrument_strategy: InstrumentStrategy,
    pub position_limit: Option<u64>,
}

impl PositionLimitForStrategyInstrument {
    pub fn new(instrument_strategy: InstrumentStrategy, position_limit: u64) -> Self {
        Self {
            instrument_strategy,
            position_limit: Some(position_limit),
        }
    }

    pub fn no_limit(instrument_strategy: InstrumentStrategy) -> Self {
        Self {
            instrument_strategy,
            position_limit: None,
        }
    }
}

/// A limit paired with a live position reading. Ephemeral: built per query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PositionLimitAndPosition {
    pub scope: PositionLimitScope,
    pub position_limit: Option<u64>,
    pub position: i64,
}

impl PositionLimitAndPosition {
    pub fn for_instrument(limit: PositionLimitForInstrument, position: i64) -> Self {
        Self {
            scope: PositionLimitScope::Instrument {
                instrument_code: limit.instrument_code,
            },
            position_limit: limit.position_limit,
            position,
        }
    }

    pub fn for_strategy_instrument(
        limit: PositionLimitForStrategyInstrument,
        position: i64,
    ) -> Self {
        Self {
            scope: PositionLimitScope::InstrumentStrategy {
                instrument_strategy: limit.instrument_strategy,
            },
            position_limit: limit.position_limit,
            position,
        }
    }

    /// Largest signed trade, no bigger than `proposed_trade` and of the same
    /// sign, that keeps `|position + trade| <= limit`.
    ///
    /// When the position is already beyond the limit only trades that shrink
    /// it are allowed, and only as far as the far side of the limit.
    pub fn possible_trade(&self, proposed_trade: i64) -> i64 {
        let Some(limit) = self.position_limit else {
            return proposed_trade;
        };
        if proposed_trade == 0 {
            return 0;
        }

        let limit = limit as i128;
        let position = self.position as i128;
        let headroom = if proposed_trade > 0 {
            limit - position
        } else {
            limit + position
        };
        let allowed = (proposed_trade.unsigned_abs() as i128).min(headroom.max(0));

        signed_qty(proposed_trade.signum(), allowed as u64)
    }

    pub fn apply_position_limit_to_order(&self, order: &Order) -> Order {
        order.replace_trade(self.possible_trade(order.trade))
    }

    /// Contracts left before |position| hits the limit; `None` if unlimited.
    pub fn spare_capacity(&self) -> Option<u64> {
        self.position_limit
            .map(|limit| limit.saturating_sub(self.position.unsigned_abs()))
    }

    pub fn is_breached(&self) -> bool {
        self.position_limit
            .map(|limit| self.position.unsigned_abs() > limit)
            .unwrap_or(false)
    }
}

impl fmt::Display for PositionLimitAndPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} limit={} position={}",
            self.scope,
            fmt_limit(self.position_limit),
            self.position
        )
    }
}

fn fmt_limit(limit: Option<u64>) -> String {
    limit
        .map(|l| l.to_string())
        .unwrap_or_else(|| "none".to_string())
}
