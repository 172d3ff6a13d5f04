use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ControlError, ControlResult};
use crate::instrument::InstrumentStrategy;

/// `sign * magnitude` with the magnitude saturated at `i64::MAX`, so a
/// `u64` taken from `unsigned_abs()` converts back without overflow.
pub(crate) fn signed_qty(sign: i64, magnitude: u64) -> i64 {
    sign * magnitude.min(i64::MAX as u64) as i64
}

/// Proposed trade for one instrument/strategy. Positive buys, negative sells.
///
/// Never mutated in place: every clamping step returns a new `Order`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub instrument_strategy: InstrumentStrategy,
    pub trade: i64,
}

impl Order {
    pub fn new(instrument_strategy: InstrumentStrategy, trade: i64) -> Self {
        Self {
            instrument_strategy,
            trade,
        }
    }

    /// `i64::MIN` has no positive counterpart and cannot be clamped
    /// symmetrically; admission rejects it before any stage runs.
    pub fn validate(&self) -> ControlResult<()> {
        if self.trade == i64::MIN {
            return Err(ControlError::InvalidOrder(format!(
                "{}: quantity {} is out of range",
                self.instrument_strategy, self.trade
            )));
        }
        Ok(())
    }

    pub fn instrument_code(&self) -> &str {
        &self.instrument_strategy.instrument_code
    }

    pub fn abs_qty(&self) -> u64 {
        self.trade.unsigned_abs()
    }

    pub fn is_zero(&self) -> bool {
        self.trade == 0
    }

    /// Same order with a different signed quantity.
    pub fn replace_trade(&self, trade: i64) -> Order {
        Order::new(self.instrument_strategy.clone(), trade)
    }

    /// Cap the magnitude at `max_abs`, keeping the sign. Never increases size.
    pub fn with_abs_cap(&self, max_abs: u64) -> Order {
        let capped = self.abs_qty().min(max_abs);
        self.replace_trade(signed_qty(self.trade.signum(), capped))
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+}", self.instrument_strategy, self.trade)
    }
}

/// Most-conservative composition.
///
/// Picks the smallest magnitude among `original` and every candidate. A
/// candidate whose sign disagrees with the original is read as zero: clamping
/// may shrink an order to nothing but may never flip its direction.
pub fn most_conservative_order(original: &Order, candidates: &[Order]) -> Order {
    let sign = original.trade.signum();
    let smallest = candidates
        .iter()
        .map(|c| {
            if c.trade.signum() == sign {
                c.abs_qty()
            } else {
                0
            }
        })
        .fold(original.abs_qty(), u64::min);

    original.replace_trade(signed_qty(sign, smallest))
}
