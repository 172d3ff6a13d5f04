use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::instrument::InstrumentStrategy;
use crate::order::signed_qty;

pub const OVERRIDE_REASON_IN_DATABASE: &str = "in database";

/// Trading override, ordered by severity.
///
/// Variant order matters: `Ord` puts `Default < ReduceOnly < NoTrade`, so the
/// join of two overrides is simply `max`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Override {
    /// No restriction.
    #[default]
    Default,
    /// Only trades that move the position toward zero.
    ReduceOnly,
    /// Nothing may trade.
    NoTrade,
}

impl Override {
    /// Join: returns the more severe of the two.
    ///
    /// `Default` is the identity and `NoTrade` absorbs.
    pub fn combine(self, other: Override) -> Override {
        self.max(other)
    }

    /// Fold any number of overrides; empty input is `Default`.
    pub fn combine_all<I: IntoIterator<Item = Override>>(overrides: I) -> Override {
        overrides
            .into_iter()
            .fold(Override::Default, Override::combine)
    }

    /// Restrict a proposed signed trade given the current signed position.
    ///
    /// Under `ReduceOnly` a trade that would grow |position| is zeroed, and a
    /// reducing trade is capped at flattening (it never flips the position).
    pub fn apply_to_trade(self, position: i64, proposed_trade: i64) -> i64 {
        match self {
            Override::Default => proposed_trade,
            Override::NoTrade => 0,
            Override::ReduceOnly => {
                if proposed_trade == 0 || position == 0 {
                    return 0;
                }
                if proposed_trade.signum() == position.signum() {
                    return 0;
                }
                let capped = proposed_trade.unsigned_abs().min(position.unsigned_abs());
                signed_qty(proposed_trade.signum(), capped)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Override::Default => "default",
            Override::ReduceOnly => "reduce_only",
            Override::NoTrade => "no_trade",
        }
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Override {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "default" | "none" => Ok(Override::Default),
            "reduce_only" | "close" => Ok(Override::ReduceOnly),
            "no_trade" | "notrade" => Ok(Override::NoTrade),
            other => Err(format!(
                "invalid override '{other}'. expected one of: default | reduce_only | no_trade"
            )),
        }
    }
}

/// Override plus where it came from. Provenance never affects composition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideWithReason {
    pub value: Override,
    pub reason: String,
}

impl OverrideWithReason {
    pub fn new(value: Override, reason: impl Into<String>) -> Self {
        Self {
            value,
            reason: reason.into(),
        }
    }

    pub fn in_database(value: Override) -> Self {
        Self::new(value, OVERRIDE_REASON_IN_DATABASE)
    }

    /// Keep the more severe entry. On equal severity `other` wins.
    pub fn combine(self, other: OverrideWithReason) -> OverrideWithReason {
        if self.value > other.value {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for OverrideWithReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} because {}", self.value, self.reason)
    }
}

/// What a persisted override is attached to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverrideKey {
    Strategy { strategy_name: String },
    Instrument { instrument_code: String },
    InstrumentStrategy { instrument_strategy: InstrumentStrategy },
}

impl OverrideKey {
    pub fn strategy(name: impl Into<String>) -> Self {
        Self::Strategy {
            strategy_name: name.into(),
        }
    }

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

    /// The three keys whose DB overrides apply to a pair.
    pub fn applicable_to(instrument_strategy: &InstrumentStrategy) -> [OverrideKey; 3] {
        [
            Self::strategy(instrument_strategy.strategy_name.clone()),
            Self::instrument(instrument_strategy.instrument_code.clone()),
            Self::instrument_strategy(instrument_strategy.clone()),
        ]
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideKey::Strategy { strategy_name } => write!(f, "strategy:{strategy_name}"),
            OverrideKey::Instrument { instrument_code } => {
                write!(f, "instrument:{instrument_code}")
            }
            OverrideKey::InstrumentStrategy {
                instrument_strategy,
            } => write!(f, "{instrument_strategy}"),
        }
    }
}
