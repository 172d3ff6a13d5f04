use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy name used for records that apply to an instrument as a whole.
pub const ALL_STRATEGIES: &str = "";

/// Primary lookup key across all stores: (strategy, instrument).
///
/// Ordering is (strategy_name, instrument_code) so listings are deterministic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstrumentStrategy {
    pub strategy_name: String,
    pub instrument_code: String,
}

impl InstrumentStrategy {
    pub fn new(strategy_name: impl Into<String>, instrument_code: impl Into<String>) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            instrument_code: instrument_code.into(),
        }
    }

    /// Key for the instrument across all strategies.
    pub fn all_strategies(instrument_code: impl Into<String>) -> Self {
        Self::new(ALL_STRATEGIES, instrument_code)
    }

    pub fn is_all_strategies(&self) -> bool {
        self.strategy_name == ALL_STRATEGIES
    }
}

impl fmt::Display for InstrumentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all_strategies() {
            write!(f, "{}", self.instrument_code)
        } else {
            write!(f, "{}/{}", self.strategy_name, self.instrument_code)
        }
    }
}
