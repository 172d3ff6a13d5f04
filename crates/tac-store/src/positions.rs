use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use tac_controls::{ControlError, ControlResult, InstrumentStrategy};

use crate::traits::PositionReader;

/// One row of a position snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub instrument_strategy: InstrumentStrategy,
    pub position: i64,
}

/// Signed positions keyed by pair. Zero positions are not stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PositionTable {
    positions: BTreeMap<InstrumentStrategy, i64>,
}

impl PositionTable {
    pub(crate) fn set(&mut self, instrument_strategy: InstrumentStrategy, position: i64) {
        if position == 0 {
            self.positions.remove(&instrument_strategy);
        } else {
            self.positions.insert(instrument_strategy, position);
        }
    }

    pub(crate) fn pair(&self, instrument_strategy: &InstrumentStrategy) -> i64 {
        self.positions.get(instrument_strategy).copied().unwrap_or(0)
    }

    /// Net across strategies. Summed in i128; a net that does not fit an
    /// i64 is an error rather than a wrapped value.
    pub(crate) fn instrument(&self, instrument_code: &str) -> ControlResult<i64> {
        let net = self.net(instrument_code);
        i64::try_from(net).map_err(|_| {
            ControlError::storage(format!(
                "net position {net} for {instrument_code} is out of range"
            ))
        })
    }

    fn net(&self, instrument_code: &str) -> i128 {
        self.positions
            .iter()
            .filter(|(is, _)| is.instrument_code == instrument_code)
            .map(|(_, p)| *p as i128)
            .sum()
    }

    pub(crate) fn instruments(&self) -> Vec<String> {
        let codes: BTreeSet<&str> = self
            .positions
            .keys()
            .map(|is| is.instrument_code.as_str())
            .collect();
        codes
            .into_iter()
            .filter(|code| self.net(code) != 0)
            .map(str::to_string)
            .collect()
    }

    pub(crate) fn pairs(&self) -> Vec<InstrumentStrategy> {
        self.positions.keys().cloned().collect()
    }

    pub(crate) fn to_entries(&self) -> Vec<PositionEntry> {
        self.positions
            .iter()
            .map(|(is, p)| PositionEntry {
                instrument_strategy: is.clone(),
                position: *p,
            })
            .collect()
    }

    pub(crate) fn from_entries(entries: Vec<PositionEntry>) -> Self {
        let mut table = Self::default();
        for e in entries {
            table.set(e.instrument_strategy, e.position);
        }
        table
    }
}

/// In-memory position source for tests and dry runs.
///
/// Thread-safe via `parking_lot::RwLock`; readers never block each other.
#[derive(Debug, Default)]
pub struct PositionBook {
    inner: RwLock<PositionTable>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_positions<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = (InstrumentStrategy, i64)>,
    {
        let book = Self::new();
        for (is, p) in positions {
            book.set_position(is, p);
        }
        book
    }

    /// Replace the position for a pair. Zero clears it.
    pub fn set_position(&self, instrument_strategy: InstrumentStrategy, position: i64) {
        self.inner.write().set(instrument_strategy, position);
    }

    pub fn entries(&self) -> Vec<PositionEntry> {
        self.inner.read().to_entries()
    }
}

impl PositionReader for PositionBook {
    fn instrument_position(&self, instrument_code: &str) -> ControlResult<i64> {
        self.inner.read().instrument(instrument_code)
    }

    fn strategy_instrument_position(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<i64> {
        Ok(self.inner.read().pair(instrument_strategy))
    }

    fn instruments_with_positions(&self) -> ControlResult<Vec<String>> {
        Ok(self.inner.read().instruments())
    }

    fn instrument_strategies_with_positions(&self) -> ControlResult<Vec<InstrumentStrategy>> {
        Ok(self.inner.read().pairs())
    }
}
