//! `StateStore`: every control table behind one `parking_lot::Mutex`.
//!
//! Persistence is optional. When opened on a path, each mutation is applied
//! to a copy of the tables, the copy is written as a pretty JSON snapshot
//! (temp file + rename), and only then swapped in. A failed write leaves both
//! the file and the in-memory state as they were.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use tac_controls::{
    ControlError, ControlResult, InstrumentStrategy, Override, OverrideKey,
    PositionLimitForInstrument, PositionLimitForStrategyInstrument, TradeLimit, TradeLimitScope,
};

use crate::keyed_locks::KeyedLocks;
use crate::positions::{PositionEntry, PositionTable};
use crate::traits::{
    KeyGuards, LockStore, OverrideStore, PositionLimitStore, PositionReader, TemporaryStore, TradeLimitStore,
};

pub const STATE_SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub key: OverrideKey,
    pub value: Override,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryOverrideEntry {
    pub instrument_code: String,
    pub value: Override,
}

/// On-disk snapshot. Maps with structured keys are stored as entry lists
/// because JSON object keys must be strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub locked_instruments: Vec<String>,
    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,
    #[serde(default)]
    pub temporary_overrides: Vec<TemporaryOverrideEntry>,
    #[serde(default)]
    pub trade_limits: Vec<TradeLimit>,
    #[serde(default)]
    pub instrument_position_limits: Vec<PositionLimitForInstrument>,
    #[serde(default)]
    pub strategy_instrument_position_limits: Vec<PositionLimitForStrategyInstrument>,
    #[serde(default)]
    pub temporary_position_limits: Vec<PositionLimitForInstrument>,
    #[serde(default)]
    pub positions: Vec<PositionEntry>,
}

fn default_version() -> u32 {
    STATE_SNAPSHOT_VERSION
}

#[derive(Clone, Debug, Default)]
struct Tables {
    locks: BTreeSet<String>,
    overrides: BTreeMap<OverrideKey, Override>,
    temporary_overrides: BTreeMap<String, Override>,
    trade_limits: BTreeMap<(TradeLimitScope, u32), TradeLimit>,
    instrument_limits: BTreeMap<String, u64>,
    strategy_instrument_limits: BTreeMap<InstrumentStrategy, u64>,
    temporary_position_limits: BTreeMap<String, PositionLimitForInstrument>,
    positions: PositionTable,
}

impl Tables {
    fn from_state(state: ControlState) -> Self {
        Self {
            locks: state.locked_instruments.into_iter().collect(),
            overrides: state
                .overrides
                .into_iter()
                .filter(|e| e.value != Override::Default)
                .map(|e| (e.key, e.value))
                .collect(),
            temporary_overrides: state
                .temporary_overrides
                .into_iter()
                .map(|e| (e.instrument_code, e.value))
                .collect(),
            trade_limits: state
                .trade_limits
                .into_iter()
                .map(|l| ((l.scope.clone(), l.period_days), l))
                .collect(),
            instrument_limits: state
                .instrument_position_limits
                .into_iter()
                .filter_map(|l| l.position_limit.map(|max| (l.instrument_code, max)))
                .collect(),
            strategy_instrument_limits: state
                .strategy_instrument_position_limits
                .into_iter()
                .filter_map(|l| l.position_limit.map(|max| (l.instrument_strategy, max)))
                .collect(),
            temporary_position_limits: state
                .temporary_position_limits
                .into_iter()
                .map(|l| (l.instrument_code.clone(), l))
                .collect(),
            positions: PositionTable::from_entries(state.positions),
        }
    }

    fn to_state(&self) -> ControlState {
        ControlState {
            version: STATE_SNAPSHOT_VERSION,
            locked_instruments: self.locks.iter().cloned().collect(),
            overrides: self
                .overrides
                .iter()
                .map(|(k, v)| OverrideEntry {
                    key: k.clone(),
                    value: *v,
                })
                .collect(),
            temporary_overrides: self
                .temporary_overrides
                .iter()
                .map(|(code, v)| TemporaryOverrideEntry {
                    instrument_code: code.clone(),
                    value: *v,
                })
                .collect(),
            trade_limits: self.trade_limits.values().cloned().collect(),
            instrument_position_limits: self
                .instrument_limits
                .iter()
                .map(|(code, max)| PositionLimitForInstrument::new(code.clone(), *max))
                .collect(),
            strategy_instrument_position_limits: self
                .strategy_instrument_limits
                .iter()
                .map(|(is, max)| PositionLimitForStrategyInstrument::new(is.clone(), *max))
                .collect(),
            temporary_position_limits: self.temporary_position_limits.values().cloned().collect(),
            positions: self.positions.to_entries(),
        }
    }
}

/// Concrete store behind every collaborator trait.
#[derive(Debug)]
pub struct StateStore {
    path: Option<PathBuf>,
    tables: Mutex<Tables>,
    key_locks: KeyedLocks<String>,
}

impl StateStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: Mutex::new(Tables::default()),
            key_locks: KeyedLocks::new(),
        }
    }

    /// Load the snapshot at `path` (an absent file is an empty state).
    /// Every later mutation rewrites the file.
    pub fn open(path: impl AsRef<Path>) -> ControlResult<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| {
                ControlError::storage(format!("read state {}: {e}", path.display()))
            })?;
            serde_json::from_str::<ControlState>(&raw).map_err(|e| {
                ControlError::storage(format!("parse state {}: {e}", path.display()))
            })?
        } else {
            ControlState::default()
        };

        if state.version > STATE_SNAPSHOT_VERSION {
            return Err(ControlError::storage(format!(
                "state {} has version {}, newest supported is {}",
                path.display(),
                state.version,
                STATE_SNAPSHOT_VERSION
            )));
        }

        Ok(Self {
            path: Some(path),
            tables: Mutex::new(Tables::from_state(state)),
            key_locks: KeyedLocks::new(),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> ControlState {
        self.tables.lock().to_state()
    }

    /// Replace the position for a pair. Zero clears it.
    pub fn set_position(
        &self,
        instrument_strategy: &InstrumentStrategy,
        position: i64,
    ) -> ControlResult<()> {
        self.mutate(|t| {
            t.positions.set(instrument_strategy.clone(), position);
            Ok(())
        })
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&*self.tables.lock())
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Tables) -> ControlResult<R>) -> ControlResult<R> {
        let mut tables = self.tables.lock();
        let mut next = tables.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *tables = next;
        Ok(out)
    }

    fn persist(&self, tables: &Tables) -> ControlResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&tables.to_state())
            .map_err(|e| ControlError::storage(format!("serialize state: {e}")))?;

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)
            .map_err(|e| ControlError::storage(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, path).map_err(|e| {
            ControlError::storage(format!(
                "rename {} -> {}: {e}",
                tmp.display(),
                path.display()
            ))
        })?;

        debug!(path = %path.display(), "state snapshot written");
        Ok(())
    }
}

impl KeyGuards for StateStore {
    fn key_locks(&self) -> &KeyedLocks<String> {
        &self.key_locks
    }
}

impl LockStore for StateStore {
    fn is_locked(&self, instrument_code: &str) -> ControlResult<bool> {
        Ok(self.read(|t| t.locks.contains(instrument_code)))
    }

    fn set_lock(&self, instrument_code: &str) -> ControlResult<()> {
        self.mutate(|t| {
            t.locks.insert(instrument_code.to_string());
            Ok(())
        })
    }

    fn clear_lock(&self, instrument_code: &str) -> ControlResult<()> {
        self.mutate(|t| {
            t.locks.remove(instrument_code);
            Ok(())
        })
    }

    fn list_locked(&self) -> ControlResult<Vec<String>> {
        Ok(self.read(|t| t.locks.iter().cloned().collect()))
    }
}

impl OverrideStore for StateStore {
    fn get_override(&self, key: &OverrideKey) -> ControlResult<Override> {
        Ok(self.read(|t| t.overrides.get(key).copied().unwrap_or_default()))
    }

    fn set_override(&self, key: &OverrideKey, value: Override) -> ControlResult<()> {
        self.mutate(|t| {
            if value == Override::Default {
                t.overrides.remove(key);
            } else {
                t.overrides.insert(key.clone(), value);
            }
            Ok(())
        })
    }

    fn list_all(&self) -> ControlResult<Vec<(OverrideKey, Override)>> {
        Ok(self.read(|t| t.overrides.iter().map(|(k, v)| (k.clone(), *v)).collect()))
    }

    fn delete_all(&self, confirm: bool) -> ControlResult<()> {
        if !confirm {
            return Err(ControlError::Refused(
                "deleting every override requires confirmation".to_string(),
            ));
        }
        self.mutate(|t| {
            t.overrides.clear();
            Ok(())
        })
    }
}

impl TemporaryStore<Override> for StateStore {
    fn get(&self, key: &str) -> ControlResult<Option<Override>> {
        Ok(self.read(|t| t.temporary_overrides.get(key).copied()))
    }

    fn set(&self, key: &str, value: Override) -> ControlResult<()> {
        self.mutate(|t| {
            if t.temporary_overrides.contains_key(key) {
                return Err(ControlError::AlreadyStashed {
                    key: key.to_string(),
                });
            }
            t.temporary_overrides.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn clear(&self, key: &str) -> ControlResult<()> {
        self.mutate(|t| {
            t.temporary_overrides.remove(key);
            Ok(())
        })
    }
}

impl TemporaryStore<PositionLimitForInstrument> for StateStore {
    fn get(&self, key: &str) -> ControlResult<Option<PositionLimitForInstrument>> {
        Ok(self.read(|t| t.temporary_position_limits.get(key).cloned()))
    }

    fn set(&self, key: &str, value: PositionLimitForInstrument) -> ControlResult<()> {
        self.mutate(|t| {
            if t.temporary_position_limits.contains_key(key) {
                return Err(ControlError::AlreadyStashed {
                    key: key.to_string(),
                });
            }
            t.temporary_position_limits.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn clear(&self, key: &str) -> ControlResult<()> {
        self.mutate(|t| {
            t.temporary_position_limits.remove(key);
            Ok(())
        })
    }
}

impl TradeLimitStore for StateStore {
    fn get_limit(
        &self,
        scope: &TradeLimitScope,
        period_days: u32,
    ) -> ControlResult<Option<TradeLimit>> {
        Ok(self.read(|t| t.trade_limits.get(&(scope.clone(), period_days)).cloned()))
    }

    fn set_limit(&self, limit: TradeLimit) -> ControlResult<()> {
        self.mutate(|t| {
            t.trade_limits
                .insert((limit.scope.clone(), limit.period_days), limit);
            Ok(())
        })
    }

    fn delete_limit(&self, scope: &TradeLimitScope, period_days: u32) -> ControlResult<bool> {
        self.mutate(|t| Ok(t.trade_limits.remove(&(scope.clone(), period_days)).is_some()))
    }

    fn list_all(&self) -> ControlResult<Vec<TradeLimit>> {
        Ok(self.read(|t| t.trade_limits.values().cloned().collect()))
    }

    fn list_for_scope(&self, scope: &TradeLimitScope) -> ControlResult<Vec<TradeLimit>> {
        Ok(self.read(|t| {
            t.trade_limits
                .values()
                .filter(|l| &l.scope == scope)
                .cloned()
                .collect()
        }))
    }

    fn update_matching<R, F>(
        &self,
        scopes: &[TradeLimitScope],
        now: DateTime<Utc>,
        f: F,
    ) -> ControlResult<R>
    where
        F: FnOnce(&mut [TradeLimit]) -> ControlResult<R>,
    {
        self.mutate(|t| {
            let mut matching: Vec<TradeLimit> = t
                .trade_limits
                .values()
                .filter(|l| scopes.contains(&l.scope))
                .map(|l| l.rolled(now))
                .collect();
            let out = f(&mut matching)?;
            for limit in matching {
                t.trade_limits
                    .insert((limit.scope.clone(), limit.period_days), limit);
            }
            Ok(out)
        })
    }

    fn upsert_limit<F>(
        &self,
        scope: &TradeLimitScope,
        period_days: u32,
        f: F,
    ) -> ControlResult<TradeLimit>
    where
        F: FnOnce(Option<TradeLimit>) -> ControlResult<TradeLimit>,
    {
        self.mutate(|t| {
            let key = (scope.clone(), period_days);
            let limit = f(t.trade_limits.get(&key).cloned())?;
            if limit.scope != *scope || limit.period_days != period_days {
                return Err(ControlError::storage(format!(
                    "upsert of {scope} period_days={period_days} returned {} period_days={}",
                    limit.scope, limit.period_days
                )));
            }
            t.trade_limits.insert(key, limit.clone());
            Ok(limit)
        })
    }
}

impl PositionLimitStore for StateStore {
    fn get_instrument_limit(&self, instrument_code: &str) -> ControlResult<PositionLimitForInstrument> {
        Ok(self.read(|t| match t.instrument_limits.get(instrument_code) {
            Some(max) => PositionLimitForInstrument::new(instrument_code, *max),
            None => PositionLimitForInstrument::no_limit(instrument_code),
        }))
    }

    fn set_instrument_limit(&self, instrument_code: &str, position_limit: u64) -> ControlResult<()> {
        self.mutate(|t| {
            t.instrument_limits
                .insert(instrument_code.to_string(), position_limit);
            Ok(())
        })
    }

    fn delete_instrument_limit(&self, instrument_code: &str) -> ControlResult<()> {
        self.mutate(|t| {
            t.instrument_limits.remove(instrument_code);
            Ok(())
        })
    }

    fn get_strategy_instrument_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<PositionLimitForStrategyInstrument> {
        Ok(self.read(
            |t| match t.strategy_instrument_limits.get(instrument_strategy) {
                Some(max) => PositionLimitForStrategyInstrument::new(instrument_strategy.clone(), *max),
                None => PositionLimitForStrategyInstrument::no_limit(instrument_strategy.clone()),
            },
        ))
    }

    fn set_strategy_instrument_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
        position_limit: u64,
    ) -> ControlResult<()> {
        self.mutate(|t| {
            t.strategy_instrument_limits
                .insert(instrument_strategy.clone(), position_limit);
            Ok(())
        })
    }

    fn delete_strategy_instrument_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<()> {
        self.mutate(|t| {
            t.strategy_instrument_limits.remove(instrument_strategy);
            Ok(())
        })
    }

    fn instruments_with_limits(&self) -> ControlResult<Vec<String>> {
        Ok(self.read(|t| t.instrument_limits.keys().cloned().collect()))
    }

    fn instrument_strategies_with_limits(&self) -> ControlResult<Vec<InstrumentStrategy>> {
        Ok(self.read(|t| t.strategy_instrument_limits.keys().cloned().collect()))
    }
}

impl PositionReader for StateStore {
    fn instrument_position(&self, instrument_code: &str) -> ControlResult<i64> {
        self.read(|t| t.positions.instrument(instrument_code))
    }

    fn strategy_instrument_position(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<i64> {
        Ok(self.read(|t| t.positions.pair(instrument_strategy)))
    }

    fn instruments_with_positions(&self) -> ControlResult<Vec<String>> {
        Ok(self.read(|t| t.positions.instruments()))
    }

    fn instrument_strategies_with_positions(&self) -> ControlResult<Vec<InstrumentStrategy>> {
        Ok(self.read(|t| t.positions.pairs()))
    }
}
