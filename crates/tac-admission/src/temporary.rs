//! Temporary State Stack.
//!
//! A single-slot stash per key in front of a live setting. `apply_temporary`
//! stashes the live value and writes the temporary one; `restore` writes the
//! stashed value back and clears the slot. Both run under the key's slot in
//! the store's [`KeyedLocks`](tac_store::KeyedLocks), shared by every stack
//! built on that store.
//!
//! Two applies without a restore fail with `AlreadyStashed` and leave the
//! state untouched: overwriting the slot would lose the value to restore.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

use tac_controls::{
    ControlError, ControlResult, Override, OverrideKey, PositionLimitForInstrument,
};
use tac_store::{KeyGuards, OverrideStore, PositionLimitStore, TemporaryStore};

/// The live value a temporary change replaces.
pub trait LiveSetting<V> {
    fn current(&self, key: &str) -> ControlResult<V>;
    fn replace(&self, key: &str, value: V) -> ControlResult<()>;
}

/// Persisted instrument-level overrides.
pub struct InstrumentOverrides<S>(pub Arc<S>);

impl<S: OverrideStore> LiveSetting<Override> for InstrumentOverrides<S> {
    fn current(&self, key: &str) -> ControlResult<Override> {
        self.0.get_override(&OverrideKey::instrument(key))
    }

    fn replace(&self, key: &str, value: Override) -> ControlResult<()> {
        self.0.set_override(&OverrideKey::instrument(key), value)
    }
}

/// Instrument position limits. Replacing with "no limit" deletes the limit.
pub struct InstrumentPositionLimits<S>(pub Arc<S>);

impl<S: PositionLimitStore> LiveSetting<PositionLimitForInstrument> for InstrumentPositionLimits<S> {
    fn current(&self, key: &str) -> ControlResult<PositionLimitForInstrument> {
        self.0.get_instrument_limit(key)
    }

    fn replace(&self, key: &str, value: PositionLimitForInstrument) -> ControlResult<()> {
        match value.position_limit {
            Some(limit) => self.0.set_instrument_limit(key, limit),
            None => self.0.delete_instrument_limit(key),
        }
    }
}

pub struct TemporaryStateStack<V, S, L> {
    stash: Arc<S>,
    live: L,
    label: &'static str,
    _value: PhantomData<fn() -> V>,
}

pub type TemporaryOverrides<S> = TemporaryStateStack<Override, S, InstrumentOverrides<S>>;
pub type TemporaryCloses<S> =
    TemporaryStateStack<PositionLimitForInstrument, S, InstrumentPositionLimits<S>>;

impl<V, S, L> TemporaryStateStack<V, S, L>
where
    V: Clone + Debug,
    S: TemporaryStore<V> + KeyGuards,
    L: LiveSetting<V>,
{
    pub fn new(stash: Arc<S>, live: L, label: &'static str) -> Self {
        Self {
            stash,
            live,
            label,
            _value: PhantomData,
        }
    }

    pub fn stashed(&self, key: &str) -> ControlResult<Option<V>> {
        self.stash.get(key)
    }

    /// Put `current_value` in the slot. `AlreadyStashed` if it is occupied.
    pub fn stash(&self, key: &str, current_value: V) -> ControlResult<()> {
        self.with_key_lock(key, || self.stash_locked(key, current_value))
    }

    /// Stash the live value, then write `new_value`. Returns the stashed
    /// value.
    pub fn apply_temporary(&self, key: &str, new_value: V) -> ControlResult<V> {
        self.with_key_lock(key, || {
            let current = self.live.current(key)?;
            self.stash_locked(key, current.clone())?;

            if let Err(e) = self.live.replace(key, new_value.clone()) {
                self.stash.clear(key)?;
                return Err(e);
            }

            debug!(
                kind = self.label,
                key,
                stashed = ?current,
                temporary = ?new_value,
                "temporary value applied"
            );
            Ok(current)
        })
    }

    /// Clear the slot and write the stashed value back. If the write fails
    /// the value is stashed again. With nothing stashed this logs a warning
    /// and returns `Ok(None)`.
    pub fn restore(&self, key: &str) -> ControlResult<Option<V>> {
        self.with_key_lock(key, || {
            let Some(original) = self.stash.get(key)? else {
                let err = ControlError::NothingStashed {
                    key: key.to_string(),
                };
                warn!(kind = self.label, %err, "restore skipped");
                return Ok(None);
            };

            self.stash.clear(key)?;
            if let Err(e) = self.live.replace(key, original.clone()) {
                self.stash.set(key, original)?;
                return Err(e);
            }

            debug!(kind = self.label, key, restored = ?original, "temporary value restored");
            Ok(Some(original))
        })
    }

    fn with_key_lock<R>(&self, key: &str, f: impl FnOnce() -> R) -> R {
        let slot = format!("{}/{}", self.label, key);
        self.stash.key_locks().with_key(&slot, f)
    }

    fn stash_locked(&self, key: &str, value: V) -> ControlResult<()> {
        if self.stash.get(key)?.is_some() {
            return Err(ControlError::AlreadyStashed {
                key: key.to_string(),
            });
        }
        self.stash.set(key, value)
    }
}

impl<S> TemporaryStateStack<Override, S, InstrumentOverrides<S>>
where
    S: OverrideStore + TemporaryStore<Override> + KeyGuards,
{
    pub fn for_overrides(store: Arc<S>) -> Self {
        Self::new(Arc::clone(&store), InstrumentOverrides(store), "temporary_override")
    }

    /// Returns the override that was in place before.
    pub fn add_temporary_reduce_only_for_instrument(&self, instrument_code: &str) -> ControlResult<Override> {
        self.apply_temporary(instrument_code, Override::ReduceOnly)
    }

    pub fn remove_temporary_override_for_instrument(
        &self,
        instrument_code: &str,
    ) -> ControlResult<Option<Override>> {
        self.restore(instrument_code)
    }
}

impl<S> TemporaryStateStack<PositionLimitForInstrument, S, InstrumentPositionLimits<S>>
where
    S: PositionLimitStore + TemporaryStore<PositionLimitForInstrument> + KeyGuards,
{
    pub fn for_position_limits(store: Arc<S>) -> Self {
        Self::new(
            Arc::clone(&store),
            InstrumentPositionLimits(store),
            "temporary_close",
        )
    }

    /// Zero the instrument position limit so only reducing trades pass.
    pub fn temporarily_set_position_limit_to_zero(
        &self,
        instrument_code: &str,
    ) -> ControlResult<PositionLimitForInstrument> {
        self.apply_temporary(instrument_code, PositionLimitForInstrument::new(instrument_code, 0))
    }

    /// An original of "no limit" deletes the limit.
    pub fn reset_position_limit_to_original(
        &self,
        instrument_code: &str,
    ) -> ControlResult<Option<PositionLimitForInstrument>> {
        self.restore(instrument_code)
    }
}
