use std::sync::Arc;
use tracing::info;

use tac_controls::ControlResult;
use tac_store::LockStore;

/// Instrument lock flags. The composer does not read them; they gate
/// operator workflows outside admission.
pub struct LockService<S> {
    store: Arc<S>,
}

impl<S: LockStore> LockService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn is_instrument_locked(&self, instrument_code: &str) -> ControlResult<bool> {
        self.store.is_locked(instrument_code)
    }

    pub fn add_lock_for_instrument(&self, instrument_code: &str) -> ControlResult<()> {
        self.store.set_lock(instrument_code)?;
        info!(instrument = instrument_code, "instrument locked");
        Ok(())
    }

    pub fn remove_lock_for_instrument(&self, instrument_code: &str) -> ControlResult<()> {
        self.store.clear_lock(instrument_code)?;
        info!(instrument = instrument_code, "instrument unlocked");
        Ok(())
    }

    /// Sorted.
    pub fn list_locked_instruments(&self) -> ControlResult<Vec<String>> {
        let mut locked = self.store.list_locked()?;
        locked.sort();
        Ok(locked)
    }
}
