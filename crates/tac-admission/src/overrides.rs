use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use tac_controls::{
    ControlError, ControlResult, InstrumentStrategy, Override, OverrideKey, OverrideWithReason,
};
use tac_store::OverrideStore;

use crate::config_source::{ConfigSource, CATEGORY_OVERRIDES};

/// Effective override = combine(persisted overrides, config categories).
///
/// Persisted overrides may be attached to a strategy, an instrument or a
/// pair; the persisted value for a pair is the join of all three.
pub struct OverrideResolver<S, C> {
    store: Arc<S>,
    config: Arc<C>,
}

impl<S: OverrideStore, C: ConfigSource> OverrideResolver<S, C> {
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self { store, config }
    }

    pub fn effective_override(&self, instrument_strategy: &InstrumentStrategy) -> ControlResult<Override> {
        Ok(self.effective_override_with_reason(instrument_strategy)?.value)
    }

    /// On equal severity the config reason is reported.
    pub fn effective_override_with_reason(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<OverrideWithReason> {
        let db = self.db_override(instrument_strategy)?;
        Ok(match self.config_override(&instrument_strategy.instrument_code)? {
            Some(config) => db.combine(config),
            None => db,
        })
    }

    /// Join of the strategy, instrument and pair entries. Missing entries are
    /// `Default`.
    pub fn db_override(&self, instrument_strategy: &InstrumentStrategy) -> ControlResult<OverrideWithReason> {
        let mut value = Override::Default;
        for key in OverrideKey::applicable_to(instrument_strategy) {
            value = value.combine(self.store.get_override(&key)?);
        }
        Ok(OverrideWithReason::in_database(value))
    }

    /// Most severe config category containing the instrument, if any.
    pub fn config_override(&self, instrument_code: &str) -> ControlResult<Option<OverrideWithReason>> {
        let mut out: Option<OverrideWithReason> = None;
        for (category, value, reason) in CATEGORY_OVERRIDES {
            let listed = self.config.list_instruments_in(category)?;
            if listed.iter().any(|code| code == instrument_code) {
                let candidate = OverrideWithReason::new(value, reason);
                out = Some(match out {
                    Some(prev) => prev.combine(candidate),
                    None => candidate,
                });
            }
        }
        Ok(out)
    }

    pub fn override_for_key(&self, key: &OverrideKey) -> ControlResult<Override> {
        self.store.get_override(key)
    }

    /// Persisted overrides only, stale-filtered, sorted by key.
    pub fn all_db_overrides_with_reasons(&self) -> ControlResult<Vec<(OverrideKey, OverrideWithReason)>> {
        let filter = self.config.stale_filter()?;
        let entries = self
            .store
            .list_all()?
            .into_iter()
            .map(|(key, value)| (key, OverrideWithReason::in_database(value)))
            .collect::<BTreeMap<_, _>>();
        Ok(filter.retain(entries.into_iter().collect()))
    }

    /// Persisted overrides merged with the instrument overrides implied by
    /// config categories. Most severe wins per key; on a tie the config
    /// reason is kept. Stale-filtered, sorted by key.
    pub fn all_overrides_with_reasons(&self) -> ControlResult<Vec<(OverrideKey, OverrideWithReason)>> {
        let filter = self.config.stale_filter()?;
        let mut merged: BTreeMap<OverrideKey, OverrideWithReason> = self
            .store
            .list_all()?
            .into_iter()
            .map(|(key, value)| (key, OverrideWithReason::in_database(value)))
            .collect();

        for (category, value, reason) in CATEGORY_OVERRIDES {
            for code in self.config.list_instruments_in(category)? {
                let key = OverrideKey::instrument(code);
                let candidate = OverrideWithReason::new(value, reason);
                let next = match merged.remove(&key) {
                    Some(existing) => existing.combine(candidate),
                    None => candidate,
                };
                merged.insert(key, next);
            }
        }

        Ok(filter.retain(merged.into_iter().collect()))
    }

    pub fn update_override(&self, key: &OverrideKey, value: Override) -> ControlResult<()> {
        self.store.set_override(key, value)?;
        info!(key = %key, value = %value, "override updated");
        Ok(())
    }

    pub fn delete_all_overrides(&self, confirm: bool) -> ControlResult<()> {
        if !confirm {
            let err = ControlError::Refused(
                "deleting every override requires confirmation".to_string(),
            );
            warn!(%err, "delete all overrides refused");
            return Err(err);
        }
        self.store.delete_all(true)?;
        warn!("all persisted overrides deleted");
        Ok(())
    }
}
