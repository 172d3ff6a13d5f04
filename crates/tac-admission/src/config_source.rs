use tac_config::{ControlsConfig, InstrumentCategory};
use tac_controls::{ControlError, ControlResult, Override, StaleFilter};

/// Configuration lists the control services read. Lists are fetched on every
/// call so the services always see the current configuration.
pub trait ConfigSource {
    fn list_bad_instruments(&self) -> ControlResult<Vec<String>>;
    fn list_duplicate_instruments(&self) -> ControlResult<Vec<String>>;
    fn list_ignored_instruments(&self) -> ControlResult<Vec<String>>;
    fn list_untradeable_instruments(&self) -> ControlResult<Vec<String>>;
    fn list_stale_instruments(&self) -> ControlResult<Vec<String>>;
    fn list_stale_strategies(&self) -> ControlResult<Vec<String>>;

    /// `None` when no instrument universe is declared.
    fn active_instruments(&self) -> ControlResult<Option<Vec<String>>> {
        Ok(None)
    }

    /// `None` when no strategy universe is declared.
    fn active_strategies(&self) -> ControlResult<Option<Vec<String>>> {
        Ok(None)
    }

    fn list_instruments_in(&self, category: InstrumentCategory) -> ControlResult<Vec<String>> {
        match category {
            InstrumentCategory::Bad => self.list_bad_instruments(),
            InstrumentCategory::Duplicate => self.list_duplicate_instruments(),
            InstrumentCategory::Ignored => self.list_ignored_instruments(),
            InstrumentCategory::Untradeable => self.list_untradeable_instruments(),
        }
    }

    fn stale_filter(&self) -> ControlResult<StaleFilter> {
        let mut filter = StaleFilter::new(self.list_stale_instruments()?, self.list_stale_strategies()?);
        if let Some(active) = self.active_instruments()? {
            filter = filter.with_active_instruments(active);
        }
        if let Some(active) = self.active_strategies()? {
            filter = filter.with_active_strategies(active);
        }
        Ok(filter)
    }
}

/// Config category -> implied override and the reason reported for it.
pub const CATEGORY_OVERRIDES: [(InstrumentCategory, Override, &str); 4] = [
    (InstrumentCategory::Bad, Override::ReduceOnly, "bad_instrument in config"),
    (InstrumentCategory::Duplicate, Override::ReduceOnly, "duplicate_instrument in config"),
    (InstrumentCategory::Ignored, Override::ReduceOnly, "ignore_instruments in config"),
    (InstrumentCategory::Untradeable, Override::NoTrade, "trading_restrictions in config"),
];

fn config_error(e: anyhow::Error) -> ControlError {
    ControlError::Configuration(format!("{e:#}"))
}

impl ConfigSource for ControlsConfig {
    fn list_bad_instruments(&self) -> ControlResult<Vec<String>> {
        self.instruments_in(InstrumentCategory::Bad).map_err(config_error)
    }

    fn list_duplicate_instruments(&self) -> ControlResult<Vec<String>> {
        self.instruments_in(InstrumentCategory::Duplicate).map_err(config_error)
    }

    fn list_ignored_instruments(&self) -> ControlResult<Vec<String>> {
        self.instruments_in(InstrumentCategory::Ignored).map_err(config_error)
    }

    fn list_untradeable_instruments(&self) -> ControlResult<Vec<String>> {
        self.instruments_in(InstrumentCategory::Untradeable).map_err(config_error)
    }

    fn list_stale_instruments(&self) -> ControlResult<Vec<String>> {
        self.stale_instruments().map_err(config_error)
    }

    fn list_stale_strategies(&self) -> ControlResult<Vec<String>> {
        self.stale_strategies().map_err(config_error)
    }

    fn active_instruments(&self) -> ControlResult<Option<Vec<String>>> {
        ControlsConfig::active_instruments(self).map_err(config_error)
    }

    fn active_strategies(&self) -> ControlResult<Option<Vec<String>>> {
        ControlsConfig::active_strategies(self).map_err(config_error)
    }
}
