//! Typed view over the layered config for the control services.
//!
//! Expected shape (every list optional):
//!
//! ```yaml
//! instruments:
//!   bad: [..]          # reduce only
//!   duplicate: [..]    # reduce only
//!   ignored: [..]      # reduce only
//!   untradeable: [..]  # no trade
//!   stale: [..]
//!   active: [..]       # when present, anything else is stale
//! strategies:
//!   stale: [..]
//!   active: [..]
//! ```
//!
//! Lists are read lazily on every lookup; a malformed list fails the lookup
//! instead of reading as empty.

use anyhow::{bail, Result};
use serde_json::Value;
use std::fmt;

use crate::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};

/// Config-declared instrument categories that carry an implicit override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstrumentCategory {
    Bad,
    Duplicate,
    Ignored,
    Untradeable,
}

impl InstrumentCategory {
    pub const ALL: [InstrumentCategory; 4] = [
        InstrumentCategory::Bad,
        InstrumentCategory::Duplicate,
        InstrumentCategory::Ignored,
        InstrumentCategory::Untradeable,
    ];

    pub fn pointer(&self) -> &'static str {
        match self {
            InstrumentCategory::Bad => "/instruments/bad",
            InstrumentCategory::Duplicate => "/instruments/duplicate",
            InstrumentCategory::Ignored => "/instruments/ignored",
            InstrumentCategory::Untradeable => "/instruments/untradeable",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentCategory::Bad => "bad",
            InstrumentCategory::Duplicate => "duplicate",
            InstrumentCategory::Ignored => "ignored",
            InstrumentCategory::Untradeable => "untradeable",
        }
    }
}

impl fmt::Display for InstrumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const STALE_INSTRUMENTS: &str = "/instruments/stale";
const ACTIVE_INSTRUMENTS: &str = "/instruments/active";
const STALE_STRATEGIES: &str = "/strategies/stale";
const ACTIVE_STRATEGIES: &str = "/strategies/active";

#[derive(Debug, Clone)]
pub struct ControlsConfig {
    loaded: LoadedConfig,
}

impl ControlsConfig {
    pub fn from_loaded(loaded: LoadedConfig) -> Self {
        Self { loaded }
    }

    pub fn load(paths: &[&str]) -> Result<Self> {
        Ok(Self::from_loaded(load_layered_yaml(paths)?))
    }

    pub fn from_yaml_strings(docs: &[&str]) -> Result<Self> {
        Ok(Self::from_loaded(load_layered_yaml_from_strings(docs)?))
    }

    /// No categories, no stale lists, no universe.
    pub fn empty() -> Result<Self> {
        Self::from_yaml_strings(&[])
    }

    pub fn config_hash(&self) -> &str {
        &self.loaded.config_hash
    }

    pub fn config_json(&self) -> &Value {
        &self.loaded.config_json
    }

    pub fn instruments_in(&self, category: InstrumentCategory) -> Result<Vec<String>> {
        Ok(self.list_at(category.pointer())?.unwrap_or_default())
    }

    pub fn stale_instruments(&self) -> Result<Vec<String>> {
        Ok(self.list_at(STALE_INSTRUMENTS)?.unwrap_or_default())
    }

    pub fn stale_strategies(&self) -> Result<Vec<String>> {
        Ok(self.list_at(STALE_STRATEGIES)?.unwrap_or_default())
    }

    /// `None` when no universe is declared.
    pub fn active_instruments(&self) -> Result<Option<Vec<String>>> {
        self.list_at(ACTIVE_INSTRUMENTS)
    }

    pub fn active_strategies(&self) -> Result<Option<Vec<String>>> {
        self.list_at(ACTIVE_STRATEGIES)
    }

    /// Read every list once so a malformed config is caught at startup.
    pub fn validate(&self) -> Result<()> {
        for category in InstrumentCategory::ALL {
            self.instruments_in(category)?;
        }
        self.stale_instruments()?;
        self.stale_strategies()?;
        self.active_instruments()?;
        self.active_strategies()?;
        Ok(())
    }

    fn list_at(&self, pointer: &str) -> Result<Option<Vec<String>>> {
        match self.loaded.config_json.pointer(pointer) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item.as_str() {
                        Some(s) => out.push(s.trim().to_string()),
                        None => bail!("CONFIG_BAD_LIST {pointer}/{i}: expected string, got {item}"),
                    }
                }
                Ok(Some(out))
            }
            Some(other) => bail!("CONFIG_BAD_LIST {pointer}: expected list of strings, got {other}"),
        }
    }
}
