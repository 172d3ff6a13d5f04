//! Command handler modules for the `tac` CLI.
//!
//! Shared wiring (state file + layered config) lives here.
//! Command-specific logic lives in the submodules.

pub mod admit;
pub mod limits;
pub mod locks;
pub mod overrides;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use tac_admission::OrderAdmission;
use tac_config::{report_unused_keys, ControlsConfig, UnusedKeyPolicy};
use tac_controls::InstrumentStrategy;
use tac_store::StateStore;

/// State snapshot plus controls config, opened once per invocation.
///
/// The state file doubles as the position source so `positions set` and
/// `admit` see the same book.
pub struct Desk {
    pub store: Arc<StateStore>,
    pub config: Arc<ControlsConfig>,
}

pub type DeskAdmission = OrderAdmission<StateStore, StateStore, ControlsConfig>;

impl Desk {
    pub fn open(state_path: &Path, config_paths: &[String]) -> Result<Self> {
        let config = if config_paths.is_empty() {
            ControlsConfig::empty()?
        } else {
            let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
            ControlsConfig::load(&path_refs)?
        };
        config.validate()?;
        warn_unused_keys(&config)?;

        let store = StateStore::open(state_path)
            .with_context(|| format!("open state failed: {}", state_path.display()))?;

        Ok(Self {
            store: Arc::new(store),
            config: Arc::new(config),
        })
    }

    pub fn admission(&self) -> DeskAdmission {
        OrderAdmission::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.config),
        )
    }
}

fn warn_unused_keys(config: &ControlsConfig) -> Result<()> {
    let report = report_unused_keys(config.config_json(), UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        eprintln!(
            "WARN: CONFIG_UNUSED_KEYS unused_leaf_keys={}",
            report.unused_leaf_pointers.len()
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            eprintln!("  unused={}", p);
        }
        let extra = report.unused_leaf_pointers.len().saturating_sub(50);
        if extra > 0 {
            eprintln!("  ... and {} more", extra);
        }
    }
    Ok(())
}

pub fn pair(strategy: &str, instrument: &str) -> InstrumentStrategy {
    InstrumentStrategy::new(strategy.trim(), instrument.trim())
}
