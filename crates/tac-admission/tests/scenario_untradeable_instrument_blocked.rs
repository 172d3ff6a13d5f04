//! Effective override resolution.
//!
//! GREEN when:
//! - an untradeable instrument resolves to no_trade and admits nothing
//! - the persisted value for a pair joins strategy, instrument and pair entries
//! - config categories fold by severity, whatever order they are listed in
//! - a failing config lookup propagates instead of allowing the trade

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tac_admission::{ConfigSource, OrderAdmission, OverrideResolver};
use tac_config::ControlsConfig;
use tac_controls::{
    ControlError, ControlResult, InstrumentStrategy, Order, Override, OverrideKey,
};
use tac_store::{OverrideStore, PositionBook, StateStore};

fn config(yaml: &str) -> Arc<ControlsConfig> {
    Arc::new(ControlsConfig::from_yaml_strings(&[yaml]).unwrap())
}

#[test]
fn untradeable_instrument_admits_nothing() {
    let store = Arc::new(StateStore::in_memory());
    let positions = Arc::new(PositionBook::new());
    let cfg = config("instruments:\n  untradeable: [\"Y\"]\n");
    let admission = OrderAdmission::new(store, positions, cfg);

    let is = InstrumentStrategy::new("carry", "Y");
    let eff = admission
        .overrides()
        .effective_override_with_reason(&is)
        .unwrap();
    assert_eq!(eff.value, Override::NoTrade);
    assert_eq!(eff.reason, "trading_restrictions in config");

    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    for proposed in [7, -3, 1] {
        let out = admission.admit(&Order::new(is.clone(), proposed), now).unwrap();
        assert_eq!(out.admitted.trade, 0);
        assert_eq!(out.after_override.trade, 0);
    }
}

#[test]
fn persisted_value_joins_all_three_keys() {
    let store = Arc::new(StateStore::in_memory());
    let resolver = OverrideResolver::new(Arc::clone(&store), config("{}"));
    let is = InstrumentStrategy::new("carry", "X");

    assert_eq!(resolver.effective_override(&is).unwrap(), Override::Default);

    store
        .set_override(&OverrideKey::strategy("carry"), Override::ReduceOnly)
        .unwrap();
    assert_eq!(resolver.effective_override(&is).unwrap(), Override::ReduceOnly);
    assert_eq!(
        resolver
            .effective_override(&InstrumentStrategy::new("trend", "X"))
            .unwrap(),
        Override::Default
    );

    store
        .set_override(&OverrideKey::instrument_strategy(is.clone()), Override::NoTrade)
        .unwrap();
    let eff = resolver.effective_override_with_reason(&is).unwrap();
    assert_eq!(eff.value, Override::NoTrade);
    assert_eq!(eff.reason, "in database");
}

#[test]
fn config_categories_fold_by_severity() {
    let forwards = config("instruments:\n  bad: [\"Z\"]\n  untradeable: [\"Z\"]\n");
    let backwards = config("instruments:\n  untradeable: [\"Z\"]\n  ignored: [\"Z\"]\n  duplicate: [\"Z\"]\n");

    for cfg in [forwards, backwards] {
        let resolver = OverrideResolver::new(Arc::new(StateStore::in_memory()), cfg);
        let got = resolver.config_override("Z").unwrap().unwrap();
        assert_eq!(got.value, Override::NoTrade);
    }

    let resolver = OverrideResolver::new(
        Arc::new(StateStore::in_memory()),
        config("instruments:\n  duplicate: [\"Z\"]\n"),
    );
    assert_eq!(
        resolver.config_override("Z").unwrap().unwrap().reason,
        "duplicate_instrument in config"
    );
    assert_eq!(resolver.config_override("OTHER").unwrap(), None);
}

#[test]
fn db_no_trade_beats_config_reduce_only() {
    let store = Arc::new(StateStore::in_memory());
    store
        .set_override(&OverrideKey::instrument("X"), Override::NoTrade)
        .unwrap();
    let resolver = OverrideResolver::new(store, config("instruments:\n  bad: [\"X\"]\n"));

    let eff = resolver
        .effective_override_with_reason(&InstrumentStrategy::new("carry", "X"))
        .unwrap();
    assert_eq!(eff.value, Override::NoTrade);
    assert_eq!(eff.reason, "in database");
}

struct BrokenConfig;

impl ConfigSource for BrokenConfig {
    fn list_bad_instruments(&self) -> ControlResult<Vec<String>> {
        Ok(vec![])
    }
    fn list_duplicate_instruments(&self) -> ControlResult<Vec<String>> {
        Ok(vec![])
    }
    fn list_ignored_instruments(&self) -> ControlResult<Vec<String>> {
        Ok(vec![])
    }
    fn list_untradeable_instruments(&self) -> ControlResult<Vec<String>> {
        Err(ControlError::Configuration("restrictions unavailable".into()))
    }
    fn list_stale_instruments(&self) -> ControlResult<Vec<String>> {
        Ok(vec![])
    }
    fn list_stale_strategies(&self) -> ControlResult<Vec<String>> {
        Ok(vec![])
    }
}

#[test]
fn config_failure_blocks_admission() {
    let admission = OrderAdmission::new(
        Arc::new(StateStore::in_memory()),
        Arc::new(PositionBook::new()),
        Arc::new(BrokenConfig),
    );
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    let err = admission
        .admit(&Order::new(InstrumentStrategy::new("carry", "X"), 1), now)
        .unwrap_err();
    assert!(matches!(err, ControlError::Configuration(_)));
}

#[test]
fn malformed_config_list_surfaces_as_configuration_error() {
    let resolver = OverrideResolver::new(
        Arc::new(StateStore::in_memory()),
        config("instruments:\n  bad: X\n"),
    );
    let err = resolver
        .effective_override(&InstrumentStrategy::new("carry", "X"))
        .unwrap_err();
    match err {
        ControlError::Configuration(msg) => assert!(msg.contains("CONFIG_BAD_LIST")),
        other => panic!("unexpected error: {other}"),
    }
}
