//! Extreme order quantities.
//!
//! GREEN when:
//! - an order of i64::MIN contracts is rejected with InvalidOrder, no panic
//! - i64::MAX and -i64::MAX pass through every stage and are clamped normally
//! - the position limit enforcer called directly with i64::MIN does not panic
//! - extreme positions under reduce-only never overflow

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tac_admission::{OrderAdmission, PositionLimitEnforcer};
use tac_config::ControlsConfig;
use tac_controls::{ControlError, InstrumentStrategy, Order, Override, OverrideKey};
use tac_store::{OverrideStore, PositionBook, PositionLimitStore, StateStore};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn is() -> InstrumentStrategy {
    InstrumentStrategy::new("carry", "X")
}

fn admission(
    store: Arc<StateStore>,
    positions: PositionBook,
) -> OrderAdmission<StateStore, PositionBook, ControlsConfig> {
    OrderAdmission::new(
        store,
        Arc::new(positions),
        Arc::new(ControlsConfig::empty().unwrap()),
    )
}

#[test]
fn minimum_quantity_is_rejected() {
    let store = Arc::new(StateStore::in_memory());
    store.set_instrument_limit("X", 10).unwrap();
    let admission = admission(store, PositionBook::new());

    let err = admission.admit(&Order::new(is(), i64::MIN), now()).unwrap_err();
    assert!(matches!(err, ControlError::InvalidOrder(_)));

    let err = admission
        .admit_and_reserve(&Order::new(is(), i64::MIN), now())
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidOrder(_)));
}

#[test]
fn largest_quantities_are_clamped_not_overflowed() {
    let store = Arc::new(StateStore::in_memory());
    store.set_instrument_limit("X", 10).unwrap();
    let admission = admission(store, PositionBook::with_positions([(is(), 8)]));

    let buy = admission.admit(&Order::new(is(), i64::MAX), now()).unwrap();
    assert_eq!(buy.admitted.trade, 2);

    let sell = admission.admit(&Order::new(is(), -i64::MAX), now()).unwrap();
    assert_eq!(sell.admitted.trade, -18);
}

#[test]
fn unlimited_instrument_passes_largest_quantity() {
    let admission = admission(Arc::new(StateStore::in_memory()), PositionBook::new());
    let out = admission.admit(&Order::new(is(), -i64::MAX), now()).unwrap();
    assert_eq!(out.admitted.trade, -i64::MAX);
    assert!(!out.is_clamped());
}

#[test]
fn enforcer_saturates_minimum_quantity() {
    let store = Arc::new(StateStore::in_memory());
    let enforcer = PositionLimitEnforcer::new(
        Arc::clone(&store),
        Arc::new(PositionBook::new()),
        Arc::new(ControlsConfig::empty().unwrap()),
    );
    let out = enforcer
        .apply_position_limit_to_order(&Order::new(is(), i64::MIN))
        .unwrap();
    assert_eq!(out.trade, -i64::MAX);

    store.set_instrument_limit("X", 5).unwrap();
    let out = enforcer
        .apply_position_limit_to_order(&Order::new(is(), i64::MIN))
        .unwrap();
    assert_eq!(out.trade, -5);
}

#[test]
fn reduce_only_against_extreme_position() {
    let store = Arc::new(StateStore::in_memory());
    store
        .set_override(&OverrideKey::instrument("X"), Override::ReduceOnly)
        .unwrap();
    let admission = admission(store, PositionBook::with_positions([(is(), i64::MIN)]));

    let out = admission.admit(&Order::new(is(), i64::MAX), now()).unwrap();
    assert_eq!(out.admitted.trade, i64::MAX);
    let out = admission.admit(&Order::new(is(), -1), now()).unwrap();
    assert_eq!(out.admitted.trade, 0);
}
