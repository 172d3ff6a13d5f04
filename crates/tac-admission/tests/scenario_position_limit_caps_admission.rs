//! Position limits through the composer.
//!
//! GREEN when:
//! - limit 10, position 8, proposed +5 is admitted as +2
//! - the tighter of the instrument and strategy limits wins
//! - admitted |position + trade| never exceeds the smaller finite limit
//! - the admitted order never flips sign

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use tac_admission::OrderAdmission;
use tac_config::ControlsConfig;
use tac_controls::{InstrumentStrategy, Order, OverrideKey, Override};
use tac_store::{OverrideStore, PositionBook, PositionLimitStore, StateStore};

type Admission = OrderAdmission<StateStore, PositionBook, ControlsConfig>;

fn setup() -> (Arc<StateStore>, Arc<PositionBook>, Admission) {
    let store = Arc::new(StateStore::in_memory());
    let positions = Arc::new(PositionBook::new());
    let config = Arc::new(ControlsConfig::empty().unwrap());
    let admission = OrderAdmission::new(Arc::clone(&store), Arc::clone(&positions), config);
    (store, positions, admission)
}

#[test]
fn instrument_limit_caps_buy_at_headroom() {
    let (store, positions, admission) = setup();
    let is = InstrumentStrategy::new("carry", "X");
    store.set_instrument_limit("X", 10).unwrap();
    positions.set_position(is.clone(), 8);

    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    let out = admission.admit(&Order::new(is, 5), now).unwrap();

    assert_eq!(out.after_position_limits.trade, 2);
    assert_eq!(out.admitted.trade, 2);
    assert!(out.is_clamped());
}

#[test]
fn instrument_limit_counts_every_strategy() {
    let (store, positions, admission) = setup();
    store.set_instrument_limit("X", 10).unwrap();
    positions.set_position(InstrumentStrategy::new("carry", "X"), 6);
    positions.set_position(InstrumentStrategy::new("trend", "X"), 3);

    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    let out = admission
        .admit(&Order::new(InstrumentStrategy::new("carry", "X"), 4), now)
        .unwrap();
    assert_eq!(out.admitted.trade, 1);
}

#[test]
fn tighter_strategy_limit_wins() {
    let (store, positions, admission) = setup();
    let is = InstrumentStrategy::new("carry", "X");
    store.set_instrument_limit("X", 10).unwrap();
    store.set_strategy_instrument_limit(&is, 3).unwrap();
    positions.set_position(is.clone(), 1);

    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    let out = admission.admit(&Order::new(is.clone(), 5), now).unwrap();
    assert_eq!(out.admitted.trade, 2);

    assert_eq!(
        admission
            .position_limits()
            .maximum_position_contracts(&is)
            .unwrap(),
        Some(3)
    );
}

#[test]
fn breached_position_only_reduces() {
    let (store, positions, admission) = setup();
    let is = InstrumentStrategy::new("carry", "X");
    store.set_instrument_limit("X", 5).unwrap();
    positions.set_position(is.clone(), 8);

    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    assert_eq!(admission.admit(&Order::new(is.clone(), 1), now).unwrap().admitted.trade, 0);
    assert_eq!(admission.admit(&Order::new(is, -3), now).unwrap().admitted.trade, -3);
}

#[test]
fn zero_order_passes_untouched() {
    let (store, _positions, admission) = setup();
    store.set_instrument_limit("X", 0).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    let out = admission
        .admit(&Order::new(InstrumentStrategy::new("carry", "X"), 0), now)
        .unwrap();
    assert!(out.admitted.is_zero());
    assert!(!out.is_clamped());
}

fn any_override() -> impl Strategy<Value = Override> {
    prop_oneof![
        Just(Override::Default),
        Just(Override::ReduceOnly),
        Just(Override::NoTrade),
    ]
}

proptest! {
    #[test]
    fn admitted_position_stays_within_both_limits(
        l1 in 0u64..50,
        l2 in 0u64..50,
        position_frac in -100i64..=100,
        proposed in -200i64..200,
    ) {
        let (store, positions, admission) = setup();
        let is = InstrumentStrategy::new("carry", "X");
        store.set_instrument_limit("X", l1).unwrap();
        store.set_strategy_instrument_limit(&is, l2).unwrap();

        let bound = l1.min(l2) as i64;
        let position = position_frac * bound / 100;
        positions.set_position(is.clone(), position);

        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let out = admission.admit(&Order::new(is, proposed), now).unwrap();

        prop_assert!((position + out.admitted.trade).abs() <= bound);
    }

    #[test]
    fn admitted_sign_never_flips(
        ov in any_override(),
        limit in proptest::option::of(0u64..20),
        position in -30i64..30,
        proposed in -40i64..40,
    ) {
        let (store, positions, admission) = setup();
        let is = InstrumentStrategy::new("carry", "X");
        store.set_override(&OverrideKey::instrument_strategy(is.clone()), ov).unwrap();
        if let Some(limit) = limit {
            store.set_instrument_limit("X", limit).unwrap();
        }
        positions.set_position(is.clone(), position);

        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let out = admission.admit(&Order::new(is, proposed), now).unwrap();

        let admitted = out.admitted.trade;
        prop_assert!(admitted == 0 || admitted.signum() == proposed.signum());
        prop_assert!(admitted.abs() <= proposed.abs());
    }
}
