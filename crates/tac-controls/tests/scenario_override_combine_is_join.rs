//! Override composition is a join on the severity order.
//!
//! GREEN when:
//! - `Default` is the identity and `NoTrade` absorbs.
//! - `combine` is commutative and associative.
//! - Folding a list gives the same answer in any order.

use proptest::prelude::*;
use tac_controls::Override;

fn any_override() -> impl Strategy<Value = Override> {
    prop_oneof![
        Just(Override::Default),
        Just(Override::ReduceOnly),
        Just(Override::NoTrade),
    ]
}

#[test]
fn severity_order_is_no_trade_over_reduce_only_over_default() {
    assert!(Override::NoTrade > Override::ReduceOnly);
    assert!(Override::ReduceOnly > Override::Default);
    assert_eq!(
        Override::ReduceOnly.combine(Override::NoTrade),
        Override::NoTrade
    );
}

#[test]
fn empty_fold_is_default() {
    assert_eq!(Override::combine_all(Vec::new()), Override::Default);
}

proptest! {
    #[test]
    fn default_is_identity(x in any_override()) {
        prop_assert_eq!(x.combine(Override::Default), x);
        prop_assert_eq!(Override::Default.combine(x), x);
    }

    #[test]
    fn no_trade_absorbs(x in any_override()) {
        prop_assert_eq!(x.combine(Override::NoTrade), Override::NoTrade);
    }

    #[test]
    fn combine_is_commutative(a in any_override(), b in any_override()) {
        prop_assert_eq!(a.combine(b), b.combine(a));
    }

    #[test]
    fn combine_is_associative(a in any_override(), b in any_override(), c in any_override()) {
        prop_assert_eq!(a.combine(b).combine(c), a.combine(b.combine(c)));
    }

    #[test]
    fn fold_order_does_not_matter(mut xs in proptest::collection::vec(any_override(), 0..8)) {
        let forward = Override::combine_all(xs.clone());
        xs.reverse();
        prop_assert_eq!(Override::combine_all(xs), forward);
    }

    #[test]
    fn override_never_flips_or_grows_a_trade(
        o in any_override(),
        position in -50i64..50,
        trade in -50i64..50,
    ) {
        let out = o.apply_to_trade(position, trade);
        prop_assert!(out == 0 || out.signum() == trade.signum());
        prop_assert!(out.unsigned_abs() <= trade.unsigned_abs());
    }
}
