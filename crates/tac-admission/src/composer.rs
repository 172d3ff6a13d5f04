//! Order Admission Composer.
//!
//! override -> position limits -> trade limits. Each step only shrinks the
//! order and none may flip it; the admitted order is the most conservative
//! of all stages.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use tac_controls::{most_conservative_order, ControlResult, Order, OverrideWithReason};
use tac_store::{OverrideStore, PositionLimitStore, PositionReader, TradeLimitStore};

use crate::config_source::ConfigSource;
use crate::overrides::OverrideResolver;
use crate::position_limits::PositionLimitEnforcer;
use crate::trade_limits::TradeLimitLedger;

/// Every stage of one admission decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admission {
    pub proposed: Order,
    pub effective_override: OverrideWithReason,
    /// Signed pair position the override was applied against.
    pub position: i64,
    pub after_override: Order,
    pub after_position_limits: Order,
    pub admitted: Order,
}

impl Admission {
    pub fn is_clamped(&self) -> bool {
        self.admitted != self.proposed
    }
}

impl fmt::Display for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "proposed:              {}", self.proposed)?;
        writeln!(f, "position:              {:+}", self.position)?;
        writeln!(f, "override:              {}", self.effective_override)?;
        writeln!(f, "after override:        {:+}", self.after_override.trade)?;
        writeln!(f, "after position limits: {:+}", self.after_position_limits.trade)?;
        write!(f, "admitted:              {:+}", self.admitted.trade)
    }
}

pub struct OrderAdmission<S, P, C> {
    positions: Arc<P>,
    overrides: OverrideResolver<S, C>,
    position_limits: PositionLimitEnforcer<S, P, C>,
    trade_limits: TradeLimitLedger<S, C>,
}

impl<S, P, C> OrderAdmission<S, P, C>
where
    S: OverrideStore + PositionLimitStore + TradeLimitStore,
    P: PositionReader,
    C: ConfigSource,
{
    pub fn new(store: Arc<S>, positions: Arc<P>, config: Arc<C>) -> Self {
        Self {
            overrides: OverrideResolver::new(Arc::clone(&store), Arc::clone(&config)),
            position_limits: PositionLimitEnforcer::new(
                Arc::clone(&store),
                Arc::clone(&positions),
                Arc::clone(&config),
            ),
            trade_limits: TradeLimitLedger::new(store, config),
            positions,
        }
    }

    pub fn overrides(&self) -> &OverrideResolver<S, C> {
        &self.overrides
    }

    pub fn position_limits(&self) -> &PositionLimitEnforcer<S, P, C> {
        &self.position_limits
    }

    pub fn trade_limits(&self) -> &TradeLimitLedger<S, C> {
        &self.trade_limits
    }

    /// Dry run: nothing is recorded against the trade limits.
    pub fn admit(&self, order: &Order, now: DateTime<Utc>) -> ControlResult<Admission> {
        self.compose(order, |after_limits| {
            self.trade_limits.what_trade_is_possible(
                &after_limits.instrument_strategy,
                after_limits.abs_qty(),
                now,
            )
        })
    }

    /// Admit and reserve the admitted quantity against the trade limits in
    /// one step, so concurrent admissions cannot overshoot a limit.
    pub fn admit_and_reserve(&self, order: &Order, now: DateTime<Utc>) -> ControlResult<Admission> {
        self.compose(order, |after_limits| {
            self.trade_limits.reserve_trade(
                &after_limits.instrument_strategy,
                after_limits.abs_qty(),
                now,
            )
        })
    }

    fn compose(
        &self,
        order: &Order,
        trade_allowance: impl FnOnce(&Order) -> ControlResult<u64>,
    ) -> ControlResult<Admission> {
        order.validate()?;
        let is = &order.instrument_strategy;

        let effective_override = self.overrides.effective_override_with_reason(is)?;
        let position = self.positions.strategy_instrument_position(is)?;
        let after_override =
            order.replace_trade(effective_override.value.apply_to_trade(position, order.trade));

        let after_position_limits = self
            .position_limits
            .apply_position_limit_to_order(&after_override)?;

        let allowance = if after_position_limits.is_zero() {
            0
        } else {
            trade_allowance(&after_position_limits)?
        };
        let after_trade_limits = after_position_limits.with_abs_cap(allowance);

        let admitted = most_conservative_order(
            order,
            &[
                after_override.clone(),
                after_position_limits.clone(),
                after_trade_limits,
            ],
        );

        let admission = Admission {
            proposed: order.clone(),
            effective_override,
            position,
            after_override,
            after_position_limits,
            admitted,
        };

        if admission.is_clamped() {
            info!(
                proposed = %admission.proposed,
                admitted = admission.admitted.trade,
                after_override = admission.after_override.trade,
                after_position_limits = admission.after_position_limits.trade,
                override_reason = %admission.effective_override,
                "order clamped"
            );
        } else {
            debug!(order = %admission.proposed, "order admitted unchanged");
        }
        Ok(admission)
    }
}
