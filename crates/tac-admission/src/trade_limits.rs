//! Trade Limit Ledger.
//!
//! Every limit matching a scope constrains it, whatever its period: a trade
//! on `strategy/X` must fit the instrument limits of `X` and the pair limits
//! of `strategy/X`. Windows roll lazily; a limit read at `now` past its
//! window end counts from zero.
//!
//! Record / release / reserve / update / reset go through the store's atomic
//! read-modify-write, so every ledger sharing a store sees each change once,
//! however many ledgers are built on it.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use tac_controls::{
    ControlError, ControlResult, InstrumentStrategy, TradeLimit, TradeLimitScope,
};
use tac_store::TradeLimitStore;

use crate::config_source::ConfigSource;

pub struct TradeLimitLedger<S, C> {
    store: Arc<S>,
    config: Arc<C>,
}

impl<S: TradeLimitStore, C: ConfigSource> TradeLimitLedger<S, C> {
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self { store, config }
    }

    /// `min(proposed, max_trades - consumed)` over every limit on `scope`.
    /// A scope without limits is unconstrained.
    pub fn remaining_allowance(
        &self,
        scope: &TradeLimitScope,
        proposed_abs_qty: u64,
        now: DateTime<Utc>,
    ) -> ControlResult<u64> {
        Ok(self
            .store
            .list_for_scope(scope)?
            .iter()
            .map(|limit| limit.rolled(now).what_trade_is_possible(proposed_abs_qty))
            .fold(proposed_abs_qty, u64::min))
    }

    /// Allowance across the instrument limits and the pair limits.
    pub fn what_trade_is_possible(
        &self,
        instrument_strategy: &InstrumentStrategy,
        proposed_abs_qty: u64,
        now: DateTime<Utc>,
    ) -> ControlResult<u64> {
        let mut allowed = proposed_abs_qty;
        for scope in TradeLimitScope::applicable_to(instrument_strategy) {
            allowed = allowed.min(self.remaining_allowance(&scope, allowed, now)?);
        }
        Ok(allowed)
    }

    /// Count an executed trade against every matching limit.
    pub fn record_trade(
        &self,
        instrument_strategy: &InstrumentStrategy,
        abs_qty: u64,
        now: DateTime<Utc>,
    ) -> ControlResult<()> {
        self.apply_to_matching(instrument_strategy, now, |l| l.add_trade(abs_qty))?;
        debug!(instrument_strategy = %instrument_strategy, qty = abs_qty, "trade recorded");
        Ok(())
    }

    /// Give back a cancelled trade. Counters floor at zero.
    pub fn release_trade(
        &self,
        instrument_strategy: &InstrumentStrategy,
        abs_qty: u64,
        now: DateTime<Utc>,
    ) -> ControlResult<()> {
        self.apply_to_matching(instrument_strategy, now, |l| l.remove_trade(abs_qty))?;
        debug!(instrument_strategy = %instrument_strategy, qty = abs_qty, "trade released");
        Ok(())
    }

    /// Check the allowance and record it in one atomic store update.
    /// Returns the quantity reserved, possibly zero.
    pub fn reserve_trade(
        &self,
        instrument_strategy: &InstrumentStrategy,
        proposed_abs_qty: u64,
        now: DateTime<Utc>,
    ) -> ControlResult<u64> {
        let scopes = TradeLimitScope::applicable_to(instrument_strategy);
        self.store.update_matching(&scopes, now, |limits| {
            let allowed = limits
                .iter()
                .map(|l| l.what_trade_is_possible(proposed_abs_qty))
                .fold(proposed_abs_qty, u64::min);
            if allowed > 0 {
                limits.iter_mut().for_each(|l| l.add_trade(allowed));
            }
            Ok(allowed)
        })
    }

    /// Stale-filtered, as seen at `now`.
    pub fn all_limits(&self, now: DateTime<Utc>) -> ControlResult<Vec<TradeLimit>> {
        let filter = self.config.stale_filter()?;
        let limits: Vec<TradeLimit> = self
            .store
            .list_all()?
            .into_iter()
            .map(|l| l.rolled(now))
            .collect();
        Ok(filter.retain(limits))
    }

    /// `all_limits` ordered by `"<scope> <period_days>"`.
    pub fn all_limits_sorted(&self, now: DateTime<Utc>) -> ControlResult<Vec<TradeLimit>> {
        let mut limits = self.all_limits(now)?;
        limits.sort_by_key(|l| l.sort_key());
        Ok(limits)
    }

    /// Direct lookup. Not stale-filtered.
    pub fn get_limit(
        &self,
        scope: &TradeLimitScope,
        period_days: u32,
        now: DateTime<Utc>,
    ) -> ControlResult<Option<TradeLimit>> {
        Ok(self
            .store
            .get_limit(scope, period_days)?
            .map(|l| l.rolled(now)))
    }

    pub fn update_instrument_limit(
        &self,
        instrument_code: &str,
        period_days: u32,
        new_limit: u64,
        now: DateTime<Utc>,
    ) -> ControlResult<TradeLimit> {
        self.update_limit(TradeLimitScope::instrument(instrument_code), period_days, new_limit, now)
    }

    pub fn update_instrument_strategy_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
        period_days: u32,
        new_limit: u64,
        now: DateTime<Utc>,
    ) -> ControlResult<TradeLimit> {
        self.update_limit(
            TradeLimitScope::instrument_strategy(instrument_strategy.clone()),
            period_days,
            new_limit,
            now,
        )
    }

    pub fn reset_instrument_limit(
        &self,
        instrument_code: &str,
        period_days: u32,
        now: DateTime<Utc>,
    ) -> ControlResult<()> {
        self.reset_limit(&TradeLimitScope::instrument(instrument_code), period_days, now)
    }

    pub fn reset_instrument_strategy_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
        period_days: u32,
        now: DateTime<Utc>,
    ) -> ControlResult<()> {
        self.reset_limit(
            &TradeLimitScope::instrument_strategy(instrument_strategy.clone()),
            period_days,
            now,
        )
    }

    /// Zero every counter, stale scopes included.
    pub fn reset_all_limits(&self, now: DateTime<Utc>) -> ControlResult<usize> {
        let limits = self.store.list_all()?;
        let count = limits.len();
        for limit in limits {
            self.reset_limit(&limit.scope, limit.period_days, now)?;
        }
        info!(count, "all trade limits reset");
        Ok(count)
    }

    pub fn delete_limit(&self, scope: &TradeLimitScope, period_days: u32) -> ControlResult<bool> {
        let removed = self.store.delete_limit(scope, period_days)?;
        if removed {
            info!(scope = %scope, period_days, "trade limit deleted");
        }
        Ok(removed)
    }

    fn update_limit(
        &self,
        scope: TradeLimitScope,
        period_days: u32,
        new_limit: u64,
        now: DateTime<Utc>,
    ) -> ControlResult<TradeLimit> {
        if period_days == 0 {
            return Err(ControlError::Refused(format!(
                "trade limit period for {scope} must be at least one day"
            )));
        }

        let updated = self.store.upsert_limit(&scope, period_days, |existing| {
            Ok(match existing {
                Some(existing) => {
                    let mut limit = existing.rolled(now);
                    limit.max_trades = new_limit;
                    limit
                }
                None => TradeLimit::new(scope.clone(), period_days, new_limit, now),
            })
        })?;

        info!(limit = %updated, "trade limit updated");
        Ok(updated)
    }

    fn reset_limit(
        &self,
        scope: &TradeLimitScope,
        period_days: u32,
        now: DateTime<Utc>,
    ) -> ControlResult<()> {
        self.store.upsert_limit(scope, period_days, |existing| {
            let Some(mut limit) = existing else {
                return Err(ControlError::missing(format!(
                    "trade limit {scope} period_days={period_days}"
                )));
            };
            limit.reset(now);
            Ok(limit)
        })?;
        debug!(scope = %scope, period_days, "trade limit reset");
        Ok(())
    }

    fn apply_to_matching(
        &self,
        instrument_strategy: &InstrumentStrategy,
        now: DateTime<Utc>,
        change: impl FnMut(&mut TradeLimit),
    ) -> ControlResult<()> {
        let scopes = TradeLimitScope::applicable_to(instrument_strategy);
        self.store.update_matching(&scopes, now, |limits| {
            limits.iter_mut().for_each(change);
            Ok(())
        })
    }
}
