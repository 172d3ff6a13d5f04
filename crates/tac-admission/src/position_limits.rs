use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use tac_controls::{
    most_conservative_order, ControlResult, InstrumentStrategy, Order, PositionLimitAndPosition,
};
use tac_store::{PositionLimitStore, PositionReader};

use crate::config_source::ConfigSource;

/// Clamps orders so no applicable position limit is exceeded.
///
/// The instrument limit is checked against the instrument position summed
/// over strategies; the pair limit against the pair position. Each clamps
/// the original order on its own and the smallest result wins.
pub struct PositionLimitEnforcer<S, P, C> {
    store: Arc<S>,
    positions: Arc<P>,
    config: Arc<C>,
}

impl<S, P, C> PositionLimitEnforcer<S, P, C>
where
    S: PositionLimitStore,
    P: PositionReader,
    C: ConfigSource,
{
    pub fn new(store: Arc<S>, positions: Arc<P>, config: Arc<C>) -> Self {
        Self {
            store,
            positions,
            config,
        }
    }

    pub fn apply_position_limit_to_order(&self, order: &Order) -> ControlResult<Order> {
        if order.is_zero() {
            return Ok(order.clone());
        }

        let instrument = self.instrument_limit_and_position(order.instrument_code())?;
        let pair = self.strategy_instrument_limit_and_position(&order.instrument_strategy)?;

        let candidates = [
            instrument.apply_position_limit_to_order(order),
            pair.apply_position_limit_to_order(order),
        ];
        let clamped = most_conservative_order(order, &candidates);

        if clamped != *order {
            debug!(
                proposed = %order,
                clamped = %clamped,
                instrument = %instrument,
                strategy = %pair,
                "position limits clamped order"
            );
        }
        Ok(clamped)
    }

    pub fn instrument_limit_and_position(
        &self,
        instrument_code: &str,
    ) -> ControlResult<PositionLimitAndPosition> {
        let limit = self.store.get_instrument_limit(instrument_code)?;
        let position = self.positions.instrument_position(instrument_code)?;
        Ok(PositionLimitAndPosition::for_instrument(limit, position))
    }

    pub fn strategy_instrument_limit_and_position(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<PositionLimitAndPosition> {
        let limit = self.store.get_strategy_instrument_limit(instrument_strategy)?;
        let position = self
            .positions
            .strategy_instrument_position(instrument_strategy)?;
        Ok(PositionLimitAndPosition::for_strategy_instrument(limit, position))
    }

    /// Smaller of the instrument and pair limits; `None` if neither is set.
    pub fn maximum_position_contracts(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<Option<u64>> {
        let instrument = self
            .store
            .get_instrument_limit(&instrument_strategy.instrument_code)?;
        let pair = self.store.get_strategy_instrument_limit(instrument_strategy)?;
        Ok(instrument.minimum_position_limit(&pair))
    }

    /// Every instrument with a limit or a position, stale-filtered.
    pub fn all_instrument_limits_and_positions(&self) -> ControlResult<Vec<PositionLimitAndPosition>> {
        let filter = self.config.stale_filter()?;
        let codes: BTreeSet<String> = self
            .store
            .instruments_with_limits()?
            .into_iter()
            .chain(self.positions.instruments_with_positions()?)
            .collect();

        let mut out = Vec::with_capacity(codes.len());
        for code in filter.retain_instruments(codes.into_iter().collect()) {
            out.push(self.instrument_limit_and_position(&code)?);
        }
        Ok(out)
    }

    /// Every pair with a limit or a position, stale-filtered.
    pub fn all_strategy_instrument_limits_and_positions(
        &self,
    ) -> ControlResult<Vec<PositionLimitAndPosition>> {
        let filter = self.config.stale_filter()?;
        let pairs: BTreeSet<InstrumentStrategy> = self
            .store
            .instrument_strategies_with_limits()?
            .into_iter()
            .chain(self.positions.instrument_strategies_with_positions()?)
            .collect();

        let mut out = Vec::with_capacity(pairs.len());
        for is in filter.retain(pairs.into_iter().collect()) {
            out.push(self.strategy_instrument_limit_and_position(&is)?);
        }
        Ok(out)
    }

    pub fn set_instrument_limit(&self, instrument_code: &str, position_limit: u64) -> ControlResult<()> {
        self.store.set_instrument_limit(instrument_code, position_limit)?;
        info!(instrument = instrument_code, position_limit, "instrument position limit set");
        Ok(())
    }

    pub fn set_strategy_instrument_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
        position_limit: u64,
    ) -> ControlResult<()> {
        self.store
            .set_strategy_instrument_limit(instrument_strategy, position_limit)?;
        info!(
            instrument_strategy = %instrument_strategy,
            position_limit,
            "strategy position limit set"
        );
        Ok(())
    }

    pub fn delete_instrument_limit(&self, instrument_code: &str) -> ControlResult<()> {
        self.store.delete_instrument_limit(instrument_code)?;
        info!(instrument = instrument_code, "instrument position limit deleted");
        Ok(())
    }

    pub fn delete_strategy_instrument_limit(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<()> {
        self.store
            .delete_strategy_instrument_limit(instrument_strategy)?;
        info!(instrument_strategy = %instrument_strategy, "strategy position limit deleted");
        Ok(())
    }
}
