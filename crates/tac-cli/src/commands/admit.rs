//! `tac positions` and `tac admit` handlers.

use anyhow::Result;
use chrono::Utc;

use tac_controls::Order;

use super::{pair, Desk};

pub fn set_position(desk: &Desk, strategy: &str, instrument: &str, position: i64) -> Result<()> {
    let is = pair(strategy, instrument);
    desk.store.set_position(&is, position)?;
    println!("position_set=true instrument_strategy={} position={}", is, position);
    Ok(())
}

/// Dry run: nothing is reserved against trade limits.
pub fn admit(desk: &Desk, strategy: &str, instrument: &str, qty: i64) -> Result<()> {
    let order = Order::new(pair(strategy, instrument), qty);
    let admission = desk.admission().admit(&order, Utc::now())?;
    println!("{}", admission);
    println!("clamped={}", admission.is_clamped());
    Ok(())
}
