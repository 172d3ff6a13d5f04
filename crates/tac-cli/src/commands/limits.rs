//! `tac position-limits` and `tac trade-limits` handlers.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;

use tac_admission::TemporaryCloses;

use super::{pair, Desk};

fn limit_str(limit: Option<u64>) -> String {
    limit.map_or_else(|| "none".to_string(), |n| n.to_string())
}

// ---------------------------------------------------------------------------
// position limits
// ---------------------------------------------------------------------------

pub fn position_list(desk: &Desk) -> Result<()> {
    let admission = desk.admission();
    let enforcer = admission.position_limits();
    for row in enforcer.all_instrument_limits_and_positions()? {
        println!("instrument {}", row);
    }
    for row in enforcer.all_strategy_instrument_limits_and_positions()? {
        println!("strategy {}", row);
    }
    Ok(())
}

pub fn position_set_instrument(desk: &Desk, instrument: &str, limit: u64) -> Result<()> {
    desk.admission()
        .position_limits()
        .set_instrument_limit(instrument.trim(), limit)?;
    println!("position_limit_set=true instrument={} limit={}", instrument, limit);
    Ok(())
}

pub fn position_set_strategy(desk: &Desk, strategy: &str, instrument: &str, limit: u64) -> Result<()> {
    let is = pair(strategy, instrument);
    desk.admission()
        .position_limits()
        .set_strategy_instrument_limit(&is, limit)?;
    println!("position_limit_set=true instrument_strategy={} limit={}", is, limit);
    Ok(())
}

pub fn position_delete_instrument(desk: &Desk, instrument: &str) -> Result<()> {
    desk.admission()
        .position_limits()
        .delete_instrument_limit(instrument.trim())?;
    println!("position_limit_deleted=true instrument={}", instrument);
    Ok(())
}

pub fn position_delete_strategy(desk: &Desk, strategy: &str, instrument: &str) -> Result<()> {
    let is = pair(strategy, instrument);
    desk.admission()
        .position_limits()
        .delete_strategy_instrument_limit(&is)?;
    println!("position_limit_deleted=true instrument_strategy={}", is);
    Ok(())
}

pub fn temp_close(desk: &Desk, instrument: &str) -> Result<()> {
    let closes = TemporaryCloses::for_position_limits(Arc::clone(&desk.store));
    let original = closes.temporarily_set_position_limit_to_zero(instrument.trim())?;
    println!(
        "temporary_close=true instrument={} stashed_limit={}",
        instrument,
        limit_str(original.position_limit)
    );
    Ok(())
}

pub fn temp_reopen(desk: &Desk, instrument: &str) -> Result<()> {
    let closes = TemporaryCloses::for_position_limits(Arc::clone(&desk.store));
    match closes.reset_position_limit_to_original(instrument.trim())? {
        Some(restored) => println!(
            "restored_limit={} instrument={}",
            limit_str(restored.position_limit),
            instrument
        ),
        None => println!("restored_limit=nothing_stashed instrument={}", instrument),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// trade limits
// ---------------------------------------------------------------------------

pub fn trade_list(desk: &Desk) -> Result<()> {
    let limits = desk.admission().trade_limits().all_limits_sorted(Utc::now())?;
    println!("trade_limit_count={}", limits.len());
    for limit in limits {
        println!("{}", limit);
    }
    Ok(())
}

pub fn trade_set_instrument(
    desk: &Desk,
    instrument: &str,
    period_days: u32,
    max_trades: u64,
) -> Result<()> {
    let limit = desk.admission().trade_limits().update_instrument_limit(
        instrument.trim(),
        period_days,
        max_trades,
        Utc::now(),
    )?;
    println!("trade_limit_set=true {}", limit);
    Ok(())
}

pub fn trade_set_strategy(
    desk: &Desk,
    strategy: &str,
    instrument: &str,
    period_days: u32,
    max_trades: u64,
) -> Result<()> {
    let limit = desk.admission().trade_limits().update_instrument_strategy_limit(
        &pair(strategy, instrument),
        period_days,
        max_trades,
        Utc::now(),
    )?;
    println!("trade_limit_set=true {}", limit);
    Ok(())
}

pub fn trade_reset_instrument(desk: &Desk, instrument: &str, period_days: u32) -> Result<()> {
    desk.admission()
        .trade_limits()
        .reset_instrument_limit(instrument.trim(), period_days, Utc::now())?;
    println!(
        "trade_limit_reset=true instrument={} period_days={}",
        instrument, period_days
    );
    Ok(())
}

pub fn trade_reset_strategy(
    desk: &Desk,
    strategy: &str,
    instrument: &str,
    period_days: u32,
) -> Result<()> {
    let is = pair(strategy, instrument);
    desk.admission()
        .trade_limits()
        .reset_instrument_strategy_limit(&is, period_days, Utc::now())?;
    println!(
        "trade_limit_reset=true instrument_strategy={} period_days={}",
        is, period_days
    );
    Ok(())
}

pub fn trade_reset_all(desk: &Desk) -> Result<()> {
    let count = desk.admission().trade_limits().reset_all_limits(Utc::now())?;
    println!("trade_limits_reset={}", count);
    Ok(())
}
