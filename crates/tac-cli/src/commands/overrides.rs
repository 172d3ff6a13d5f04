//! `tac overrides` handlers.

use anyhow::{bail, Result};
use std::sync::Arc;

use tac_admission::TemporaryOverrides;
use tac_controls::{Override, OverrideKey};

use super::{pair, Desk};

pub fn list(desk: &Desk, db_only: bool) -> Result<()> {
    let admission = desk.admission();
    let resolver = admission.overrides();
    let all = if db_only {
        resolver.all_db_overrides_with_reasons()?
    } else {
        resolver.all_overrides_with_reasons()?
    };
    println!("override_count={}", all.len());
    for (key, value) in all {
        println!("{} {}", key, value);
    }
    Ok(())
}

pub fn set(
    desk: &Desk,
    strategy: Option<String>,
    instrument: Option<String>,
    value: &str,
) -> Result<()> {
    let value: Override = value.parse().map_err(anyhow::Error::msg)?;
    let key = match (strategy, instrument) {
        (Some(s), Some(i)) => OverrideKey::instrument_strategy(pair(&s, &i)),
        (Some(s), None) => OverrideKey::strategy(s.trim()),
        (None, Some(i)) => OverrideKey::instrument(i.trim()),
        (None, None) => bail!("must provide --strategy, --instrument or both"),
    };
    desk.admission().overrides().update_override(&key, value)?;
    println!("override_set=true key={} value={}", key, value);
    Ok(())
}

pub fn effective(desk: &Desk, strategy: &str, instrument: &str) -> Result<()> {
    let is = pair(strategy, instrument);
    let effective = desk.admission().overrides().effective_override_with_reason(&is)?;
    println!("instrument_strategy={}", is);
    println!("override={}", effective.value);
    println!("reason={}", effective.reason);
    Ok(())
}

pub fn clear_all(desk: &Desk, yes: bool) -> Result<()> {
    if !yes {
        bail!("REFUSING to delete every persisted override without --yes");
    }
    desk.admission().overrides().delete_all_overrides(true)?;
    println!("overrides_cleared=true");
    Ok(())
}

pub fn temp_reduce_only(desk: &Desk, instrument: &str) -> Result<()> {
    let temp = TemporaryOverrides::for_overrides(Arc::clone(&desk.store));
    let previous = temp.add_temporary_reduce_only_for_instrument(instrument)?;
    println!(
        "temporary_override=reduce_only instrument={} stashed={}",
        instrument, previous
    );
    Ok(())
}

pub fn temp_remove(desk: &Desk, instrument: &str) -> Result<()> {
    let temp = TemporaryOverrides::for_overrides(Arc::clone(&desk.store));
    match temp.remove_temporary_override_for_instrument(instrument)? {
        Some(restored) => println!("restored={} instrument={}", restored, instrument),
        None => println!("restored=none instrument={}", instrument),
    }
    Ok(())
}
