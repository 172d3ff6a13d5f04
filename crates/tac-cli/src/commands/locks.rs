//! `tac locks` handlers.

use anyhow::Result;
use std::sync::Arc;

use tac_admission::LockService;

use super::Desk;

pub fn list(desk: &Desk) -> Result<()> {
    let locked = LockService::new(Arc::clone(&desk.store)).list_locked_instruments()?;
    println!("locked_count={}", locked.len());
    for code in locked {
        println!("locked={}", code);
    }
    Ok(())
}

pub fn add(desk: &Desk, instrument: &str) -> Result<()> {
    LockService::new(Arc::clone(&desk.store)).add_lock_for_instrument(instrument)?;
    println!("locked=true instrument={}", instrument);
    Ok(())
}

pub fn remove(desk: &Desk, instrument: &str) -> Result<()> {
    LockService::new(Arc::clone(&desk.store)).remove_lock_for_instrument(instrument)?;
    println!("locked=false instrument={}", instrument);
    Ok(())
}
