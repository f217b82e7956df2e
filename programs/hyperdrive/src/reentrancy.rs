//! Reentrancy guard using RAII
//!
//! The lock is released when the guard goes out of scope, on every exit
//! path: normal return, early return and error propagation.
//! All pool access while the lock is held goes through the guard.

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::state::Pool;

/// RAII reentrancy guard with proxy access to the pool
///
/// The engine holds one around every call into the yield source, so a
/// yield source that calls back into the pool finds it locked.
pub struct ReentrancyGuard<'a> {
  /// Proxy access to the locked pool
  pub pool: &'a mut Pool,
}

impl<'a> ReentrancyGuard<'a> {
  /// Acquire the lock
  ///
  /// # Returns
  /// * `Ok(ReentrancyGuard)` - Lock acquired
  /// * `Err(HyperdriveError::Reentrancy)` - Lock already held
  pub fn new(pool: &'a mut Pool) -> Result<Self> {
    require!(!pool.locked, HyperdriveError::Reentrancy);

    pool.locked = true;
    msg!("Reentrancy lock acquired");

    Ok(Self { pool })
  }
}

impl<'a> Drop for ReentrancyGuard<'a> {
  fn drop(&mut self) {
    self.pool.locked = false;
    msg!("Reentrancy lock released");
  }
}
