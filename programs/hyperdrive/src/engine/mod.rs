//! The pool's state machine
//!
//! Every operation takes the current time and a `YieldSource` explicitly and
//! never touches accounts or the clock itself. Operations run on a staged
//! copy of the pool and commit only when they succeed.

pub mod checkpoint;
pub mod liquidity;
pub mod long;
pub mod short;

use anchor_lang::prelude::*;

use crate::constants::ONE;
use crate::error::HyperdriveError;
use crate::invariants::{
  assert_effective_share_reserves_above_minimum, assert_solvency, assert_withdrawal_ready_within_supply,
};
use crate::math::{
  calculate_effective_share_reserves, calculate_idle_share_reserves, calculate_lp_share_price,
  calculate_present_value, calculate_spot_apr, calculate_spot_price, calculate_time_remaining_scaled,
  PresentValueParams,
};
use crate::reentrancy::ReentrancyGuard;
use crate::state::{AssetId, AssetKind, Pool};

/// Where the pool's base is held and grows
///
/// Base amounts and prices are 18-decimal fixed point.
pub trait YieldSource {
  /// Base per vault share
  fn vault_share_price(&self) -> Result<u128>;

  /// Moves `base` in from the trader and returns the vault shares minted
  fn deposit(&mut self, base: u128) -> Result<u128>;

  /// Redeems `shares` out to the trader and returns the base paid
  fn withdraw(&mut self, shares: u128) -> Result<u128>;
}

impl Pool {
  /// Runs `op` on a staged copy and commits it only on success
  pub(crate) fn atomically<T>(&mut self, op: impl FnOnce(&mut Pool) -> Result<T>) -> Result<T> {
    let mut staged = self.clone();
    let output = op(&mut staged)?;
    *self = staged;
    Ok(output)
  }

  /// Rejects calls into a pool that is locked, uninitialized or paused
  pub fn ensure_operational(&self) -> Result<()> {
    require!(!self.locked, HyperdriveError::Reentrancy);
    require!(self.initialized, HyperdriveError::NotInitialized);
    require!(!self.paused, HyperdriveError::Paused);
    Ok(())
  }

  /// Moves base into the yield source with the pool locked
  pub(crate) fn deposit<S: YieldSource>(&mut self, source: &mut S, base: u128) -> Result<u128> {
    let _guard = ReentrancyGuard::new(self)?;
    source.deposit(base)
  }

  /// Moves shares out of the yield source with the pool locked
  pub(crate) fn withdraw<S: YieldSource>(&mut self, source: &mut S, shares: u128) -> Result<u128> {
    if shares == 0 {
      return Ok(0);
    }
    let _guard = ReentrancyGuard::new(self)?;
    source.withdraw(shares)
  }

  // SECTION: reads

  /// Start of the checkpoint bucket containing `now`
  pub fn latest_checkpoint(&self, now: u64) -> u64 {
    let duration = self.config.checkpoint_duration.max(1);
    now - now % duration
  }

  pub fn effective_share_reserves(&self) -> Result<u128> {
    calculate_effective_share_reserves(self.market.share_reserves, self.market.share_adjustment)
      .ok_or(HyperdriveError::BelowMinimumShareReserves.into())
  }

  pub fn spot_price(&self) -> Result<u128> {
    calculate_spot_price(
      self.effective_share_reserves()?,
      self.market.bond_reserves,
      self.config.time_stretch,
      self.config.initial_vault_share_price,
    )
    .ok_or(HyperdriveError::ArithmeticOverflow.into())
  }

  /// Spot APR of the curve
  pub fn spot_rate(&self) -> Result<u128> {
    calculate_spot_apr(
      self.effective_share_reserves()?,
      self.market.bond_reserves,
      self.config.time_stretch,
      self.config.initial_vault_share_price,
      self.config.position_duration,
    )
    .ok_or(HyperdriveError::ArithmeticOverflow.into())
  }

  /// `1 - time_stretch`
  pub(crate) fn curve_exponent(&self) -> Result<u128> {
    ONE
      .checked_sub(self.config.time_stretch)
      .ok_or(HyperdriveError::InvalidConfig.into())
  }

  pub fn present_value_params(&self, now: u64, vault_share_price: u128) -> Result<PresentValueParams> {
    let duration = self.config.position_duration;
    let long_average_time_remaining =
      calculate_time_remaining_scaled(self.market.long_average_maturity_time, now, duration)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
    let short_average_time_remaining =
      calculate_time_remaining_scaled(self.market.short_average_maturity_time, now, duration)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;

    Ok(PresentValueParams {
      share_reserves: self.market.share_reserves,
      share_adjustment: self.market.share_adjustment,
      bond_reserves: self.market.bond_reserves,
      vault_share_price,
      initial_vault_share_price: self.config.initial_vault_share_price,
      minimum_share_reserves: self.config.minimum_share_reserves,
      minimum_transaction_amount: self.config.minimum_transaction_amount,
      time_stretch: self.config.time_stretch,
      longs_outstanding: self.market.longs_outstanding,
      long_average_time_remaining,
      shorts_outstanding: self.market.shorts_outstanding,
      short_average_time_remaining,
    })
  }

  /// Present value of the pool in shares
  pub fn present_value(&self, now: u64, vault_share_price: u128) -> Result<u128> {
    let params = self.present_value_params(now, vault_share_price)?;
    calculate_present_value(&params).ok_or(HyperdriveError::NegativePresentValue.into())
  }

  /// Bonds owed to longs at unsettled maturities, net of shorts maturing
  /// alongside them
  pub fn long_exposure(&self) -> Result<u128> {
    let mut exposure = 0u128;
    for (asset, bonds) in self.positions.iter() {
      if asset.kind != AssetKind::Long || self.checkpoints.contains_key(&asset.maturity) {
        continue;
      }
      let shorts = self
        .positions
        .get(&AssetId::short(asset.maturity))
        .copied()
        .unwrap_or(0);
      exposure = exposure
        .checked_add(bonds.saturating_sub(shorts))
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
    }
    Ok(exposure)
  }

  /// Shares free to pay out to LPs, capped at the present value
  pub fn idle_share_reserves(&self, now: u64, vault_share_price: u128) -> Result<u128> {
    let idle = calculate_idle_share_reserves(
      self.market.share_reserves,
      self.long_exposure()?,
      vault_share_price,
      self.config.minimum_share_reserves,
    )
    .ok_or(HyperdriveError::ArithmeticOverflow)?;

    Ok(idle.min(self.present_value(now, vault_share_price)?))
  }

  /// Base value of one LP share, counting unredeemed withdrawal shares
  pub fn lp_share_price(&self, now: u64, vault_share_price: u128) -> Result<u128> {
    let total = self
      .market
      .lp_total_supply
      .checked_add(self.market.withdrawal_shares_outstanding())
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    calculate_lp_share_price(self.present_value(now, vault_share_price)?, total, vault_share_price)
      .ok_or(HyperdriveError::ArithmeticOverflow.into())
  }

  /// Checks every solvency rule against the current state
  pub fn assert_solvent(&self, now: u64, vault_share_price: u128) -> Result<()> {
    assert_effective_share_reserves_above_minimum(
      self.effective_share_reserves()?,
      self.config.minimum_share_reserves,
    )?;
    assert_solvency(
      self.market.share_reserves,
      self.long_exposure()?,
      vault_share_price,
      self.config.minimum_share_reserves,
    )?;
    assert_withdrawal_ready_within_supply(
      self.market.withdrawal_shares_ready_to_withdraw,
      self.market.withdrawal_share_total_supply,
    )?;
    self.present_value(now, vault_share_price)?;
    Ok(())
  }

  // SECTION: admin

  pub fn set_paused(&mut self, paused: bool) {
    self.paused = paused;
    msg!("Pool paused: {}", paused);
  }

  /// Pays accrued governance fees out of the yield source
  pub fn collect_governance_fees<S: YieldSource>(&mut self, source: &mut S) -> Result<u128> {
    require!(!self.locked, HyperdriveError::Reentrancy);
    require!(self.initialized, HyperdriveError::NotInitialized);

    self.atomically(|pool| {
      let shares = pool.market.governance_fees_accrued;
      pool.market.governance_fees_accrued = 0;
      let base = pool.withdraw(source, shares)?;
      msg!("Governance fees collected: shares={}, base={}", shares, base);
      Ok(base)
    })
  }
}
