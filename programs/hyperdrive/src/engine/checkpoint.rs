//! Checkpoints: absent -> active -> finalized
//!
//! A checkpoint becomes active the first time anything references its
//! bucket, snapshotting the vault share price. Positions maturing at that
//! time are netted out of the outstanding totals right then, and the
//! checkpoint is finalized once a call arrives after its bucket ends.

use std::collections::BTreeSet;

use anchor_lang::prelude::*;

use super::YieldSource;
use crate::error::HyperdriveError;
use crate::math::{
  div_down, div_up, mul_div_down, mul_div_up, mul_down, mul_up, short_collateral_down, short_collateral_locked,
  update_weighted_average, ONE,
};
use crate::state::{AssetId, Checkpoint, CheckpointStatus, Pool};

impl Pool {
  /// Creates the checkpoint at `checkpoint_time` if it does not exist yet
  ///
  /// # Errors
  /// * `InvalidCheckpointTime` - not aligned to the checkpoint duration
  /// * `FutureCheckpoint` - later than `now`
  pub fn checkpoint<S: YieldSource>(&mut self, checkpoint_time: u64, now: u64, source: &mut S) -> Result<()> {
    self.ensure_operational()?;
    require!(
      checkpoint_time % self.config.checkpoint_duration == 0,
      HyperdriveError::InvalidCheckpointTime
    );
    require!(checkpoint_time <= now, HyperdriveError::FutureCheckpoint);

    if self.checkpoints.contains_key(&checkpoint_time) {
      msg!("Checkpoint {} already exists", checkpoint_time);
      return Ok(());
    }

    let vault_share_price = source.vault_share_price()?;
    self.atomically(|pool| {
      pool.apply_checkpoints(now, vault_share_price)?;
      if !pool.checkpoints.contains_key(&checkpoint_time) {
        let price = pool.price_for_checkpoint(checkpoint_time, vault_share_price);
        pool.create_checkpoint(checkpoint_time, price)?;
        pool.finalize_checkpoints(now);
      }
      pool.distribute_excess_idle(now, vault_share_price)?;
      Ok(())
    })
  }

  /// Brings the checkpoint map up to date with `now`: settles every maturity
  /// that has passed, opens the current bucket and finalizes closed buckets
  pub(crate) fn apply_checkpoints(&mut self, now: u64, vault_share_price: u128) -> Result<()> {
    let latest = self.latest_checkpoint(now);
    if !self.checkpoints.contains_key(&latest) {
      self.create_checkpoint(latest, vault_share_price)?;
    }

    let overdue: BTreeSet<u64> = self
      .positions
      .keys()
      .map(|asset| asset.maturity)
      .filter(|maturity| *maturity <= now && !self.checkpoints.contains_key(maturity))
      .collect();

    for maturity in overdue.into_iter().rev() {
      let price = self.price_for_checkpoint(maturity, vault_share_price);
      self.create_checkpoint(maturity, price)?;
    }

    self.finalize_checkpoints(now);
    Ok(())
  }

  /// Price a late checkpoint snapshots: the nearest later checkpoint's, else
  /// the current price
  pub(crate) fn price_for_checkpoint(&self, checkpoint_time: u64, vault_share_price: u128) -> u128 {
    self
      .checkpoints
      .range(checkpoint_time..)
      .next()
      .map(|(_, checkpoint)| checkpoint.vault_share_price)
      .unwrap_or(vault_share_price)
  }

  fn finalize_checkpoints(&mut self, now: u64) {
    let duration = self.config.checkpoint_duration;
    for (time, checkpoint) in self.checkpoints.iter_mut() {
      if checkpoint.status == CheckpointStatus::Active && time.saturating_add(duration) <= now {
        checkpoint.status = CheckpointStatus::Finalized;
      }
    }
  }

  fn create_checkpoint(&mut self, checkpoint_time: u64, vault_share_price: u128) -> Result<()> {
    require!(vault_share_price > 0, HyperdriveError::ArithmeticOverflow);
    self.checkpoints.insert(checkpoint_time, Checkpoint::new(vault_share_price));

    let matured_longs = self.positions.get(&AssetId::long(checkpoint_time)).copied().unwrap_or(0);
    let matured_shorts = self.positions.get(&AssetId::short(checkpoint_time)).copied().unwrap_or(0);
    if matured_longs > 0 {
      self.net_matured_longs(checkpoint_time, matured_longs, vault_share_price)?;
    }
    if matured_shorts > 0 {
      self.net_matured_shorts(checkpoint_time, matured_shorts, vault_share_price)?;
    }

    if let Some(checkpoint) = self.checkpoints.get_mut(&checkpoint_time) {
      checkpoint.matured_longs = matured_longs;
      checkpoint.matured_shorts = matured_shorts;
    }

    msg!(
      "Checkpoint {} created: price={}, matured_longs={}, matured_shorts={}",
      checkpoint_time,
      vault_share_price,
      matured_longs,
      matured_shorts
    );
    Ok(())
  }

  /// Vault share price of the checkpoint a position maturing at `maturity`
  /// was opened in
  pub(crate) fn open_vault_share_price(&self, maturity: u64) -> Result<u128> {
    let open_time = maturity
      .checked_sub(self.config.position_duration)
      .ok_or(HyperdriveError::InvalidMaturityTime)?;
    let checkpoint = self.checkpoints.get(&open_time).ok_or(HyperdriveError::MissingCheckpoint)?;
    Ok(checkpoint.vault_share_price)
  }

  /// Shares owed to `bonds` matured long bonds after the flat fee, and the
  /// governance part of that fee
  pub(crate) fn matured_long_claim(&self, maturity: u64, bonds: u128, close_price: u128) -> Result<(u128, u128)> {
    let fees = self.config.fees;
    let shares = div_down(bonds, close_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
    let flat_fee = mul_up(shares, fees.flat).ok_or(HyperdriveError::ArithmeticOverflow)?;
    let governance = mul_down(flat_fee, fees.governance_lp).ok_or(HyperdriveError::ArithmeticOverflow)?;
    let mut claim = shares.checked_sub(flat_fee).ok_or(HyperdriveError::FeesExceedProceeds)?;

    // Negative interest since the open is shared with the longs.
    let open_price = self.open_vault_share_price(maturity)?;
    if close_price < open_price {
      claim = mul_div_down(claim, close_price, open_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
    }
    Ok((claim, governance))
  }

  /// Shares a matured short's collateral releases after buying back the
  /// bonds at face value plus the flat fee. Returns `(trader_claim,
  /// pool_inflow, governance)`, where `pool_inflow` includes the locked
  /// collateral the short does not get back.
  pub(crate) fn matured_short_settlement(
    &self,
    maturity: u64,
    bonds: u128,
    close_price: u128,
  ) -> Result<(u128, u128, u128)> {
    let fees = self.config.fees;
    let open_price = self.open_vault_share_price(maturity)?;
    let locked = short_collateral_locked(bonds, open_price, fees.flat).ok_or(HyperdriveError::ArithmeticOverflow)?;
    let collateral = short_collateral_down(bonds, open_price, close_price, fees.flat)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;

    let face = div_up(bonds, close_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
    let flat_fee = mul_div_up(bonds, fees.flat, close_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
    let owed = face.checked_add(flat_fee).ok_or(HyperdriveError::ArithmeticOverflow)?;

    let pool_share = collateral.min(owed);
    let governance = mul_down(flat_fee, fees.governance_lp)
      .ok_or(HyperdriveError::ArithmeticOverflow)?
      .min(pool_share);

    let pool_inflow = pool_share + (locked - collateral);
    Ok((collateral - pool_share, pool_inflow, governance))
  }

  fn net_matured_longs(&mut self, maturity: u64, bonds: u128, price: u128) -> Result<()> {
    let (claim, governance) = self.matured_long_claim(maturity, bonds, price)?;
    let outflow = claim.checked_add(governance).ok_or(HyperdriveError::ArithmeticOverflow)?;

    let market = &mut self.market;
    market.share_reserves = market
      .share_reserves
      .checked_sub(outflow)
      .ok_or(HyperdriveError::InsufficientLiquidity)?;
    market.share_adjustment = market
      .share_adjustment
      .checked_sub(i128::try_from(outflow)?)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.long_average_maturity_time = update_weighted_average(
      market.long_average_maturity_time,
      market.longs_outstanding,
      (maturity as u128) * ONE,
      bonds,
      false,
    )
    .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.longs_outstanding = market.longs_outstanding.saturating_sub(bonds);
    market.matured_share_reserves = market
      .matured_share_reserves
      .checked_add(claim)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.governance_fees_accrued = market
      .governance_fees_accrued
      .checked_add(governance)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    Ok(())
  }

  fn net_matured_shorts(&mut self, maturity: u64, bonds: u128, price: u128) -> Result<()> {
    let (claim, pool_inflow, governance) = self.matured_short_settlement(maturity, bonds, price)?;
    let inflow = i128::try_from(pool_inflow - governance)?;

    let market = &mut self.market;
    market.share_reserves = market
      .share_reserves
      .checked_add(pool_inflow - governance)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.share_adjustment = market
      .share_adjustment
      .checked_add(inflow)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.short_average_maturity_time = update_weighted_average(
      market.short_average_maturity_time,
      market.shorts_outstanding,
      (maturity as u128) * ONE,
      bonds,
      false,
    )
    .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.shorts_outstanding = market.shorts_outstanding.saturating_sub(bonds);
    market.matured_share_reserves = market
      .matured_share_reserves
      .checked_add(claim)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.governance_fees_accrued = market
      .governance_fees_accrued
      .checked_add(governance)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    Ok(())
  }

  /// Draws up to `shares` from the matured reserves. Per-trader rounding can
  /// leave the last claimant a few wei short of the aggregate.
  pub(crate) fn take_matured_shares(&mut self, shares: u128) -> u128 {
    let taken = shares.min(self.market.matured_share_reserves);
    self.market.matured_share_reserves -= taken;
    taken
  }

  /// Drops checkpoints no open position needs: only the current bucket and,
  /// for every maturity still held, its open and maturity checkpoints stay.
  pub fn prune_checkpoints(&mut self, now: u64) {
    let latest = self.latest_checkpoint(now);
    let duration = self.config.position_duration;
    let mut keep: BTreeSet<u64> = BTreeSet::new();
    keep.insert(latest);
    for asset in self.positions.keys() {
      keep.insert(asset.maturity);
      if let Some(open) = asset.maturity.checked_sub(duration) {
        keep.insert(open);
      }
    }

    let before = self.checkpoints.len();
    self.checkpoints.retain(|time, _| keep.contains(time));
    let pruned = before - self.checkpoints.len();
    if pruned > 0 {
      msg!("Pruned {} checkpoints", pruned);
    }
  }

  /// Bonds held of `asset`
  pub fn position(&self, asset: AssetId) -> u128 {
    self.positions.get(&asset).copied().unwrap_or(0)
  }

  pub(crate) fn add_position(&mut self, asset: AssetId, bonds: u128) -> Result<()> {
    let entry = self.positions.entry(asset).or_insert(0);
    *entry = entry.checked_add(bonds).ok_or(HyperdriveError::ArithmeticOverflow)?;
    Ok(())
  }

  pub(crate) fn remove_position(&mut self, asset: AssetId, bonds: u128) -> Result<()> {
    let held = self.positions.get(&asset).copied().ok_or(HyperdriveError::InvalidMaturityTime)?;
    let remaining = held.checked_sub(bonds).ok_or(HyperdriveError::InsufficientBalance)?;
    if remaining == 0 {
      self.positions.remove(&asset);
    } else {
      self.positions.insert(asset, remaining);
    }
    Ok(())
  }
}
