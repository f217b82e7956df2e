//! Opening and closing longs
//!
//! A long pays base for bonds off the curve and receives face value at
//! maturity. Closing early sells the unmatured fraction back to the curve
//! and settles the matured fraction at face value.

use anchor_lang::prelude::*;

use super::YieldSource;
use crate::error::HyperdriveError;
use crate::math::{
  calculate_close_long, calculate_normalized_time_remaining, calculate_open_long, close_curve_fee,
  close_flat_fee, governance_fee, mul_div_down, mul_down, open_long_curve_fee, update_weighted_average, ONE,
};
use crate::state::{AssetId, Pool};

impl Pool {
  /// Opens a long maturing one position duration after the latest checkpoint
  ///
  /// # Returns
  /// `(maturity_time, bonds_received)`
  ///
  /// # Errors
  /// * `MinimumSharePrice` - vault share price under `min_vault_share_price`
  /// * `OutputLimit` - fewer than `min_bonds_out` bonds
  /// * `NegativeInterest` - the trade would price bonds above par
  pub fn open_long<S: YieldSource>(
    &mut self,
    base_amount: u128,
    min_bonds_out: u128,
    min_vault_share_price: u128,
    now: u64,
    source: &mut S,
  ) -> Result<(u64, u128)> {
    self.ensure_operational()?;
    require!(
      base_amount >= self.config.minimum_transaction_amount,
      HyperdriveError::MinimumTransactionAmount
    );
    let vault_share_price = source.vault_share_price()?;
    require!(
      vault_share_price >= min_vault_share_price,
      HyperdriveError::MinimumSharePrice
    );

    self.atomically(|pool| {
      pool.apply_checkpoints(now, vault_share_price)?;
      let latest = pool.latest_checkpoint(now);
      let maturity = latest
        .checked_add(pool.config.position_duration)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;

      let shares = pool.deposit(source, base_amount)?;

      let ze = pool.effective_share_reserves()?;
      let spot_price = pool.spot_price()?;
      let mu = pool.config.initial_vault_share_price;
      let bonds = calculate_open_long(
        ze,
        pool.market.bond_reserves,
        shares,
        pool.curve_exponent()?,
        vault_share_price,
        mu,
      )
      .ok_or(HyperdriveError::CurveFailure)?;
      let base_value = mul_down(shares, vault_share_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
      require!(bonds >= base_value, HyperdriveError::NegativeInterest);

      let fees = pool.config.fees;
      let curve_fee = open_long_curve_fee(shares, spot_price, vault_share_price, fees.curve)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      let governance_bonds = governance_fee(curve_fee, fees.governance_lp).ok_or(HyperdriveError::ArithmeticOverflow)?;
      let governance_shares = mul_div_down(governance_bonds, spot_price, vault_share_price)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      let bond_proceeds = bonds.checked_sub(curve_fee).ok_or(HyperdriveError::FeesExceedProceeds)?;
      require!(bond_proceeds >= min_bonds_out, HyperdriveError::OutputLimit);

      let market = &mut pool.market;
      market.bond_reserves = market
        .bond_reserves
        .checked_sub(bond_proceeds + governance_bonds)
        .ok_or(HyperdriveError::CurveFailure)?;
      market.share_reserves = market
        .share_reserves
        .checked_add(shares - governance_shares)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      market.long_average_maturity_time = update_weighted_average(
        market.long_average_maturity_time,
        market.longs_outstanding,
        (maturity as u128) * ONE,
        bond_proceeds,
        true,
      )
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
      market.longs_outstanding = market
        .longs_outstanding
        .checked_add(bond_proceeds)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      market.governance_fees_accrued = market
        .governance_fees_accrued
        .checked_add(governance_shares)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;

      pool.add_position(AssetId::long(maturity), bond_proceeds)?;
      if let Some(checkpoint) = pool.checkpoints.get_mut(&latest) {
        checkpoint.long_base_volume = checkpoint.long_base_volume.saturating_add(base_amount);
      }

      // Spot price must stay at or below one.
      let ze = pool.effective_share_reserves()?;
      let priced = mul_down(mu, ze).ok_or(HyperdriveError::ArithmeticOverflow)?;
      require!(priced <= pool.market.bond_reserves, HyperdriveError::NegativeInterest);
      pool.assert_solvent(now, vault_share_price)?;

      msg!(
        "Long opened: base={}, bonds={}, maturity={}",
        base_amount,
        bond_proceeds,
        maturity
      );
      Ok((maturity, bond_proceeds))
    })
  }

  /// Closes `bond_amount` long bonds maturing at `maturity_time`
  ///
  /// # Returns
  /// Base paid to the trader
  pub fn close_long<S: YieldSource>(
    &mut self,
    maturity_time: u64,
    bond_amount: u128,
    min_base_out: u128,
    now: u64,
    source: &mut S,
  ) -> Result<u128> {
    self.ensure_operational()?;
    require!(
      bond_amount >= self.config.minimum_transaction_amount,
      HyperdriveError::MinimumTransactionAmount
    );
    require!(
      maturity_time % self.config.checkpoint_duration == 0,
      HyperdriveError::InvalidMaturityTime
    );

    let vault_share_price = source.vault_share_price()?;
    self.atomically(|pool| {
      pool.apply_checkpoints(now, vault_share_price)?;
      let asset = AssetId::long(maturity_time);
      pool.remove_position(asset, bond_amount)?;

      let share_proceeds = if maturity_time > now {
        pool.close_long_on_curve(maturity_time, bond_amount, now, vault_share_price)?
      } else {
        let close_price = pool
          .checkpoints
          .get(&maturity_time)
          .map(|checkpoint| checkpoint.vault_share_price)
          .ok_or(HyperdriveError::MissingCheckpoint)?;
        let (claim, _) = pool.matured_long_claim(maturity_time, bond_amount, close_price)?;
        pool.take_matured_shares(claim)
      };

      let base_proceeds = pool.withdraw(source, share_proceeds)?;
      require!(base_proceeds >= min_base_out, HyperdriveError::OutputLimit);

      msg!(
        "Long closed: bonds={}, base={}, maturity={}",
        bond_amount,
        base_proceeds,
        maturity_time
      );
      Ok(base_proceeds)
    })
  }

  /// Sells the unmatured part of a long back to the curve and pays the
  /// matured part at face value. Returns the shares owed to the trader.
  fn close_long_on_curve(
    &mut self,
    maturity_time: u64,
    bond_amount: u128,
    now: u64,
    vault_share_price: u128,
  ) -> Result<u128> {
    let time_remaining =
      calculate_normalized_time_remaining(maturity_time, now, self.config.position_duration)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
    let ze = self.effective_share_reserves()?;
    let spot_price = self.spot_price()?;
    let trade = calculate_close_long(
      ze,
      self.market.bond_reserves,
      bond_amount,
      time_remaining,
      self.curve_exponent()?,
      vault_share_price,
      self.config.initial_vault_share_price,
    )
    .ok_or(HyperdriveError::CurveFailure)?;

    let fees = self.config.fees;
    let curve_fee = close_curve_fee(bond_amount, time_remaining, spot_price, vault_share_price, fees.curve)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    let flat_fee = close_flat_fee(bond_amount, time_remaining, vault_share_price, fees.flat)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    let governance_curve = governance_fee(curve_fee, fees.governance_lp).ok_or(HyperdriveError::ArithmeticOverflow)?;
    let governance_flat = governance_fee(flat_fee, fees.governance_lp).ok_or(HyperdriveError::ArithmeticOverflow)?;

    let mut share_proceeds = (trade.share_curve + trade.share_flat)
      .checked_sub(curve_fee + flat_fee)
      .ok_or(HyperdriveError::FeesExceedProceeds)?;

    // Negative interest since the open is shared with the longs.
    let open_price = self.open_vault_share_price(maturity_time)?;
    if vault_share_price < open_price {
      share_proceeds = mul_div_down(share_proceeds, vault_share_price, open_price)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
    }

    let governance = governance_curve + governance_flat;
    let new_effective = (ze + (curve_fee - governance_curve))
      .checked_sub(trade.share_curve)
      .ok_or(HyperdriveError::BelowMinimumShareReserves)?;
    let new_share_reserves = self
      .market
      .share_reserves
      .checked_sub(share_proceeds + governance)
      .ok_or(HyperdriveError::InsufficientLiquidity)?;

    let market = &mut self.market;
    market.share_reserves = new_share_reserves;
    market.share_adjustment = i128::try_from(new_share_reserves)? - i128::try_from(new_effective)?;
    market.bond_reserves = market
      .bond_reserves
      .checked_add(trade.bond_curve)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.long_average_maturity_time = update_weighted_average(
      market.long_average_maturity_time,
      market.longs_outstanding,
      (maturity_time as u128) * ONE,
      bond_amount,
      false,
    )
    .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.longs_outstanding = market
      .longs_outstanding
      .checked_sub(bond_amount)
      .ok_or(HyperdriveError::InsufficientBalance)?;
    market.governance_fees_accrued = market
      .governance_fees_accrued
      .checked_add(governance)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;

    self.distribute_excess_idle(now, vault_share_price)?;
    self.assert_solvent(now, vault_share_price)?;
    Ok(share_proceeds)
  }
}
