//! Opening and closing shorts
//!
//! A short sells bonds to the curve and posts collateral covering face value
//! plus the flat fee at the open checkpoint's share price. The collateral
//! sits outside the share reserves until the short closes.

use anchor_lang::prelude::*;

use super::YieldSource;
use crate::error::HyperdriveError;
use crate::math::{
  calculate_close_short, calculate_normalized_time_remaining, calculate_open_short, close_curve_fee,
  close_flat_fee, governance_fee, mul_down, mul_up, open_short_curve_fee, short_collateral_down,
  short_collateral_locked, short_collateral_up, update_weighted_average, ONE,
};
use crate::state::{AssetId, Pool};

impl Pool {
  /// Opens a short on `bond_amount` bonds
  ///
  /// # Returns
  /// `(maturity_time, base_paid)`
  pub fn open_short<S: YieldSource>(
    &mut self,
    bond_amount: u128,
    max_base_paid: u128,
    min_vault_share_price: u128,
    now: u64,
    source: &mut S,
  ) -> Result<(u64, u128)> {
    self.ensure_operational()?;
    require!(
      bond_amount >= self.config.minimum_transaction_amount,
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
      let open_price = pool.price_for_checkpoint(latest, vault_share_price);

      let ze = pool.effective_share_reserves()?;
      let spot_price = pool.spot_price()?;
      let share_curve = calculate_open_short(
        ze,
        pool.market.bond_reserves,
        bond_amount,
        pool.curve_exponent()?,
        vault_share_price,
        pool.config.initial_vault_share_price,
      )
      .ok_or(HyperdriveError::CurveFailure)?;
      let base_value = mul_down(share_curve, vault_share_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
      require!(base_value <= bond_amount, HyperdriveError::NegativeInterest);

      let fees = pool.config.fees;
      let curve_fee = open_short_curve_fee(bond_amount, spot_price, vault_share_price, fees.curve)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      let governance = governance_fee(curve_fee, fees.governance_lp).ok_or(HyperdriveError::ArithmeticOverflow)?;
      let share_reserves_delta = share_curve
        .checked_sub(curve_fee - governance)
        .ok_or(HyperdriveError::FeesExceedProceeds)?;

      let collateral =
        short_collateral_up(bond_amount, open_price, fees.flat).ok_or(HyperdriveError::ArithmeticOverflow)?;
      let deposit_shares = collateral
        .checked_sub(share_reserves_delta)
        .and_then(|shares| shares.checked_add(governance))
        .ok_or(HyperdriveError::NegativeInterest)?;
      let base_paid = mul_up(deposit_shares, vault_share_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
      require!(base_paid <= max_base_paid, HyperdriveError::OutputLimit);

      let shares = pool.deposit(source, base_paid)?;
      require!(shares >= deposit_shares, HyperdriveError::DepositShortfall);
      let surplus = shares - deposit_shares;

      let market = &mut pool.market;
      market.share_reserves = (market.share_reserves + surplus)
        .checked_sub(share_reserves_delta)
        .ok_or(HyperdriveError::InsufficientLiquidity)?;
      market.share_adjustment = market
        .share_adjustment
        .checked_add(i128::try_from(surplus)?)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      market.bond_reserves = market
        .bond_reserves
        .checked_add(bond_amount)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      market.short_average_maturity_time = update_weighted_average(
        market.short_average_maturity_time,
        market.shorts_outstanding,
        (maturity as u128) * ONE,
        bond_amount,
        true,
      )
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
      market.shorts_outstanding = market
        .shorts_outstanding
        .checked_add(bond_amount)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      market.governance_fees_accrued = market
        .governance_fees_accrued
        .checked_add(governance)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;

      pool.add_position(AssetId::short(maturity), bond_amount)?;
      if let Some(checkpoint) = pool.checkpoints.get_mut(&latest) {
        checkpoint.short_base_volume = checkpoint.short_base_volume.saturating_add(base_paid);
      }
      pool.assert_solvent(now, vault_share_price)?;

      msg!(
        "Short opened: bonds={}, base_paid={}, maturity={}",
        bond_amount,
        base_paid,
        maturity
      );
      Ok((maturity, base_paid))
    })
  }

  /// Closes `bond_amount` short bonds maturing at `maturity_time`
  ///
  /// # Returns
  /// Base paid to the trader from the released collateral
  pub fn close_short<S: YieldSource>(
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
      pool.remove_position(AssetId::short(maturity_time), bond_amount)?;

      let share_proceeds = if maturity_time > now {
        pool.close_short_on_curve(maturity_time, bond_amount, now, vault_share_price)?
      } else {
        let close_price = pool
          .checkpoints
          .get(&maturity_time)
          .map(|checkpoint| checkpoint.vault_share_price)
          .ok_or(HyperdriveError::MissingCheckpoint)?;
        let (claim, _, _) = pool.matured_short_settlement(maturity_time, bond_amount, close_price)?;
        pool.take_matured_shares(claim)
      };

      let base_proceeds = pool.withdraw(source, share_proceeds)?;
      require!(base_proceeds >= min_base_out, HyperdriveError::OutputLimit);

      msg!(
        "Short closed: bonds={}, base={}, maturity={}",
        bond_amount,
        base_proceeds,
        maturity_time
      );
      Ok(base_proceeds)
    })
  }

  /// Buys back the unmatured part of a short from the curve and the matured
  /// part at face value, paid out of the short's collateral. Returns the
  /// collateral left for the trader.
  fn close_short_on_curve(
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
    let trade = calculate_close_short(
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

    let cost = trade
      .share_curve
      .checked_add(trade.share_flat)
      .and_then(|cost| cost.checked_add(curve_fee))
      .and_then(|cost| cost.checked_add(flat_fee))
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    let open_price = self.open_vault_share_price(maturity_time)?;
    let locked =
      short_collateral_locked(bond_amount, open_price, fees.flat).ok_or(HyperdriveError::ArithmeticOverflow)?;
    let collateral = short_collateral_down(bond_amount, open_price, vault_share_price, fees.flat)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;

    // Interest shortfalls leave the trader with nothing and the pool with
    // whatever collateral exists.
    let pool_share = cost.min(collateral);
    let governance = (governance_curve + governance_flat).min(pool_share);
    let share_proceeds = collateral - pool_share;
    let pool_inflow = pool_share + (locked - collateral);

    let new_effective = ze
      .checked_add(trade.share_curve + curve_fee - governance_curve)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    let new_share_reserves = self
      .market
      .share_reserves
      .checked_add(pool_inflow - governance)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;

    let market = &mut self.market;
    market.share_reserves = new_share_reserves;
    market.share_adjustment = i128::try_from(new_share_reserves)? - i128::try_from(new_effective)?;
    market.bond_reserves = market
      .bond_reserves
      .checked_sub(trade.bond_curve)
      .ok_or(HyperdriveError::CurveFailure)?;
    market.short_average_maturity_time = update_weighted_average(
      market.short_average_maturity_time,
      market.shorts_outstanding,
      (maturity_time as u128) * ONE,
      bond_amount,
      false,
    )
    .ok_or(HyperdriveError::ArithmeticOverflow)?;
    market.shorts_outstanding = market
      .shorts_outstanding
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
