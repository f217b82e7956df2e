//! LP side of the pool: initialize, add and remove liquidity, withdrawal
//! shares and the distribution of excess idle

use anchor_lang::prelude::*;

use super::YieldSource;
use crate::error::HyperdriveError;
use crate::invariants::{assert_lp_share_price_non_decreasing, assert_present_value_not_decreased};
use crate::math::{
  calculate_distribute_excess_idle, calculate_initial_bond_reserves, calculate_update_liquidity, mul_div_down,
  mul_down, DistributeExcessIdleParams,
};
use crate::state::Pool;

impl Pool {
  /// Seeds the pool with its first liquidity at `apr`
  ///
  /// `minimum_share_reserves` of the LP supply is never minted to anyone, so
  /// the first LP receives `shares - 2 * minimum_share_reserves`.
  ///
  /// # Errors
  /// * `AlreadyInitialized` - pool already seeded
  /// * `BelowMinimumContribution` - contribution under twice the floor
  pub fn initialize<S: YieldSource>(
    &mut self,
    contribution: u128,
    apr: u128,
    now: u64,
    source: &mut S,
  ) -> Result<u128> {
    require!(!self.locked, HyperdriveError::Reentrancy);
    require!(!self.initialized, HyperdriveError::AlreadyInitialized);
    require!(!self.paused, HyperdriveError::Paused);
    require!(contribution > 0, HyperdriveError::ZeroAmount);
    self.config.validate()?;

    let vault_share_price = source.vault_share_price()?;
    self.atomically(|pool| {
      let minimum = pool.config.minimum_share_reserves;
      let shares = pool.deposit(source, contribution)?;
      let floor = minimum.checked_mul(2).ok_or(HyperdriveError::ArithmeticOverflow)?;
      require!(shares >= floor, HyperdriveError::BelowMinimumContribution);

      pool.market.share_reserves = shares;
      pool.market.share_adjustment = 0;
      pool.market.bond_reserves = calculate_initial_bond_reserves(
        shares,
        pool.config.initial_vault_share_price,
        apr,
        pool.config.position_duration,
        pool.config.time_stretch,
      )
      .ok_or(HyperdriveError::InvalidApr)?;
      pool.market.lp_total_supply = shares - minimum;
      pool.initialized = true;

      pool.apply_checkpoints(now, vault_share_price)?;
      pool.assert_solvent(now, vault_share_price)?;

      let lp_shares = shares - floor;
      msg!(
        "Pool initialized: shares={}, bond_reserves={}, lp_shares={}",
        shares,
        pool.market.bond_reserves,
        lp_shares
      );
      Ok(lp_shares)
    })
  }

  /// Adds liquidity without moving the spot price
  ///
  /// # Errors
  /// * `InvalidApr` - spot APR outside `[min_apr, max_apr]`
  /// * `OutputLimit` - LP share price under `min_lp_share_price`
  /// * `DecreasedPresentValueWhenAddingLiquidity`
  pub fn add_liquidity<S: YieldSource>(
    &mut self,
    contribution: u128,
    min_lp_share_price: u128,
    min_apr: u128,
    max_apr: u128,
    now: u64,
    source: &mut S,
  ) -> Result<u128> {
    self.ensure_operational()?;
    require!(
      contribution >= self.config.minimum_transaction_amount,
      HyperdriveError::MinimumTransactionAmount
    );
    require!(min_apr <= max_apr, HyperdriveError::InvalidApr);
    let apr = self.spot_rate()?;
    require!(apr >= min_apr && apr <= max_apr, HyperdriveError::InvalidApr);

    let vault_share_price = source.vault_share_price()?;
    self.atomically(|pool| {
      pool.apply_checkpoints(now, vault_share_price)?;

      let starting_present_value = pool.present_value(now, vault_share_price)?;
      let total_lp = pool
        .market
        .lp_total_supply
        .checked_add(pool.market.withdrawal_shares_outstanding())
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      let lp_share_price = pool.lp_share_price(now, vault_share_price)?;
      require!(lp_share_price >= min_lp_share_price, HyperdriveError::OutputLimit);

      let shares = pool.deposit(source, contribution)?;
      pool.update_liquidity(i128::try_from(shares)?)?;

      let ending_present_value = pool.present_value(now, vault_share_price)?;
      assert_present_value_not_decreased(starting_present_value, ending_present_value)?;

      let lp_shares = mul_div_down(ending_present_value - starting_present_value, total_lp, starting_present_value)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;
      require!(
        lp_shares >= pool.config.minimum_transaction_amount,
        HyperdriveError::MinimumTransactionAmount
      );
      pool.market.lp_total_supply = pool
        .market
        .lp_total_supply
        .checked_add(lp_shares)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;

      pool.distribute_excess_idle(now, vault_share_price)?;
      pool.assert_solvent(now, vault_share_price)?;

      msg!("Liquidity added: shares={}, lp_shares={}", shares, lp_shares);
      Ok(lp_shares)
    })
  }

  /// Burns `lp_shares`, paying out what idle allows now and leaving the rest
  /// as withdrawal shares
  ///
  /// # Returns
  /// `(base_proceeds, withdrawal_shares)` where `withdrawal_shares` are
  /// those left outstanding
  pub fn remove_liquidity<S: YieldSource>(
    &mut self,
    lp_shares: u128,
    min_base_output: u128,
    now: u64,
    source: &mut S,
  ) -> Result<(u128, u128)> {
    self.ensure_operational()?;
    require!(
      lp_shares >= self.config.minimum_transaction_amount,
      HyperdriveError::MinimumTransactionAmount
    );

    let vault_share_price = source.vault_share_price()?;
    self.atomically(|pool| {
      pool.apply_checkpoints(now, vault_share_price)?;

      let removable = pool.market.lp_total_supply.saturating_sub(pool.config.minimum_share_reserves);
      require!(lp_shares <= removable, HyperdriveError::InsufficientBalance);
      let price_before = pool.lp_share_price(now, vault_share_price)?;

      pool.market.lp_total_supply -= lp_shares;
      pool.market.withdrawal_share_total_supply = pool
        .market
        .withdrawal_share_total_supply
        .checked_add(lp_shares)
        .ok_or(HyperdriveError::ArithmeticOverflow)?;

      pool.distribute_excess_idle(now, vault_share_price)?;
      let (base_proceeds, redeemed) = pool.redeem_ready(source, lp_shares)?;
      require!(base_proceeds >= min_base_output, HyperdriveError::OutputLimit);

      let price_after = pool.lp_share_price(now, vault_share_price)?;
      assert_lp_share_price_non_decreasing(
        price_before,
        price_after,
        pool.config.tolerances.lp_share_price_relative,
      )?;
      pool.assert_solvent(now, vault_share_price)?;

      let withdrawal_shares = lp_shares - redeemed;
      msg!(
        "Liquidity removed: lp_shares={}, base={}, withdrawal_shares={}",
        lp_shares,
        base_proceeds,
        withdrawal_shares
      );
      Ok((base_proceeds, withdrawal_shares))
    })
  }

  /// Redeems up to `shares` withdrawal shares from the ready pool
  ///
  /// # Returns
  /// `(base_proceeds, shares_redeemed)`
  pub fn redeem_withdrawal_shares<S: YieldSource>(
    &mut self,
    shares: u128,
    min_output_per_share: u128,
    now: u64,
    source: &mut S,
  ) -> Result<(u128, u128)> {
    self.ensure_operational()?;
    require!(shares > 0, HyperdriveError::ZeroAmount);

    let vault_share_price = source.vault_share_price()?;
    self.atomically(|pool| {
      pool.apply_checkpoints(now, vault_share_price)?;
      pool.distribute_excess_idle(now, vault_share_price)?;

      let (base_proceeds, redeemed) = pool.redeem_ready(source, shares)?;
      let min_output = mul_down(min_output_per_share, redeemed).ok_or(HyperdriveError::ArithmeticOverflow)?;
      require!(base_proceeds >= min_output, HyperdriveError::OutputLimit);
      pool.assert_solvent(now, vault_share_price)?;

      msg!("Withdrawal shares redeemed: shares={}, base={}", redeemed, base_proceeds);
      Ok((base_proceeds, redeemed))
    })
  }

  /// Pays out up to `requested` ready withdrawal shares, pro rata from the
  /// proceeds set aside for them
  fn redeem_ready<S: YieldSource>(&mut self, source: &mut S, requested: u128) -> Result<(u128, u128)> {
    let ready = self.market.withdrawal_shares_ready_to_withdraw;
    let redeemed = requested.min(ready);
    if redeemed == 0 {
      return Ok((0, 0));
    }

    let proceeds = mul_div_down(self.market.withdrawal_share_proceeds, redeemed, ready)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    self.market.withdrawal_shares_ready_to_withdraw -= redeemed;
    self.market.withdrawal_share_total_supply = self
      .market
      .withdrawal_share_total_supply
      .checked_sub(redeemed)
      .ok_or(HyperdriveError::InsufficientBalance)?;
    self.market.withdrawal_share_proceeds -= proceeds;

    let base = self.withdraw(source, proceeds)?;
    Ok((base, redeemed))
  }

  /// Moves `delta` shares in or out of the curve at a fixed spot price
  fn update_liquidity(&mut self, delta: i128) -> Result<()> {
    let (share_reserves, share_adjustment, bond_reserves) = calculate_update_liquidity(
      self.market.share_reserves,
      self.market.share_adjustment,
      self.market.bond_reserves,
      self.config.minimum_share_reserves,
      delta,
    )
    .ok_or(HyperdriveError::BelowMinimumShareReserves)?;

    self.market.share_reserves = share_reserves;
    self.market.share_adjustment = share_adjustment;
    self.market.bond_reserves = bond_reserves;
    Ok(())
  }

  /// Sets idle aside for outstanding withdrawal shares without lowering the
  /// remaining LPs' share price. Numerical failures leave everything as is
  /// and the next call retries.
  pub(crate) fn distribute_excess_idle(&mut self, now: u64, vault_share_price: u128) -> Result<()> {
    let withdrawal_shares_outstanding = self.market.withdrawal_shares_outstanding();
    if withdrawal_shares_outstanding == 0 {
      return Ok(());
    }

    let present_value_params = self.present_value_params(now, vault_share_price)?;
    let starting_present_value = self.present_value(now, vault_share_price)?;
    let idle = self.idle_share_reserves(now, vault_share_price)?;
    let params = DistributeExcessIdleParams {
      present_value_params,
      starting_present_value,
      active_lp_total_supply: self.market.lp_total_supply,
      withdrawal_shares_outstanding,
      idle,
      tolerance: self.config.tolerances.distribute_excess_idle_absolute,
      max_iterations: self.config.tolerances.distribute_excess_idle_max_iterations,
    };

    let Some((redeemed, proceeds)) = calculate_distribute_excess_idle(&params) else {
      msg!("Distribute excess idle skipped: idle={}", idle);
      return Ok(());
    };
    if redeemed == 0 || proceeds == 0 {
      return Ok(());
    }

    self.update_liquidity(-i128::try_from(proceeds)?)?;
    self.market.withdrawal_shares_ready_to_withdraw = self
      .market
      .withdrawal_shares_ready_to_withdraw
      .checked_add(redeemed)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    self.market.withdrawal_share_proceeds = self
      .market
      .withdrawal_share_proceeds
      .checked_add(proceeds)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;

    msg!("Excess idle distributed: withdrawal_shares={}, shares={}", redeemed, proceeds);
    Ok(())
  }
}
