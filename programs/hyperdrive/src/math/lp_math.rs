//! LP accounting: present value, idle liquidity, LP share price and the
//! distribution of excess idle to withdrawal shares.

use super::fixed_point::{div_down, div_up, mul_div_down, mul_div_up, mul_down, mul_up, U256, ONE};
use super::hyperdrive_math::calculate_effective_share_reserves;
use super::yield_space::{
  calculate_max_buy_bonds_out, calculate_max_buy_shares_in, calculate_max_sell_bonds_in,
  calculate_shares_in_given_bonds_out_up, calculate_shares_out_given_bonds_in_down,
};

/// Snapshot of everything the present value depends on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentValueParams {
  pub share_reserves: u128,
  pub share_adjustment: i128,
  pub bond_reserves: u128,
  pub vault_share_price: u128,
  pub initial_vault_share_price: u128,
  pub minimum_share_reserves: u128,
  pub minimum_transaction_amount: u128,
  pub time_stretch: u128,
  pub longs_outstanding: u128,
  pub long_average_time_remaining: u128,
  pub shorts_outstanding: u128,
  pub short_average_time_remaining: u128,
}

impl PresentValueParams {
  fn curve_exponent(&self) -> Option<u128> {
    ONE.checked_sub(self.time_stretch)
  }

  fn effective_share_reserves(&self) -> Option<u128> {
    calculate_effective_share_reserves(self.share_reserves, self.share_adjustment)
  }
}

/// Inputs of one distribute-excess-idle pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DistributeExcessIdleParams {
  pub present_value_params: PresentValueParams,
  pub starting_present_value: u128,
  pub active_lp_total_supply: u128,
  pub withdrawal_shares_outstanding: u128,
  pub idle: u128,
  pub tolerance: u128,
  pub max_iterations: u64,
}

fn to_signed(value: u128) -> Option<i128> {
  i128::try_from(value).ok()
}

/// Present value of the pool in shares:
/// `z + net_curve_trade + net_flat_trade - z_min`.
///
/// Open positions are marked as if closed now: the unmatured fraction on
/// the curve and the matured fraction at face value. `None` if the result
/// would be negative.
pub fn calculate_present_value(params: &PresentValueParams) -> Option<u128> {
  let value = to_signed(params.share_reserves)?
    .checked_add(calculate_net_curve_trade(params)?)?
    .checked_add(calculate_net_flat_trade(params)?)?
    .checked_sub(to_signed(params.minimum_share_reserves)?)?;

  if value < 0 {
    return None;
  }
  Some(value as u128)
}

/// Shares the pool would owe (negative) or receive (positive) settling the
/// matured fraction of every position at face value
pub fn calculate_net_flat_trade(params: &PresentValueParams) -> Option<i128> {
  let c = params.vault_share_price;
  let short_flat = mul_div_down(
    params.shorts_outstanding,
    ONE.checked_sub(params.short_average_time_remaining)?,
    c,
  )?;
  let long_flat = mul_div_up(
    params.longs_outstanding,
    ONE.checked_sub(params.long_average_time_remaining)?,
    c,
  )?;
  to_signed(short_flat)?.checked_sub(to_signed(long_flat)?)
}

/// Shares the pool would pay (negative) or receive (positive) closing the
/// net unmatured position on the curve. Bonds beyond what the curve can
/// absorb are marked at a price of one.
pub fn calculate_net_curve_trade(params: &PresentValueParams) -> Option<i128> {
  let long_curve = mul_up(params.longs_outstanding, params.long_average_time_remaining)?;
  let short_curve = mul_down(params.shorts_outstanding, params.short_average_time_remaining)?;
  let c = params.vault_share_price;
  let mu = params.initial_vault_share_price;
  let t = params.curve_exponent()?;
  let ze = params.effective_share_reserves()?;
  let y = params.bond_reserves;

  let trade = if long_curve > short_curve {
    let net = long_curve - short_curve;
    let (max_bonds_in, max_shares_out) = calculate_max_sell_bonds_in(
      ze,
      params.share_adjustment,
      y,
      params.minimum_share_reserves,
      t,
      c,
      mu,
    )?;

    if net <= max_bonds_in {
      match calculate_shares_out_given_bonds_in_down(ze, y, net, t, c, mu) {
        Some(shares_out) => -to_signed(shares_out)?,
        None if net < params.minimum_transaction_amount => 0,
        None => return None,
      }
    } else {
      let excess = div_up(net - max_bonds_in, c)?;
      -to_signed(max_shares_out.checked_add(excess)?)?
    }
  } else if short_curve > long_curve {
    let net = short_curve - long_curve;
    let max_bonds_out = calculate_max_buy_bonds_out(ze, y, t, c, mu)?;

    if net <= max_bonds_out {
      match calculate_shares_in_given_bonds_out_up(ze, y, net, t, c, mu) {
        Some(shares_in) => to_signed(shares_in)?,
        None if net < params.minimum_transaction_amount => 0,
        None => return None,
      }
    } else {
      let max_shares_in = calculate_max_buy_shares_in(ze, y, t, c, mu)?;
      let excess = div_down(net - max_bonds_out, c)?;
      to_signed(max_shares_in.checked_add(excess)?)?
    }
  } else {
    0
  };

  Some(trade)
}

/// Shares not backing long exposure, floored at zero
pub fn calculate_idle_share_reserves(
  share_reserves: u128,
  long_exposure: u128,
  vault_share_price: u128,
  minimum_share_reserves: u128,
) -> Option<u128> {
  let exposure_shares = div_up(long_exposure, vault_share_price)?;
  Some(
    share_reserves
      .saturating_sub(exposure_shares)
      .saturating_sub(minimum_share_reserves),
  )
}

/// Base value of one LP share: `PV * c / (lp_total + withdrawal_outstanding)`
pub fn calculate_lp_share_price(present_value: u128, total_lp_shares: u128, vault_share_price: u128) -> Option<u128> {
  if total_lp_shares == 0 {
    return Some(0);
  }
  mul_div_down(present_value, vault_share_price, total_lp_shares)
}

/// Adds (or removes) `delta` shares of liquidity while holding the spot price
/// fixed: `zeta` and `y` scale with `z`.
///
/// # Returns
/// `(share_reserves, share_adjustment, bond_reserves)`; `None` when the
/// share reserves would drop below `minimum_share_reserves`
pub fn calculate_update_liquidity(
  share_reserves: u128,
  share_adjustment: i128,
  bond_reserves: u128,
  minimum_share_reserves: u128,
  delta: i128,
) -> Option<(u128, i128, u128)> {
  if delta == 0 {
    return Some((share_reserves, share_adjustment, bond_reserves));
  }

  let new_share_reserves = if delta > 0 {
    share_reserves.checked_add(delta as u128)?
  } else {
    share_reserves.checked_sub(delta.unsigned_abs())?
  };
  if new_share_reserves < minimum_share_reserves || share_reserves == 0 {
    return None;
  }

  // Rounded so effective share reserves never grow from rounding.
  let new_share_adjustment = if share_adjustment >= 0 {
    to_signed(mul_div_up(share_adjustment as u128, new_share_reserves, share_reserves)?)?
  } else {
    -to_signed(mul_div_down(share_adjustment.unsigned_abs(), new_share_reserves, share_reserves)?)?
  };

  let effective = calculate_effective_share_reserves(share_reserves, share_adjustment)?;
  let new_effective = calculate_effective_share_reserves(new_share_reserves, new_share_adjustment)?;
  let new_bond_reserves = mul_div_down(bond_reserves, new_effective, effective)?;

  Some((new_share_reserves, new_share_adjustment, new_bond_reserves))
}

/// Present value after removing `delta` shares of liquidity
fn present_value_after_removal(params: &PresentValueParams, delta: u128) -> Option<u128> {
  let (share_reserves, share_adjustment, bond_reserves) = calculate_update_liquidity(
    params.share_reserves,
    params.share_adjustment,
    params.bond_reserves,
    params.minimum_share_reserves,
    -to_signed(delta)?,
  )?;

  calculate_present_value(&PresentValueParams {
    share_reserves,
    share_adjustment,
    bond_reserves,
    ..*params
  })
}

/// Largest share amount that can leave the pool without breaking the floor
/// on effective share reserves or leaving a net short unbackable.
pub fn calculate_max_share_reserves_delta(params: &PresentValueParams, idle: u128) -> Option<u128> {
  let z = params.share_reserves;
  let ze = params.effective_share_reserves()?;
  if ze == 0 {
    return Some(0);
  }

  let floor_cap = z
    .saturating_sub(params.minimum_share_reserves)
    .min(z.saturating_sub(mul_div_up(z, params.minimum_share_reserves, ze)?));
  let mut max_delta = idle.min(floor_cap);

  let long_curve = mul_up(params.longs_outstanding, params.long_average_time_remaining)?;
  let short_curve = mul_down(params.shorts_outstanding, params.short_average_time_remaining)?;
  if short_curve > long_curve {
    let net_short = short_curve - long_curve;
    let t = params.curve_exponent()?;
    let max_bonds_out = calculate_max_buy_bonds_out(
      ze,
      params.bond_reserves,
      t,
      params.vault_share_price,
      params.initial_vault_share_price,
    )?;
    if max_bonds_out <= net_short {
      return Some(0);
    }

    // The curve's buy capacity scales with z, so only the fraction of z
    // the net short does not need can leave.
    let keep = div_up(net_short, max_bonds_out)?;
    max_delta = max_delta.min(mul_down(z, ONE.saturating_sub(keep))?);
  }

  Some(max_delta)
}

/// Withdrawal shares paid out by removing `delta` shares at the current
/// LP share price, rounded up
pub fn calculate_withdrawal_shares_redeemed(
  params: &DistributeExcessIdleParams,
  delta: u128,
) -> Option<u128> {
  let starting = params.starting_present_value;
  if starting == 0 {
    return Some(0);
  }
  let ending = present_value_after_removal(&params.present_value_params, delta)?;
  if ending >= starting {
    return Some(0);
  }

  let total = params
    .active_lp_total_supply
    .checked_add(params.withdrawal_shares_outstanding)?;
  mul_div_up(starting - ending, total, starting)
}

/// `PV(x) * l >= PV0 * l_active`: removing `x` keeps the remaining LPs' share
/// price at or above where it started.
fn keeps_lp_share_price(params: &DistributeExcessIdleParams, delta: u128) -> bool {
  let Some(ending) = present_value_after_removal(&params.present_value_params, delta) else {
    return false;
  };
  let Some(total) = params
    .active_lp_total_supply
    .checked_add(params.withdrawal_shares_outstanding)
  else {
    return false;
  };

  let lhs = U256::from(ending).checked_mul(U256::from(total));
  let rhs = U256::from(params.starting_present_value).checked_mul(U256::from(params.active_lp_total_supply));
  match (lhs, rhs) {
    (Some(lhs), Some(rhs)) => lhs >= rhs,
    _ => false,
  }
}

/// Largest share amount that can pay off every outstanding withdrawal share
/// without lowering the remaining LPs' share price. Bisects between zero and
/// `max_delta` starting from the pro-rata guess.
pub fn calculate_share_proceeds(params: &DistributeExcessIdleParams, max_delta: u128) -> Option<u128> {
  let total = params
    .active_lp_total_supply
    .checked_add(params.withdrawal_shares_outstanding)?;
  let guess = mul_div_down(
    params.withdrawal_shares_outstanding,
    params.starting_present_value,
    total,
  )?
  .min(max_delta);

  let mut lo = 0u128;
  let mut hi = max_delta;
  if keeps_lp_share_price(params, guess) {
    lo = guess;
  } else {
    hi = guess;
  }

  let mut iterations = 0u64;
  while hi - lo > params.tolerance && iterations < params.max_iterations {
    let mid = lo + (hi - lo) / 2;
    if keeps_lp_share_price(params, mid) {
      lo = mid;
    } else {
      hi = mid;
    }
    iterations += 1;
  }

  Some(lo)
}

/// Computes how many withdrawal shares idle liquidity can pay off and the
/// shares set aside for them.
///
/// # Returns
/// `(withdrawal_shares_redeemed, share_proceeds)`
pub fn calculate_distribute_excess_idle(params: &DistributeExcessIdleParams) -> Option<(u128, u128)> {
  if params.withdrawal_shares_outstanding == 0 || params.idle == 0 {
    return Some((0, 0));
  }

  let max_delta = calculate_max_share_reserves_delta(&params.present_value_params, params.idle)?;
  if max_delta == 0 {
    return Some((0, 0));
  }

  let redeemed = calculate_withdrawal_shares_redeemed(params, max_delta)?;
  if redeemed == 0 {
    return Some((0, 0));
  }
  if redeemed <= params.withdrawal_shares_outstanding {
    return Some((redeemed, max_delta));
  }

  let proceeds = calculate_share_proceeds(params, max_delta)?;
  if proceeds == 0 {
    return Some((0, 0));
  }
  Some((params.withdrawal_shares_outstanding, proceeds))
}

#[cfg(test)]
mod tests {
  use super::*;

  const TS: u128 = 45_000_000_000_000_000;

  fn idle_pool() -> PresentValueParams {
    PresentValueParams {
      share_reserves: 1_000 * ONE,
      share_adjustment: 0,
      bond_reserves: 1_100 * ONE,
      vault_share_price: ONE,
      initial_vault_share_price: ONE,
      minimum_share_reserves: ONE,
      minimum_transaction_amount: ONE / 1_000,
      time_stretch: TS,
      ..Default::default()
    }
  }

  fn distribute_params(idle: u128, active: u128, outstanding: u128) -> DistributeExcessIdleParams {
    let pv = idle_pool();
    DistributeExcessIdleParams {
      present_value_params: pv,
      starting_present_value: calculate_present_value(&pv).unwrap(),
      active_lp_total_supply: active,
      withdrawal_shares_outstanding: outstanding,
      idle,
      tolerance: 1_000_000_000,
      max_iterations: 64,
    }
  }

  #[test]
  fn test_present_value_without_positions() {
    assert_eq!(calculate_present_value(&idle_pool()), Some(999 * ONE));
  }

  #[test]
  fn test_longs_lower_present_value() {
    let base = calculate_present_value(&idle_pool()).unwrap();
    let with_longs = calculate_present_value(&PresentValueParams {
      longs_outstanding: 100 * ONE,
      long_average_time_remaining: ONE / 2,
      ..idle_pool()
    })
    .unwrap();
    assert!(with_longs < base);
    // Half matures at face value, half sells on a sub-par curve.
    assert!(base - with_longs < 100 * ONE);
    assert!(base - with_longs > 99 * ONE);
  }

  #[test]
  fn test_shorts_raise_present_value() {
    let base = calculate_present_value(&idle_pool()).unwrap();
    let with_shorts = calculate_present_value(&PresentValueParams {
      shorts_outstanding: 100 * ONE,
      short_average_time_remaining: ONE,
      ..idle_pool()
    })
    .unwrap();
    assert!(with_shorts > base);
  }

  #[test]
  fn test_negative_present_value_fails() {
    let params = PresentValueParams {
      longs_outstanding: 2_000 * ONE,
      long_average_time_remaining: 0,
      ..idle_pool()
    };
    assert_eq!(calculate_present_value(&params), None);
  }

  #[test]
  fn test_idle_share_reserves() {
    assert_eq!(calculate_idle_share_reserves(100 * ONE, 30 * ONE, ONE, ONE), Some(69 * ONE));
    assert_eq!(calculate_idle_share_reserves(100 * ONE, 200 * ONE, ONE, ONE), Some(0));
    assert_eq!(calculate_idle_share_reserves(100 * ONE, 60 * ONE, 2 * ONE, ONE), Some(69 * ONE));
  }

  #[test]
  fn test_lp_share_price() {
    assert_eq!(calculate_lp_share_price(999 * ONE, 999 * ONE, 2 * ONE), Some(2 * ONE));
    assert_eq!(calculate_lp_share_price(999 * ONE, 0, ONE), Some(0));
  }

  #[test]
  fn test_update_liquidity_keeps_ratio() {
    let (z, zeta, y) = calculate_update_liquidity(1_000 * ONE, 100 * ONE as i128, 1_800 * ONE, ONE, 1_000 * ONE as i128).unwrap();
    assert_eq!(z, 2_000 * ONE);
    assert_eq!(zeta, 200 * ONE as i128);
    assert_eq!(y, 3_600 * ONE);

    let (z, zeta, _) = calculate_update_liquidity(1_000 * ONE, -3, 1_800 * ONE, ONE, -(500 * ONE as i128)).unwrap();
    assert_eq!(z, 500 * ONE);
    assert_eq!(zeta, -1);
  }

  #[test]
  fn test_update_liquidity_respects_floor() {
    assert_eq!(calculate_update_liquidity(10 * ONE, 0, 11 * ONE, 5 * ONE, -(6 * ONE as i128)), None);
  }

  #[test]
  fn test_max_delta_capped_by_floor_and_idle() {
    assert_eq!(calculate_max_share_reserves_delta(&idle_pool(), 50 * ONE), Some(50 * ONE));
    assert_eq!(calculate_max_share_reserves_delta(&idle_pool(), 5_000 * ONE), Some(999 * ONE));
  }

  #[test]
  fn test_max_delta_zero_when_net_short_exhausts_curve() {
    let params = PresentValueParams {
      shorts_outstanding: 100_000 * ONE,
      short_average_time_remaining: ONE,
      ..idle_pool()
    };
    assert_eq!(calculate_max_share_reserves_delta(&params, 500 * ONE), Some(0));
  }

  #[test]
  fn test_distribute_nothing_without_withdrawals() {
    assert_eq!(calculate_distribute_excess_idle(&distribute_params(999 * ONE, 999 * ONE, 0)), Some((0, 0)));
    assert_eq!(calculate_distribute_excess_idle(&distribute_params(0, 900 * ONE, 99 * ONE)), Some((0, 0)));
  }

  #[test]
  fn test_distribute_partial_when_idle_is_short() {
    let result = calculate_distribute_excess_idle(&distribute_params(50 * ONE, 900 * ONE, 99 * ONE));
    assert_eq!(result, Some((50 * ONE, 50 * ONE)));
  }

  #[test]
  fn test_distribute_pays_all_withdrawals_at_fair_price() {
    let (redeemed, proceeds) =
      calculate_distribute_excess_idle(&distribute_params(999 * ONE, 900 * ONE, 99 * ONE)).unwrap();
    assert_eq!(redeemed, 99 * ONE);
    assert_eq!(proceeds, 99 * ONE);
  }
}
