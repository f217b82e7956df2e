//! Pricing helpers layered on the YieldSpace curve
//! Spot price and rate, time stretch, fees, and the curve and flat legs of
//! opening and closing longs and shorts.

use super::fixed_point::{
  div_down, div_up, ln, mul_div_down, mul_div_up, mul_down, mul_up, pow, U256, ONE,
};
use super::yield_space::{
  calculate_bonds_out_given_shares_in_down, calculate_shares_in_given_bonds_out_up,
  calculate_shares_out_given_bonds_in_down,
};
use crate::constants::SECONDS_PER_YEAR;

/// Split of a close into its curve and flat parts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CloseTrade {
  /// Shares traded on the curve for the unmatured fraction
  pub share_curve: u128,
  /// Bonds traded on the curve
  pub bond_curve: u128,
  /// Shares settled at face value for the matured fraction
  pub share_flat: u128,
}

/// `z - zeta`; `None` when the adjustment exceeds the reserves
pub fn calculate_effective_share_reserves(share_reserves: u128, share_adjustment: i128) -> Option<u128> {
  if share_adjustment >= 0 {
    share_reserves.checked_sub(share_adjustment as u128)
  } else {
    share_reserves.checked_add(share_adjustment.unsigned_abs())
  }
}

/// Spot price of a bond in base: `(mu * ze / y)^ts`
pub fn calculate_spot_price(ze: u128, y: u128, time_stretch: u128, mu: u128) -> Option<u128> {
  pow(mul_div_down(mu, ze, y)?, time_stretch)
}

/// Fraction of a year covered by `duration` seconds
pub fn annualized_time(duration: u64) -> Option<u128> {
  mul_div_down(duration as u128, ONE, SECONDS_PER_YEAR as u128)
}

/// APR implied by buying a bond at `price` and holding it for `duration`
pub fn calculate_apr_from_price(price: u128, duration: u64) -> Option<u128> {
  let discount = ONE.checked_sub(price)?;
  div_down(discount, mul_up(price, annualized_time(duration)?)?)
}

/// Spot APR of the curve for its position duration
pub fn calculate_spot_apr(ze: u128, y: u128, time_stretch: u128, mu: u128, duration: u64) -> Option<u128> {
  calculate_apr_from_price(calculate_spot_price(ze, y, time_stretch, mu)?, duration)
}

/// Bond reserves that put the spot APR at `apr` for the given share reserves
pub fn calculate_initial_bond_reserves(
  ze: u128,
  mu: u128,
  apr: u128,
  duration: u64,
  time_stretch: u128,
) -> Option<u128> {
  let growth = ONE.checked_add(mul_down(apr, annualized_time(duration)?)?)?;
  let scale = pow(growth, div_up(ONE, time_stretch)?)?;
  mul_down(mul_down(mu, ze)?, scale)
}

/// Time stretch that makes the curve sensible for a target rate and term
///
/// The one-year calibration `1 / (5.24592 / (0.04665 * apr * 100))` is
/// rescaled by `ln(1 + apr * term) / ln(1 + apr)` for other terms.
pub fn calculate_time_stretch(apr: u128, duration: u64) -> Option<u128> {
  let denominator = mul_down(46_650_000_000_000_000, apr.checked_mul(100)?)?;
  let benchmark = div_down(ONE, div_down(5_245_920_000_000_000_000, denominator)?)?;

  let term_growth = ln(ONE.checked_add(mul_down(apr, annualized_time(duration)?)?)?)?;
  let year_growth = ln(ONE.checked_add(apr)?)?;
  if term_growth <= 0 || year_growth <= 0 {
    return None;
  }

  mul_div_down(benchmark, term_growth as u128, year_growth as u128)
}

/// Fraction of the term left before `maturity_time`, in `[0, ONE]`
pub fn calculate_normalized_time_remaining(maturity_time: u64, now: u64, duration: u64) -> Option<u128> {
  if maturity_time <= now {
    return Some(0);
  }
  let remaining = mul_div_down((maturity_time - now) as u128, ONE, duration as u128)?;
  Some(remaining.min(ONE))
}

/// Time remaining for an 18-decimal average maturity time
pub fn calculate_time_remaining_scaled(average_maturity_time: u128, now: u64, duration: u64) -> Option<u128> {
  let now_scaled = (now as u128).checked_mul(ONE)?;
  if average_maturity_time <= now_scaled {
    return Some(0);
  }
  let remaining = (average_maturity_time - now_scaled).checked_div(duration as u128)?;
  Some(remaining.min(ONE))
}

// SECTION: fees

/// Curve fee charged on opening a long, paid in bonds:
/// `phi_c * (1 / p - 1) * c * dz`
pub fn open_long_curve_fee(shares: u128, spot_price: u128, c: u128, curve_fee: u128) -> Option<u128> {
  let premium = div_up(ONE, spot_price)?.checked_sub(ONE)?;
  mul_up(mul_up(mul_up(premium, curve_fee)?, c)?, shares)
}

/// Curve fee charged on opening a short, paid in shares:
/// `phi_c * (1 - p) * dy / c`
pub fn open_short_curve_fee(bonds: u128, spot_price: u128, c: u128, curve_fee: u128) -> Option<u128> {
  let discount = ONE.checked_sub(spot_price)?;
  mul_div_up(mul_up(curve_fee, discount)?, bonds, c)
}

/// Curve fee on closing either side, in shares: `phi_c * (1 - p) * dy * t / c`
pub fn close_curve_fee(
  bonds: u128,
  time_remaining: u128,
  spot_price: u128,
  c: u128,
  curve_fee: u128,
) -> Option<u128> {
  let discount = ONE.checked_sub(spot_price)?;
  mul_up(mul_up(curve_fee, discount)?, mul_div_up(bonds, time_remaining, c)?)
}

/// Flat fee on the matured fraction of a close, in shares:
/// `dy * (1 - t) / c * phi_f`
pub fn close_flat_fee(bonds: u128, time_remaining: u128, c: u128, flat_fee: u128) -> Option<u128> {
  let matured = ONE.checked_sub(time_remaining)?;
  mul_up(mul_div_up(bonds, matured, c)?, flat_fee)
}

/// Governance's cut of a fee
pub fn governance_fee(fee: u128, governance_lp_fee: u128) -> Option<u128> {
  mul_down(fee, governance_lp_fee)
}

// SECTION: trades

/// Bonds out of the curve for `shares` paid in, before fees
pub fn calculate_open_long(ze: u128, y: u128, shares: u128, t: u128, c: u128, mu: u128) -> Option<u128> {
  calculate_bonds_out_given_shares_in_down(ze, y, shares, t, c, mu)
}

/// Curve and flat legs of closing `bonds` long bonds, before fees
pub fn calculate_close_long(
  ze: u128,
  y: u128,
  bonds: u128,
  time_remaining: u128,
  t: u128,
  c: u128,
  mu: u128,
) -> Option<CloseTrade> {
  let bond_curve = mul_down(bonds, time_remaining)?;
  let share_curve = if bond_curve > 0 {
    calculate_shares_out_given_bonds_in_down(ze, y, bond_curve, t, c, mu)?
  } else {
    0
  };
  let share_flat = mul_div_down(bonds, ONE.checked_sub(time_remaining)?, c)?;

  Some(CloseTrade { share_curve, bond_curve, share_flat })
}

/// Shares out of the curve for `bonds` sold by a short, before fees
pub fn calculate_open_short(ze: u128, y: u128, bonds: u128, t: u128, c: u128, mu: u128) -> Option<u128> {
  calculate_shares_out_given_bonds_in_down(ze, y, bonds, t, c, mu)
}

/// Curve and flat legs of buying back `bonds` short bonds, before fees
pub fn calculate_close_short(
  ze: u128,
  y: u128,
  bonds: u128,
  time_remaining: u128,
  t: u128,
  c: u128,
  mu: u128,
) -> Option<CloseTrade> {
  let bond_curve = mul_up(bonds, time_remaining)?.min(bonds);
  let share_curve = if bond_curve > 0 {
    calculate_shares_in_given_bonds_out_up(ze, y, bond_curve, t, c, mu)?
  } else {
    0
  };
  let share_flat = mul_div_up(bonds, ONE.checked_sub(time_remaining)?, c)?;

  Some(CloseTrade { share_curve, bond_curve, share_flat })
}

/// Shares a short locks per bond at the open checkpoint price, rounded up
pub fn short_collateral_up(bonds: u128, open_price: u128, flat_fee: u128) -> Option<u128> {
  mul_div_up(bonds, ONE.checked_add(flat_fee)?, open_price)
}

/// Shares a short's collateral locked at the open price, rounded down
pub fn short_collateral_locked(bonds: u128, open_price: u128, flat_fee: u128) -> Option<u128> {
  mul_div_down(bonds, ONE.checked_add(flat_fee)?, open_price)
}

/// Shares a short's collateral releases when it closes at `close_price`,
/// rounded down. Only the face value accrues from the open price; the flat
/// fee part is valued at the close price. Never more than was locked.
pub fn short_collateral_down(bonds: u128, open_price: u128, close_price: u128, flat_fee: u128) -> Option<u128> {
  let face = div_down(bonds, open_price)?;
  let fee = mul_div_down(bonds, flat_fee, close_price)?;
  let released = face.checked_add(fee)?;
  Some(released.min(short_collateral_locked(bonds, open_price, flat_fee)?))
}

/// Updates a weighted average when `weight` units at `value` join or leave
///
/// # Arguments
/// * `average` - Current average
/// * `total_weight` - Weight behind the current average
/// * `value` - Value of the units joining or leaving
/// * `weight` - Number of units joining or leaving
/// * `is_adding` - Direction of the change
///
/// # Returns
/// The new average, or zero once all weight has left
pub fn update_weighted_average(
  average: u128,
  total_weight: u128,
  value: u128,
  weight: u128,
  is_adding: bool,
) -> Option<u128> {
  if weight == 0 {
    return Some(average);
  }

  let current = U256::from(average).checked_mul(U256::from(total_weight))?;
  let delta = U256::from(value).checked_mul(U256::from(weight))?;

  let (numerator, denominator) = if is_adding {
    (current.checked_add(delta)?, total_weight.checked_add(weight)?)
  } else {
    if weight >= total_weight {
      return Some(0);
    }
    (current.saturating_sub(delta), total_weight - weight)
  };

  u128::try_from(numerator / U256::from(denominator)).ok()
}
