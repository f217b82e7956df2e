//! YieldSpace bonding curve
//!
//! The curve holds `k = (c / mu) * (mu * ze)^t + y^t` constant, where `ze`
//! is the effective share reserves, `y` the bond reserves, `c` the vault
//! share price, `mu` the initial vault share price and `t = 1 - time_stretch`.
//! Every function rounds against the trader; `None` means the trade leaves
//! the curve's domain.

use super::fixed_point::{div_down, div_up, mul_div_down, mul_div_up, mul_down, mul_up, pow, ONE};

/// Curve invariant rounded up
pub fn k_up(ze: u128, y: u128, t: u128, c: u128, mu: u128) -> Option<u128> {
  let share_term = mul_div_up(c, pow(mul_up(mu, ze)?, t)?, mu)?;
  share_term.checked_add(pow(y, t)?)
}

/// Curve invariant rounded down
pub fn k_down(ze: u128, y: u128, t: u128, c: u128, mu: u128) -> Option<u128> {
  let share_term = mul_div_down(c, pow(mul_down(mu, ze)?, t)?, mu)?;
  share_term.checked_add(pow(y, t)?)
}

/// base^(1/t), rounded up by picking the exponent that enlarges the result
fn pow_inverse_up(base: u128, t: u128) -> Option<u128> {
  let exponent = if base >= ONE { div_up(ONE, t)? } else { div_down(ONE, t)? };
  pow(base, exponent)
}

/// base^(1/t), rounded down
fn pow_inverse_down(base: u128, t: u128) -> Option<u128> {
  let exponent = if base >= ONE { div_down(ONE, t)? } else { div_up(ONE, t)? };
  pow(base, exponent)
}

/// Bonds a trader receives for `dz` shares paid into the curve
///
/// # Arguments
/// * `ze` - Effective share reserves
/// * `y` - Bond reserves
/// * `dz` - Shares paid in
/// * `t` - One minus the time stretch
/// * `c` - Vault share price
/// * `mu` - Initial vault share price
///
/// # Returns
/// Bonds out, rounded down
pub fn calculate_bonds_out_given_shares_in_down(
  ze: u128,
  y: u128,
  dz: u128,
  t: u128,
  c: u128,
  mu: u128,
) -> Option<u128> {
  let k = k_up(ze, y, t, c, mu)?;
  let new_ze = ze.checked_add(dz)?;
  let share_term = mul_div_down(c, pow(mul_down(mu, new_ze)?, t)?, mu)?;
  let new_y = pow_inverse_up(k.checked_sub(share_term)?, t)?;
  y.checked_sub(new_y)
}

/// Bonds a trader must sell into the curve to take `dz` shares out
pub fn calculate_bonds_in_given_shares_out_up(
  ze: u128,
  y: u128,
  dz: u128,
  t: u128,
  c: u128,
  mu: u128,
) -> Option<u128> {
  let k = k_up(ze, y, t, c, mu)?;
  let new_ze = ze.checked_sub(dz)?;
  let share_term = mul_div_down(c, pow(mul_down(mu, new_ze)?, t)?, mu)?;
  let new_y = pow_inverse_up(k.checked_sub(share_term)?, t)?;
  new_y.checked_sub(y)
}

/// Shares a trader receives for `dy` bonds sold into the curve, rounded down
pub fn calculate_shares_out_given_bonds_in_down(
  ze: u128,
  y: u128,
  dy: u128,
  t: u128,
  c: u128,
  mu: u128,
) -> Option<u128> {
  let k = k_up(ze, y, t, c, mu)?;
  let bond_term = pow(y.checked_add(dy)?, t)?;
  let scaled = mul_div_up(k.checked_sub(bond_term)?, mu, c)?;
  let new_ze = div_up(pow_inverse_up(scaled, t)?, mu)?;
  ze.checked_sub(new_ze)
}

/// Shares a trader must pay in to take `dy` bonds out, rounded up
pub fn calculate_shares_in_given_bonds_out_up(
  ze: u128,
  y: u128,
  dy: u128,
  t: u128,
  c: u128,
  mu: u128,
) -> Option<u128> {
  let k = k_up(ze, y, t, c, mu)?;
  let bond_term = pow(y.checked_sub(dy)?, t)?;
  let scaled = mul_div_up(k.checked_sub(bond_term)?, mu, c)?;
  let new_ze = div_up(pow_inverse_up(scaled, t)?, mu)?;
  new_ze.checked_sub(ze)
}

/// Bond reserves at which the spot price reaches one: `mu * ze = y`, so
/// `k = (c / mu + 1) * y^t`.
fn optimal_bond_reserves_at_price_one(
  ze: u128,
  y: u128,
  t: u128,
  c: u128,
  mu: u128,
  round_up: bool,
) -> Option<u128> {
  let k = k_down(ze, y, t, c, mu)?;
  let denominator = div_up(c, mu)?.checked_add(ONE)?;
  if round_up {
    pow_inverse_up(div_up(k, denominator)?, t)
  } else {
    pow_inverse_down(div_down(k, denominator)?, t)
  }
}

/// Largest share amount that can be paid in before the spot price reaches
/// one. Zero when the price is already at or above one.
pub fn calculate_max_buy_shares_in(ze: u128, y: u128, t: u128, c: u128, mu: u128) -> Option<u128> {
  let optimal_y = optimal_bond_reserves_at_price_one(ze, y, t, c, mu, false)?;
  let optimal_ze = div_down(optimal_y, mu)?;
  Some(optimal_ze.saturating_sub(ze))
}

/// Largest bond amount that can be bought before the spot price reaches one
pub fn calculate_max_buy_bonds_out(ze: u128, y: u128, t: u128, c: u128, mu: u128) -> Option<u128> {
  let optimal_y = optimal_bond_reserves_at_price_one(ze, y, t, c, mu, true)?;
  Some(y.saturating_sub(optimal_y))
}

/// Largest bond amount that can be sold before share reserves hit their
/// floor.
///
/// The floor on effective share reserves is `z_min + max(0, -zeta)`: both
/// `z >= z_min` and `ze >= z_min` have to keep holding after the trade.
///
/// # Returns
/// `(max_bonds_in, max_shares_out)`; both zero when the pool already sits
/// at the floor.
pub fn calculate_max_sell_bonds_in(
  ze: u128,
  share_adjustment: i128,
  y: u128,
  minimum_share_reserves: u128,
  t: u128,
  c: u128,
  mu: u128,
) -> Option<(u128, u128)> {
  let adjustment_floor = if share_adjustment < 0 { share_adjustment.unsigned_abs() } else { 0 };
  let ze_floor = minimum_share_reserves.checked_add(adjustment_floor)?;
  if ze <= ze_floor {
    return Some((0, 0));
  }

  let k = k_down(ze, y, t, c, mu)?;
  let share_term = mul_div_up(c, pow(mul_up(mu, ze_floor)?, t)?, mu)?;
  let max_y = pow_inverse_down(k.checked_sub(share_term)?, t)?;

  Some((max_y.saturating_sub(y), ze - ze_floor))
}

#[cfg(test)]
mod tests {
  use super::*;

  const T: u128 = ONE - 45_000_000_000_000_000;
  const ZE: u128 = 1_000 * ONE;
  const Y: u128 = 1_100 * ONE;

  fn diff(a: u128, b: u128) -> u128 {
    if a > b { a - b } else { b - a }
  }

  #[test]
  fn test_k_rounding_order() {
    let up = k_up(ZE, Y, T, ONE, ONE).unwrap();
    let down = k_down(ZE, Y, T, ONE, ONE).unwrap();
    assert!(up >= down);
    assert!(up - down <= 2);
  }

  #[test]
  fn test_bonds_out_exceed_shares_in_below_par() {
    // Price below one, so a long receives more bonds than it pays shares.
    let bonds = calculate_bonds_out_given_shares_in_down(ZE, Y, 10 * ONE, T, ONE, ONE).unwrap();
    assert!(bonds > 10 * ONE);
    assert!(bonds < 11 * ONE);
  }

  #[test]
  fn test_long_round_trip_loses_only_rounding() {
    let dz = 10 * ONE;
    let bonds = calculate_bonds_out_given_shares_in_down(ZE, Y, dz, T, ONE, ONE).unwrap();
    let shares =
      calculate_shares_out_given_bonds_in_down(ZE + dz, Y - bonds, bonds, T, ONE, ONE).unwrap();
    assert!(shares <= dz);
    assert!(dz - shares < 1_000_000_000);
  }

  #[test]
  fn test_inverse_directions_agree() {
    let dz = 25 * ONE;
    let bonds_in = calculate_bonds_in_given_shares_out_up(ZE, Y, dz, T, ONE, ONE).unwrap();
    let shares_out = calculate_shares_out_given_bonds_in_down(ZE, Y, bonds_in, T, ONE, ONE).unwrap();
    assert!(diff(shares_out, dz) < 1_000_000_000);

    let dy = 25 * ONE;
    let shares_in = calculate_shares_in_given_bonds_out_up(ZE, Y, dy, T, ONE, ONE).unwrap();
    let bonds_out = calculate_bonds_out_given_shares_in_down(ZE, Y, shares_in, T, ONE, ONE).unwrap();
    assert!(diff(bonds_out, dy) < 1_000_000_000);
  }

  #[test]
  fn test_vault_share_price_changes_curve() {
    let c = 1_100_000_000_000_000_000;
    let at_par = calculate_bonds_out_given_shares_in_down(ZE, Y, 10 * ONE, T, ONE, ONE).unwrap();
    let grown = calculate_bonds_out_given_shares_in_down(ZE, Y, 10 * ONE, T, c, ONE).unwrap();
    // Each share is worth more base, so it buys more bonds.
    assert!(grown > at_par);
  }

  #[test]
  fn test_selling_too_many_bonds_fails() {
    assert!(calculate_shares_in_given_bonds_out_up(ZE, Y, Y + 1, T, ONE, ONE).is_none());
    assert!(calculate_bonds_in_given_shares_out_up(ZE, Y, ZE + 1, T, ONE, ONE).is_none());
  }

  #[test]
  fn test_max_buy_reaches_par() {
    let shares_in = calculate_max_buy_shares_in(ZE, Y, T, ONE, ONE).unwrap();
    let bonds_out = calculate_max_buy_bonds_out(ZE, Y, T, ONE, ONE).unwrap();
    assert!(shares_in > 0);
    // At price one bonds and shares trade 1:1 on the margin, so the two
    // limits describe the same trade.
    let bonds = calculate_bonds_out_given_shares_in_down(ZE, Y, shares_in, T, ONE, ONE).unwrap();
    assert!(diff(bonds, bonds_out) < 1_000_000_000_000);
    assert!(ZE + shares_in <= Y - bonds_out + 1_000_000_000_000);
  }

  #[test]
  fn test_max_buy_is_zero_above_par() {
    assert_eq!(calculate_max_buy_shares_in(Y, ZE, T, ONE, ONE), Some(0));
    assert_eq!(calculate_max_buy_bonds_out(Y, ZE, T, ONE, ONE), Some(0));
  }

  #[test]
  fn test_max_sell_stops_at_floor() {
    let z_min = 10 * ONE;
    let (bonds_in, shares_out) = calculate_max_sell_bonds_in(ZE, 0, Y, z_min, T, ONE, ONE).unwrap();
    assert_eq!(shares_out, ZE - z_min);

    let realized = calculate_shares_out_given_bonds_in_down(ZE, Y, bonds_in, T, ONE, ONE).unwrap();
    assert!(diff(realized, shares_out) < 1_000_000_000_000);
  }

  #[test]
  fn test_max_sell_respects_negative_adjustment() {
    let z_min = 10 * ONE;
    let (_, shares_out) = calculate_max_sell_bonds_in(ZE, -(50 * ONE as i128), Y, z_min, T, ONE, ONE).unwrap();
    assert_eq!(shares_out, ZE - 60 * ONE);
    assert_eq!(calculate_max_sell_bonds_in(z_min, 0, Y, z_min, T, ONE, ONE), Some((0, 0)));
  }
}
