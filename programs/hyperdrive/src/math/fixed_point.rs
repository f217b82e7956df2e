//! 18-decimal fixed point arithmetic
//! Products are taken in 256 bits so no intermediate overflow is possible;
//! every result is checked and `None` means the value left the u128 range
//! or a division by zero was attempted.

use uint::construct_uint;

construct_uint! {
  /// 256-bit unsigned integer for intermediate products
  pub struct U256(4);
}

/// 1.0 in 18-decimal fixed point
pub const ONE: u128 = 1_000_000_000_000_000_000;

/// 1.0 at the 36-decimal precision used inside `ln` and `exp`
const ONE_36: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000;

/// ln(2) at 36 decimals
const LN_2_36: u128 = 693_147_180_559_945_309_417_232_121_458_176_568;

/// exp(x) underflows to zero at 18 decimals below this exponent
const MIN_EXP_36: i128 = -42 * ONE_36 as i128;

/// exp(x) no longer fits a u128 at 18 decimals above this exponent
const MAX_EXP_36: i128 = 48 * ONE_36 as i128;

/// Multiply two values and divide by a third, rounding DOWN
pub fn mul_div_down(a: u128, b: u128, c: u128) -> Option<u128> {
  if c == 0 {
    return None;
  }

  let product = U256::from(a).checked_mul(U256::from(b))?;
  u128::try_from(product / U256::from(c)).ok()
}

/// Multiply two values and divide by a third, rounding UP
pub fn mul_div_up(a: u128, b: u128, c: u128) -> Option<u128> {
  if c == 0 {
    return None;
  }

  let product = U256::from(a).checked_mul(U256::from(b))?;
  let (quotient, remainder) = product.div_mod(U256::from(c));
  let quotient = if remainder.is_zero() {
    quotient
  } else {
    quotient.checked_add(U256::one())?
  };

  u128::try_from(quotient).ok()
}

/// a * b, rounding down
pub fn mul_down(a: u128, b: u128) -> Option<u128> {
  mul_div_down(a, b, ONE)
}

/// a * b, rounding up
pub fn mul_up(a: u128, b: u128) -> Option<u128> {
  mul_div_up(a, b, ONE)
}

/// a / b, rounding down
pub fn div_down(a: u128, b: u128) -> Option<u128> {
  mul_div_down(a, ONE, b)
}

/// a / b, rounding up
pub fn div_up(a: u128, b: u128) -> Option<u128> {
  mul_div_up(a, ONE, b)
}

/// Natural logarithm of an 18-decimal value, returned as a signed
/// 18-decimal value. Truncates toward zero.
pub fn ln(x: u128) -> Option<i128> {
  Some(ln_36(x)? / ONE as i128)
}

/// e^x for a signed 18-decimal exponent, rounding down
pub fn exp(x: i128) -> Option<u128> {
  exp_36(x.checked_mul(ONE as i128)?)
}

/// x^y = exp(y * ln(x)) for 18-decimal x and y
///
/// # Arguments
/// * `x` - Base, 18 decimals
/// * `y` - Exponent, 18 decimals
///
/// # Returns
/// The power at 18 decimals. The result is accurate to within a few
/// units of the last place; callers pick the rounding direction of the
/// surrounding operations.
pub fn pow(x: u128, y: u128) -> Option<u128> {
  if y == 0 {
    return Some(ONE);
  }
  if x == 0 {
    return Some(0);
  }

  let ln_x = ln_36(x)?;
  let product = U256::from(ln_x.unsigned_abs())
    .checked_mul(U256::from(y))?
    / U256::from(ONE);

  // Out of range in either direction: tiny results floor to zero,
  // huge results cannot be represented.
  if product > U256::from(MAX_EXP_36 as u128) {
    return if ln_x < 0 { Some(0) } else { None };
  }

  let magnitude = product.low_u128() as i128;
  exp_36(if ln_x < 0 { -magnitude } else { magnitude })
}

/// ln(x) at 36 decimals for an 18-decimal x.
///
/// x is normalized to m * 2^k with m in [1, 2), then
/// ln(m) = 2 * atanh((m - 1) / (m + 1)) is summed until the terms vanish.
fn ln_36(x: u128) -> Option<i128> {
  if x == 0 {
    return None;
  }

  let one = U256::from(ONE_36);
  let two = one << 1u32;

  let mut m = U256::from(x).checked_mul(U256::from(ONE))?;
  let mut k: i128 = 0;
  while m >= two {
    m = m >> 1u32;
    k += 1;
  }
  while m < one {
    m = m << 1u32;
    k -= 1;
  }

  let s = (m - one) * one / (m + one);
  let s_squared = s * s / one;

  let mut term = s;
  let mut sum = U256::zero();
  let mut n = 1u64;
  while !term.is_zero() {
    sum = sum + term / U256::from(n);
    term = term * s_squared / one;
    n += 2;
  }

  let ln_m = i128::try_from(sum << 1u32).ok()?;
  k.checked_mul(LN_2_36 as i128)?.checked_add(ln_m)
}

/// e^x for a 36-decimal exponent, returned at 18 decimals.
///
/// x = k * ln(2) + r with |r| <= ln(2) / 2, e^r from its Taylor series,
/// then shifted by 2^k.
fn exp_36(x: i128) -> Option<u128> {
  if x < MIN_EXP_36 {
    return Some(0);
  }
  if x > MAX_EXP_36 {
    return None;
  }

  let ln_2 = LN_2_36 as i128;
  let half = ln_2 / 2;
  let k = if x >= 0 { (x + half) / ln_2 } else { (x - half) / ln_2 };
  let r = x - k * ln_2;

  let one = U256::from(ONE_36);
  let r_abs = U256::from(r.unsigned_abs());

  let mut sum = one;
  let mut term = one;
  let mut n = 1u64;
  loop {
    term = term * r_abs / one / U256::from(n);
    if term.is_zero() {
      break;
    }
    sum = sum + term;
    n += 1;
  }

  let e_r = if r < 0 { one * one / sum } else { sum };
  let scaled = if k >= 0 {
    e_r << (k as u32)
  } else {
    e_r >> (k.unsigned_abs() as u32)
  };

  u128::try_from(scaled / U256::from(ONE)).ok()
}
