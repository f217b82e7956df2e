//! Invariant assertions for the hyperdrive pool
//! These are the rules that protect pool solvency.
//! Every state-changing engine operation calls them before committing.

use anchor_lang::prelude::*;

use crate::{
  constants::ONE,
  error::HyperdriveError,
  math::{div_up, mul_up},
  state::PoolConfig,
};

/// Assert the pool configuration is usable
///
/// Checkpoints must tile the position duration, fees are fractions of one
/// and the time stretch lies strictly between zero and one.
pub fn assert_valid_config(config: &PoolConfig) -> Result<()> {
  require!(config.checkpoint_duration > 0, HyperdriveError::InvalidConfig);
  require!(config.position_duration >= config.checkpoint_duration, HyperdriveError::InvalidConfig);
  require!(
    config.position_duration % config.checkpoint_duration == 0,
    HyperdriveError::InvalidConfig
  );
  require!(config.fees.curve <= ONE, HyperdriveError::InvalidConfig);
  require!(config.fees.flat <= ONE, HyperdriveError::InvalidConfig);
  require!(config.fees.governance_lp <= ONE, HyperdriveError::InvalidConfig);
  require!(
    config.time_stretch > 0 && config.time_stretch < ONE,
    HyperdriveError::InvalidConfig
  );
  require!(config.initial_vault_share_price > 0, HyperdriveError::InvalidConfig);
  require!(config.minimum_share_reserves > 0, HyperdriveError::InvalidConfig);
  require!(config.tolerances.distribute_excess_idle_max_iterations > 0, HyperdriveError::InvalidConfig);
  Ok(())
}

/// Assert effective share reserves stay at or above the floor
pub fn assert_effective_share_reserves_above_minimum(
  effective_share_reserves: u128,
  minimum_share_reserves: u128,
) -> Result<()> {
  require!(
    effective_share_reserves >= minimum_share_reserves,
    HyperdriveError::BelowMinimumShareReserves
  );
  Ok(())
}

/// Assert the share reserves cover the long exposure plus the floor
///
/// # Arguments
/// * `share_reserves` - `z`
/// * `long_exposure` - Bonds the pool owes longs at maturity, in base
/// * `vault_share_price` - Current vault share price
/// * `minimum_share_reserves` - Floor on share reserves
pub fn assert_solvency(
  share_reserves: u128,
  long_exposure: u128,
  vault_share_price: u128,
  minimum_share_reserves: u128,
) -> Result<()> {
  let required = div_up(long_exposure, vault_share_price)
    .and_then(|v| v.checked_add(minimum_share_reserves))
    .ok_or(HyperdriveError::ArithmeticOverflow)?;

  require!(share_reserves >= required, HyperdriveError::InsufficientLiquidity);
  Ok(())
}

/// Assert no more withdrawal shares are ready than exist
pub fn assert_withdrawal_ready_within_supply(ready: u128, total_supply: u128) -> Result<()> {
  require!(ready <= total_supply, HyperdriveError::InsufficientBalance);
  Ok(())
}

/// Assert the LP share price did not fall by more than `relative_tolerance`
pub fn assert_lp_share_price_non_decreasing(
  before: u128,
  after: u128,
  relative_tolerance: u128,
) -> Result<()> {
  let slack = mul_up(before, relative_tolerance).ok_or(HyperdriveError::ArithmeticOverflow)?;
  require!(
    after >= before.saturating_sub(slack),
    HyperdriveError::LpSharePriceDecreased
  );
  Ok(())
}

/// Assert adding liquidity did not lower the present value
pub fn assert_present_value_not_decreased(before: u128, after: u128) -> Result<()> {
  require!(after >= before, HyperdriveError::DecreasedPresentValueWhenAddingLiquidity);
  Ok(())
}

/// Assert the pool's maps fit in their account
pub fn assert_storage_within_bounds(
  checkpoints: usize,
  max_checkpoints: usize,
  positions: usize,
  max_positions: usize,
) -> Result<()> {
  require!(checkpoints <= max_checkpoints, HyperdriveError::StorageFull);
  require!(positions <= max_positions, HyperdriveError::StorageFull);
  Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(assert_valid_config(&PoolConfig::default()).is_ok());
    }

    #[test]
    fn test_config_checkpoint_must_divide_position() {
        let config = PoolConfig {
            position_duration: 100,
            checkpoint_duration: 30,
            ..PoolConfig::default()
        };
        assert_eq!(
            assert_valid_config(&config).unwrap_err(),
            HyperdriveError::InvalidConfig.into()
        );

        let config = PoolConfig { checkpoint_duration: 0, ..PoolConfig::default() };
        assert!(assert_valid_config(&config).is_err());
    }

    #[test]
    fn test_config_rejects_bad_fees_and_stretch() {
        let mut config = PoolConfig::default();
        config.fees.curve = ONE + 1;
        assert!(assert_valid_config(&config).is_err());

        let config = PoolConfig { time_stretch: ONE, ..PoolConfig::default() };
        assert!(assert_valid_config(&config).is_err());

        let config = PoolConfig { time_stretch: 0, ..PoolConfig::default() };
        assert!(assert_valid_config(&config).is_err());

        let config = PoolConfig { minimum_share_reserves: 0, ..PoolConfig::default() };
        assert!(assert_valid_config(&config).is_err());
    }

    #[test]
    fn test_effective_share_reserves_floor() {
        assert!(assert_effective_share_reserves_above_minimum(10, 10).is_ok());
        assert_eq!(
            assert_effective_share_reserves_above_minimum(9, 10).unwrap_err(),
            HyperdriveError::BelowMinimumShareReserves.into()
        );
    }

    #[test]
    fn test_solvency_valid() {
        // 100 shares at c = 2 cover 180 base of longs plus a floor of 10
        let result = assert_solvency(100 * ONE, 180 * ONE, 2 * ONE, 10 * ONE);
        assert!(result.is_ok());
    }

    #[test]
    fn test_solvency_fails() {
        let result = assert_solvency(100 * ONE, 181 * ONE, 2 * ONE, 10 * ONE);
        assert_eq!(result.unwrap_err(), HyperdriveError::InsufficientLiquidity.into());
    }

    #[test]
    fn test_withdrawal_ready_within_supply() {
        assert!(assert_withdrawal_ready_within_supply(5, 5).is_ok());
        assert!(assert_withdrawal_ready_within_supply(6, 5).is_err());
    }

    #[test]
    fn test_lp_share_price_within_tolerance() {
        let tolerance = 10_000_000_000; // 1e-8
        assert!(assert_lp_share_price_non_decreasing(ONE, ONE, tolerance).is_ok());
        assert!(assert_lp_share_price_non_decreasing(ONE, ONE - 10_000_000_000, tolerance).is_ok());
        assert_eq!(
            assert_lp_share_price_non_decreasing(ONE, ONE - 10_000_000_001, tolerance).unwrap_err(),
            HyperdriveError::LpSharePriceDecreased.into()
        );
    }

    #[test]
    fn test_present_value_not_decreased() {
        assert!(assert_present_value_not_decreased(100, 100).is_ok());
        assert!(assert_present_value_not_decreased(100, 99).is_err());
    }

    #[test]
    fn test_storage_within_bounds() {
        assert!(assert_storage_within_bounds(64, 64, 10, 64).is_ok());
        assert!(assert_storage_within_bounds(65, 64, 10, 64).is_err());
        assert!(assert_storage_within_bounds(1, 64, 65, 64).is_err());
    }
}
