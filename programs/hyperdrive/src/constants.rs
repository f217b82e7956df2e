//! Protocol-wide constants
//! Centralized location for defaults, tolerances and storage bounds

// PRECISION CONSTANTS
pub use crate::math::fixed_point::ONE;           // 1e18 fixed point
pub const SECONDS_PER_YEAR: u64 = 31_536_000;     // 365 days
pub const WAD_DECIMALS: u8 = 18;

// DEFAULT POOL CONFIGURATION
pub const DEFAULT_CHECKPOINT_DURATION: u64 = 86_400;        // 1 day
pub const DEFAULT_POSITION_DURATION: u64 = SECONDS_PER_YEAR; // 1 year
pub const DEFAULT_MINIMUM_SHARE_RESERVES: u128 = 10_000_000_000_000_000_000; // 10 shares
pub const DEFAULT_MINIMUM_TRANSACTION_AMOUNT: u128 = 1_000_000_000_000_000;  // 0.001 base
pub const DEFAULT_TIME_STRETCH: u128 = 44_463_125_629_060_298;          // 5% APR over 1 year

// FEE CONFIGURATION (1e18 = 100%)
pub const DEFAULT_CURVE_FEE: u128 = 10_000_000_000_000_000;        // 1%
pub const DEFAULT_FLAT_FEE: u128 = 500_000_000_000_000;            // 0.05%
pub const DEFAULT_GOVERNANCE_LP_FEE: u128 = 150_000_000_000_000_000; // 15%

// TOLERANCES
pub const LP_SHARE_PRICE_RELATIVE_TOLERANCE: u128 = 10_000_000_000;     // 1e-8
pub const DISTRIBUTE_EXCESS_IDLE_ABSOLUTE_TOLERANCE: u128 = 1_000_000_000; // 1e-9 shares
pub const DISTRIBUTE_EXCESS_IDLE_MAX_ITERATIONS: u64 = 64;

// STORAGE BOUNDS
// Keeps a PoolAccount under the 10 KiB limit for accounts created by `init`.
// Every open maturity pins at most two checkpoints (open and maturity).
pub const MAX_CHECKPOINTS: usize = 84;
pub const MAX_POSITIONS: usize = 40;
pub const MAX_TRADER_POSITIONS: usize = 16;
