#![allow(dead_code)]

use anchor_lang::prelude::*;
use hyperdrive::constants::{DEFAULT_CHECKPOINT_DURATION, DEFAULT_POSITION_DURATION, ONE, SECONDS_PER_YEAR};
use hyperdrive::engine::YieldSource;
use hyperdrive::error::HyperdriveError;
use hyperdrive::math::{calculate_time_stretch, div_down, mul_div_down, mul_down};
use hyperdrive::state::{Fees, Pool, PoolConfig};

/// Day-aligned start time
pub const START: u64 = 19_700 * DEFAULT_CHECKPOINT_DURATION;
pub const DAY: u64 = DEFAULT_CHECKPOINT_DURATION;
pub const YEAR: u64 = DEFAULT_POSITION_DURATION;

pub const FIVE_PERCENT: u128 = 50_000_000_000_000_000;

/// In-memory yield source with a ledger of everything that moved
#[derive(Clone, Debug)]
pub struct MockYieldSource {
    pub vault_share_price: u128,
    pub total_shares: u128,
    pub base_in: u128,
    pub base_out: u128,
    pub interest: u128,
}

impl MockYieldSource {
    pub fn new(vault_share_price: u128) -> Self {
        Self {
            vault_share_price,
            total_shares: 0,
            base_in: 0,
            base_out: 0,
            interest: 0,
        }
    }

    /// Grows the share price at `apr` for `seconds`
    pub fn accrue(&mut self, apr: u128, seconds: u64) {
        let growth = mul_div_down(apr, seconds as u128, SECONDS_PER_YEAR as u128).unwrap();
        let new_price = self.vault_share_price + mul_down(self.vault_share_price, growth).unwrap();
        self.interest += mul_down(self.total_shares, new_price - self.vault_share_price).unwrap();
        self.vault_share_price = new_price;
    }

    /// Drops the share price by `loss` (18-decimal fraction)
    pub fn lose(&mut self, loss: u128) {
        self.vault_share_price -= mul_down(self.vault_share_price, loss).unwrap();
    }

    pub fn base_value(&self) -> u128 {
        mul_down(self.total_shares, self.vault_share_price).unwrap()
    }
}

impl YieldSource for MockYieldSource {
    fn vault_share_price(&self) -> Result<u128> {
        Ok(self.vault_share_price)
    }

    fn deposit(&mut self, base: u128) -> Result<u128> {
        let shares = div_down(base, self.vault_share_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
        self.total_shares += shares;
        self.base_in += base;
        Ok(shares)
    }

    fn withdraw(&mut self, shares: u128) -> Result<u128> {
        require!(shares <= self.total_shares, HyperdriveError::InsufficientBalance);
        self.total_shares -= shares;
        let base = mul_down(shares, self.vault_share_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
        self.base_out += base;
        Ok(base)
    }
}

/// Source whose transfers always fail
pub struct FailingYieldSource(pub u128);

impl YieldSource for FailingYieldSource {
    fn vault_share_price(&self) -> Result<u128> {
        Ok(self.0)
    }

    fn deposit(&mut self, _base: u128) -> Result<u128> {
        err!(HyperdriveError::DepositShortfall)
    }

    fn withdraw(&mut self, _shares: u128) -> Result<u128> {
        err!(HyperdriveError::InsufficientBalance)
    }
}

pub fn config(apr: u128) -> PoolConfig {
    PoolConfig {
        time_stretch: calculate_time_stretch(apr, DEFAULT_POSITION_DURATION).unwrap(),
        ..PoolConfig::default()
    }
}

pub fn feeless_config(apr: u128) -> PoolConfig {
    PoolConfig {
        fees: Fees { curve: 0, flat: 0, governance_lp: 0 },
        ..config(apr)
    }
}

/// Initialized pool at `apr` seeded with `contribution` base
pub fn deploy(contribution: u128, apr: u128) -> (Pool, MockYieldSource, u128) {
    deploy_with(config(apr), contribution, apr)
}

pub fn deploy_with(config: PoolConfig, contribution: u128, apr: u128) -> (Pool, MockYieldSource, u128) {
    let mut pool = Pool::new(config);
    let mut source = MockYieldSource::new(ONE);
    let lp_shares = pool.initialize(contribution, apr, START, &mut source).unwrap();
    (pool, source, lp_shares)
}

pub fn diff(a: u128, b: u128) -> u128 {
    if a > b { a - b } else { b - a }
}

/// Every share the pool accounts for is held by the yield source
pub fn assert_share_ledger(pool: &Pool, source: &MockYieldSource) {
    let market = &pool.market;
    let accounted = market.share_reserves +
        market.matured_share_reserves +
        market.withdrawal_share_proceeds +
        market.governance_fees_accrued;
    assert!(
        accounted <= source.total_shares,
        "pool accounts for {} shares, source holds {}",
        accounted,
        source.total_shares
    );
}
