mod common;

use common::*;
use hyperdrive::constants::ONE;
use hyperdrive::state::{AssetKind, Pool};

const SEEDS: u64 = 20;
const STEPS_PER_SEED: usize = 200;

fn xorshift64(seed: &mut u64) -> u64 {
    let mut x = *seed;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *seed = x;
    x
}

fn rand_range(seed: &mut u64, lo: u64, hi: u64) -> u64 {
    if hi <= lo {
        return lo;
    }
    lo + (xorshift64(seed) % (hi - lo + 1))
}

/// What the simulated traders hold outside the pool
#[derive(Default)]
struct Holdings {
    positions: Vec<(AssetKind, u64, u128)>,
    lp_shares: u128,
    withdrawal_shares: u128,
}

impl Holdings {
    fn take_position(&mut self, rng: &mut u64) -> Option<(AssetKind, u64, u128)> {
        if self.positions.is_empty() {
            return None;
        }
        let index = (xorshift64(rng) % self.positions.len() as u64) as usize;
        Some(self.positions.swap_remove(index))
    }
}

fn assert_pool_invariants(pool: &Pool, source: &MockYieldSource, now: u64) {
    pool.assert_solvent(now, source.vault_share_price).unwrap();
    assert_share_ledger(pool, source);
    assert!(pool.market.share_reserves >= pool.config.minimum_share_reserves);
    assert!(pool.effective_share_reserves().unwrap() >= pool.config.minimum_share_reserves);
    assert!(pool.market.withdrawal_shares_ready_to_withdraw <= pool.market.withdrawal_share_total_supply);
    assert!(!pool.locked);
}

fn step(pool: &mut Pool, source: &mut MockYieldSource, holdings: &mut Holdings, rng: &mut u64, now: u64) {
    let snapshot = pool.clone();
    let outcome = match xorshift64(rng) % 7 {
        0 => {
            let base = rand_range(rng, 1, 20_000) as u128 * ONE;
            pool.open_long(base, 0, 0, now, source).map(|(maturity, bonds)| {
                holdings.positions.push((AssetKind::Long, maturity, bonds));
            })
        }
        1 => {
            let bonds = rand_range(rng, 1, 20_000) as u128 * ONE;
            pool.open_short(bonds, u128::MAX, 0, now, source).map(|(maturity, _)| {
                holdings.positions.push((AssetKind::Short, maturity, bonds));
            })
        }
        2 | 3 => match holdings.take_position(rng) {
            Some((kind, maturity, bonds)) => {
                let result = match kind {
                    AssetKind::Long => pool.close_long(maturity, bonds, 0, now, source),
                    AssetKind::Short => pool.close_short(maturity, bonds, 0, now, source),
                };
                if result.is_err() {
                    holdings.positions.push((kind, maturity, bonds));
                }
                result.map(|_| ())
            }
            None => Ok(()),
        },
        4 => {
            let contribution = rand_range(rng, 1, 100_000) as u128 * ONE;
            pool.add_liquidity(contribution, 0, 0, u128::MAX, now, source).map(|lp_shares| {
                holdings.lp_shares += lp_shares;
            })
        }
        5 => {
            if holdings.lp_shares == 0 {
                Ok(())
            } else {
                let lp_shares = holdings.lp_shares / rand_range(rng, 1, 4) as u128;
                pool.remove_liquidity(lp_shares, 0, now, source).map(|(_, withdrawal_shares)| {
                    holdings.lp_shares -= lp_shares;
                    holdings.withdrawal_shares += withdrawal_shares;
                })
            }
        }
        _ => {
            if holdings.withdrawal_shares == 0 {
                let latest = pool.latest_checkpoint(now);
                pool.checkpoint(latest, now, source)
            } else {
                pool.redeem_withdrawal_shares(holdings.withdrawal_shares, 0, now, source).map(
                    |(_, redeemed)| {
                        holdings.withdrawal_shares -= redeemed;
                    },
                )
            }
        }
    };

    if outcome.is_err() {
        assert_eq!(*pool, snapshot, "failed operation changed the pool");
    }
    pool.prune_checkpoints(now);
}

#[test]
fn random_action_sequences_preserve_invariants() {
    for seed in 1..=SEEDS {
        let mut rng = seed;
        let (mut pool, mut source, lp_shares) = deploy(1_000_000 * ONE, FIVE_PERCENT);
        let mut holdings = Holdings { lp_shares, ..Holdings::default() };
        let mut now = START;

        for _ in 0..STEPS_PER_SEED {
            if xorshift64(&mut rng) % 3 == 0 {
                let elapsed = rand_range(&mut rng, 1, 5 * DAY);
                let apr = rand_range(&mut rng, 0, 100) as u128 * ONE / 1_000;
                source.accrue(apr, elapsed);
                now += elapsed;
            }

            step(&mut pool, &mut source, &mut holdings, &mut rng, now);
            assert_pool_invariants(&pool, &source, now);
        }
    }
}

#[test]
fn unwinding_everything_pays_out_no_more_than_came_in() {
    for seed in 1..=5 {
        let mut rng = seed * 7_919;
        let (mut pool, mut source, lp_shares) = deploy(1_000_000 * ONE, FIVE_PERCENT);
        let mut holdings = Holdings { lp_shares, ..Holdings::default() };
        let mut now = START;

        for _ in 0..60 {
            let elapsed = rand_range(&mut rng, 1, 3 * DAY);
            source.accrue(FIVE_PERCENT, elapsed);
            now += elapsed;
            step(&mut pool, &mut source, &mut holdings, &mut rng, now);
        }

        // Let everything mature, then settle
        now += YEAR + DAY;
        source.accrue(FIVE_PERCENT, YEAR + DAY);
        for (kind, maturity, bonds) in std::mem::take(&mut holdings.positions) {
            match kind {
                AssetKind::Long => pool.close_long(maturity, bonds, 0, now, &mut source).unwrap(),
                AssetKind::Short => pool.close_short(maturity, bonds, 0, now, &mut source).unwrap(),
            };
        }
        assert!(pool.positions.is_empty());

        if holdings.lp_shares > 0 {
            let (_, withdrawal_shares) = pool.remove_liquidity(holdings.lp_shares, 0, now, &mut source).unwrap();
            holdings.withdrawal_shares += withdrawal_shares;
        }
        if holdings.withdrawal_shares > 0 {
            pool.redeem_withdrawal_shares(holdings.withdrawal_shares, 0, now, &mut source).unwrap();
        }

        assert_share_ledger(&pool, &source);
        assert!(source.base_out <= source.base_in + source.interest);
    }
}
