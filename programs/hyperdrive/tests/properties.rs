//! Property tests for trading and liquidity
//! These tests use proptest to generate trade sizes and timings.

mod common;

use common::*;
use hyperdrive::constants::ONE;
use hyperdrive::math::mul_down;
use proptest::prelude::*;

// Trade sizes between 1 and 50k base
fn trade_strategy() -> impl Strategy<Value = u128> {
    (1u128..50_000).prop_map(|units| units * ONE)
}

// Pool sizes between 1M and 100M base
fn pool_strategy() -> impl Strategy<Value = u128> {
    (1_000_000u128..100_000_000).prop_map(|units| units * ONE)
}

// APRs between 1% and 20%
fn apr_strategy() -> impl Strategy<Value = u128> {
    (10u128..200).prop_map(|permille| permille * ONE / 1_000)
}

// Days into the term
fn elapsed_strategy() -> impl Strategy<Value = u64> {
    0u64..365
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn long_round_trip_never_profits(
        contribution in pool_strategy(),
        apr in apr_strategy(),
        base in trade_strategy(),
        days in elapsed_strategy(),
    ) {
        let (mut pool, mut source, _) = deploy(contribution, apr);
        let now = START + days * DAY;

        let (maturity, bonds) = pool.open_long(base, 0, 0, now, &mut source).unwrap();
        let proceeds = pool.close_long(maturity, bonds, 0, now, &mut source).unwrap();

        prop_assert!(proceeds <= base, "round trip returned {} for {}", proceeds, base);
    }

    #[test]
    fn short_round_trip_never_profits(
        contribution in pool_strategy(),
        apr in apr_strategy(),
        bonds in trade_strategy(),
    ) {
        let (mut pool, mut source, _) = deploy(contribution, apr);

        let (maturity, paid) = pool.open_short(bonds, u128::MAX, 0, START, &mut source).unwrap();
        let proceeds = pool.close_short(maturity, bonds, 0, START, &mut source).unwrap();

        prop_assert!(proceeds <= paid, "round trip returned {} for {}", proceeds, paid);
    }

    #[test]
    fn lp_share_price_never_falls_on_removal(
        contribution in pool_strategy(),
        long_base in trade_strategy(),
        short_bonds in trade_strategy(),
        days in elapsed_strategy(),
        fraction in 1u128..100,
    ) {
        let (mut pool, mut source, lp_shares) = deploy(contribution, FIVE_PERCENT);
        pool.open_long(long_base, 0, 0, START, &mut source).unwrap();
        pool.open_short(short_bonds, u128::MAX, 0, START, &mut source).unwrap();

        source.accrue(FIVE_PERCENT, days * DAY);
        let now = START + days * DAY;
        let price = source.vault_share_price;

        let before = pool.lp_share_price(now, price).unwrap();
        let removed = lp_shares * fraction / 100;
        pool.remove_liquidity(removed, 0, now, &mut source).unwrap();
        let after = pool.lp_share_price(now, price).unwrap();

        let tolerance = mul_down(before, pool.config.tolerances.lp_share_price_relative).unwrap();
        prop_assert!(after + tolerance >= before, "lp share price fell from {} to {}", before, after);
    }

    #[test]
    fn trades_keep_the_pool_solvent(
        contribution in pool_strategy(),
        apr in apr_strategy(),
        long_base in trade_strategy(),
        short_bonds in trade_strategy(),
        days in elapsed_strategy(),
    ) {
        let (mut pool, mut source, _) = deploy(contribution, apr);
        let now = START + days * DAY;
        source.accrue(apr, days * DAY);

        let _ = pool.open_long(long_base, 0, 0, now, &mut source);
        let _ = pool.open_short(short_bonds, u128::MAX, 0, now, &mut source);

        prop_assert!(pool.assert_solvent(now, source.vault_share_price).is_ok());
        prop_assert!(pool.effective_share_reserves().unwrap() >= pool.config.minimum_share_reserves);
        assert_share_ledger(&pool, &source);
    }

    #[test]
    fn checkpoint_twice_changes_nothing(
        contribution in pool_strategy(),
        long_base in trade_strategy(),
        days in 1u64..400,
    ) {
        let (mut pool, mut source, _) = deploy(contribution, FIVE_PERCENT);
        pool.open_long(long_base, 0, 0, START, &mut source).unwrap();
        source.accrue(FIVE_PERCENT, days * DAY);
        let now = START + days * DAY + 1;
        let checkpoint_time = START + (days - 1) * DAY;

        pool.checkpoint(checkpoint_time, now, &mut source).unwrap();
        let snapshot = pool.clone();
        pool.checkpoint(checkpoint_time, now, &mut source).unwrap();

        prop_assert_eq!(pool, snapshot);
    }
}
