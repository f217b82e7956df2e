use anchor_lang::prelude::*;

pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod instructions;
pub mod invariants;
pub mod math;
pub mod reentrancy;
pub mod state;
pub mod vault;

use instructions::*;

declare_id!("HyPRd7vQm3kXc8TzL5fWbN2sEuA9gJ4rYpV6oMiKtD1s");

#[program]
pub mod hyperdrive {
    use super::*;

    /// Create a pool for a base mint and seed it with the first liquidity
    pub fn initialize(ctx: Context<Initialize>, args: InitializeArgs) -> Result<()> {
        instructions::initialize::handler(ctx, args)
    }

    pub fn add_liquidity(
        ctx: Context<PoolTrade>,
        contribution: u64,
        min_lp_share_price: u128,
        min_apr: u128,
        max_apr: u128,
    ) -> Result<()> {
        instructions::add_liquidity::handler(ctx, contribution, min_lp_share_price, min_apr, max_apr)
    }

    pub fn remove_liquidity(
        ctx: Context<PoolTrade>,
        lp_shares: u128,
        min_base_output: u64,
    ) -> Result<()> {
        instructions::remove_liquidity::handler(ctx, lp_shares, min_base_output)
    }

    pub fn redeem_withdrawal_shares(
        ctx: Context<PoolTrade>,
        shares: u128,
        min_output_per_share: u128,
    ) -> Result<()> {
        instructions::redeem_withdrawal_shares::handler(ctx, shares, min_output_per_share)
    }

    /// Buy fixed-rate bonds with base
    pub fn open_long(
        ctx: Context<PoolTrade>,
        base_amount: u64,
        min_bonds_out: u128,
        min_vault_share_price: u128,
    ) -> Result<()> {
        instructions::open_long::handler(ctx, base_amount, min_bonds_out, min_vault_share_price)
    }

    pub fn close_long(
        ctx: Context<PoolTrade>,
        maturity_time: u64,
        bond_amount: u128,
        min_base_out: u64,
    ) -> Result<()> {
        instructions::close_long::handler(ctx, maturity_time, bond_amount, min_base_out)
    }

    /// Sell bonds to the pool, posting collateral
    pub fn open_short(
        ctx: Context<PoolTrade>,
        bond_amount: u128,
        max_base_paid: u64,
        min_vault_share_price: u128,
    ) -> Result<()> {
        instructions::open_short::handler(ctx, bond_amount, max_base_paid, min_vault_share_price)
    }

    pub fn close_short(
        ctx: Context<PoolTrade>,
        maturity_time: u64,
        bond_amount: u128,
        min_base_out: u64,
    ) -> Result<()> {
        instructions::close_short::handler(ctx, maturity_time, bond_amount, min_base_out)
    }

    pub fn checkpoint(ctx: Context<ApplyCheckpoint>, checkpoint_time: u64) -> Result<()> {
        instructions::checkpoint::handler(ctx, checkpoint_time)
    }

    pub fn set_pause(ctx: Context<PoolAdmin>, paused: bool) -> Result<()> {
        instructions::set_pause::handler(ctx, paused)
    }

    pub fn set_vault_share_price(ctx: Context<PoolAdmin>, vault_share_price: u128) -> Result<()> {
        instructions::set_vault_share_price::handler(ctx, vault_share_price)
    }

    pub fn collect_governance_fees(ctx: Context<PoolTrade>) -> Result<()> {
        instructions::collect_governance_fees::handler(ctx)
    }
}
