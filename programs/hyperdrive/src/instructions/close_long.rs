//! Close long instruction - sells long bonds back to the pool
//! Before maturity the curve prices the unmatured part; after maturity the
//! bonds redeem at face value from the matured reserves.

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::LongClosed;
use crate::instructions::PoolTrade;
use crate::state::AssetId;
use crate::vault::token_to_wad;

pub fn handler(
  ctx: Context<PoolTrade>,
  maturity_time: u64,
  bond_amount: u128,
  min_base_out: u64,
) -> Result<()> {
  require!(bond_amount > 0, HyperdriveError::ZeroAmount);
  let now = ctx.accounts.now()?;
  ctx.accounts.bind_trader_account(ctx.bumps.trader_account)?;

  // Fails before any pool state is touched if the trader lacks the bonds
  ctx
    .accounts
    .trader_account
    .debit_position(AssetId::long(maturity_time), bond_amount)?;

  let min_base = token_to_wad(min_base_out, ctx.accounts.base_mint.decimals).ok_or(HyperdriveError::ArithmeticOverflow)?;
  let mut vault = ctx.accounts.token_vault();
  let base_proceeds = ctx.accounts.pool_account.pool.close_long(
    maturity_time,
    bond_amount,
    min_base,
    now,
    &mut vault,
  )?;
  ctx.accounts.settle(&vault, now)?;

  msg!("Long closed: {} bonds for {} base", bond_amount, base_proceeds);

  emit!(LongClosed {
    trader: ctx.accounts.trader.key(),
    maturity_time,
    bonds: bond_amount,
    base_proceeds,
    vault_share_price: vault.vault_share_price,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}
