//! Remove liquidity instruction - burns LP shares, pays what idle allows and
//! leaves the rest as withdrawal shares

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::LiquidityRemoved;
use crate::instructions::PoolTrade;
use crate::vault::token_to_wad;

pub fn handler(
  ctx: Context<PoolTrade>,
  lp_shares: u128,
  min_base_output: u64,
) -> Result<()> {
  require!(lp_shares > 0, HyperdriveError::ZeroAmount);
  let now = ctx.accounts.now()?;
  ctx.accounts.bind_trader_account(ctx.bumps.trader_account)?;
  require!(
    ctx.accounts.trader_account.lp_shares >= lp_shares,
    HyperdriveError::InsufficientBalance
  );

  let min_base = token_to_wad(min_base_output, ctx.accounts.base_mint.decimals).ok_or(HyperdriveError::ArithmeticOverflow)?;
  let mut vault = ctx.accounts.token_vault();
  let (base_proceeds, withdrawal_shares) = ctx.accounts.pool_account.pool.remove_liquidity(
    lp_shares,
    min_base,
    now,
    &mut vault,
  )?;
  ctx.accounts.settle(&vault, now)?;

  let trader_account = &mut ctx.accounts.trader_account;
  trader_account.lp_shares -= lp_shares;
  trader_account.withdrawal_shares = trader_account
    .withdrawal_shares
    .checked_add(withdrawal_shares)
    .ok_or(HyperdriveError::ArithmeticOverflow)?;

  msg!(
    "Liquidity removed: {} LP shares, {} base, {} withdrawal shares",
    lp_shares,
    base_proceeds,
    withdrawal_shares
  );

  emit!(LiquidityRemoved {
    provider: ctx.accounts.trader.key(),
    lp_shares,
    base_proceeds,
    withdrawal_shares,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}
