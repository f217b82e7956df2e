//! Add liquidity instruction - mints LP shares at the current LP share price
//! without moving the pool's spot rate

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::LiquidityAdded;
use crate::instructions::PoolTrade;
use crate::vault::token_to_wad;

pub fn handler(
  ctx: Context<PoolTrade>,
  contribution: u64,
  min_lp_share_price: u128,
  min_apr: u128,
  max_apr: u128,
) -> Result<()> {
  require!(contribution > 0, HyperdriveError::ZeroAmount);
  let now = ctx.accounts.now()?;
  ctx.accounts.bind_trader_account(ctx.bumps.trader_account)?;

  let base = token_to_wad(contribution, ctx.accounts.base_mint.decimals).ok_or(HyperdriveError::ArithmeticOverflow)?;
  let mut vault = ctx.accounts.token_vault();
  let pool = &mut ctx.accounts.pool_account.pool;
  let lp_shares = pool.add_liquidity(base, min_lp_share_price, min_apr, max_apr, now, &mut vault)?;
  let lp_share_price = pool.lp_share_price(now, vault.vault_share_price)?;
  ctx.accounts.settle(&vault, now)?;

  let trader_account = &mut ctx.accounts.trader_account;
  trader_account.lp_shares = trader_account
    .lp_shares
    .checked_add(lp_shares)
    .ok_or(HyperdriveError::ArithmeticOverflow)?;

  msg!("Liquidity added: {} LP shares at price {}", lp_shares, lp_share_price);

  emit!(LiquidityAdded {
    provider: ctx.accounts.trader.key(),
    contribution,
    lp_shares,
    lp_share_price,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}
