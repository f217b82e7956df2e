//! Redeem withdrawal shares instruction - pays out withdrawal shares that
//! idle liquidity has made ready

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::WithdrawalSharesRedeemed;
use crate::instructions::PoolTrade;

pub fn handler(
  ctx: Context<PoolTrade>,
  shares: u128,
  min_output_per_share: u128,
) -> Result<()> {
  require!(shares > 0, HyperdriveError::ZeroAmount);
  let now = ctx.accounts.now()?;
  ctx.accounts.bind_trader_account(ctx.bumps.trader_account)?;
  require!(
    ctx.accounts.trader_account.withdrawal_shares >= shares,
    HyperdriveError::InsufficientBalance
  );

  let mut vault = ctx.accounts.token_vault();
  let (base_proceeds, shares_redeemed) = ctx.accounts.pool_account.pool.redeem_withdrawal_shares(
    shares,
    min_output_per_share,
    now,
    &mut vault,
  )?;
  ctx.accounts.settle(&vault, now)?;

  ctx.accounts.trader_account.withdrawal_shares -= shares_redeemed;

  msg!("Redeemed {} of {} withdrawal shares for {} base", shares_redeemed, shares, base_proceeds);

  emit!(WithdrawalSharesRedeemed {
    provider: ctx.accounts.trader.key(),
    shares_redeemed,
    base_proceeds,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}
