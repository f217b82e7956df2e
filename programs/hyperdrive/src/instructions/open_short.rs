//! Open short instruction - trader sells bonds to the pool and posts the
//! collateral backing them

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::ShortOpened;
use crate::instructions::PoolTrade;
use crate::state::AssetId;
use crate::vault::token_to_wad;

pub fn handler(
  ctx: Context<PoolTrade>,
  bond_amount: u128,
  max_base_paid: u64,
  min_vault_share_price: u128,
) -> Result<()> {
  require!(bond_amount > 0, HyperdriveError::ZeroAmount);
  let now = ctx.accounts.now()?;
  ctx.accounts.bind_trader_account(ctx.bumps.trader_account)?;

  let max_base = token_to_wad(max_base_paid, ctx.accounts.base_mint.decimals).ok_or(HyperdriveError::ArithmeticOverflow)?;
  let mut vault = ctx.accounts.token_vault();
  let (maturity_time, base_paid) = ctx.accounts.pool_account.pool.open_short(
    bond_amount,
    max_base,
    min_vault_share_price,
    now,
    &mut vault,
  )?;
  ctx.accounts.settle(&vault, now)?;
  ctx.accounts.trader_account.credit_position(AssetId::short(maturity_time), bond_amount)?;

  msg!("Short opened: {} bonds maturing at {} for {} base", bond_amount, maturity_time, base_paid);

  emit!(ShortOpened {
    trader: ctx.accounts.trader.key(),
    maturity_time,
    bonds: bond_amount,
    base_paid,
    vault_share_price: vault.vault_share_price,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}
