//! Open long instruction - trader pays base for fixed-rate bonds
//! Bonds mature one position duration after the latest checkpoint.

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::LongOpened;
use crate::instructions::PoolTrade;
use crate::state::AssetId;
use crate::vault::token_to_wad;

pub fn handler(
  ctx: Context<PoolTrade>,
  base_amount: u64,
  min_bonds_out: u128,
  min_vault_share_price: u128,
) -> Result<()> {
  require!(base_amount > 0, HyperdriveError::ZeroAmount);
  let now = ctx.accounts.now()?;
  ctx.accounts.bind_trader_account(ctx.bumps.trader_account)?;

  let base = token_to_wad(base_amount, ctx.accounts.base_mint.decimals).ok_or(HyperdriveError::ArithmeticOverflow)?;
  let mut vault = ctx.accounts.token_vault();
  let (maturity_time, bonds) = ctx.accounts.pool_account.pool.open_long(
    base,
    min_bonds_out,
    min_vault_share_price,
    now,
    &mut vault,
  )?;
  ctx.accounts.settle(&vault, now)?;
  ctx.accounts.trader_account.credit_position(AssetId::long(maturity_time), bonds)?;

  msg!("Long opened: {} bonds maturing at {}", bonds, maturity_time);

  emit!(LongOpened {
    trader: ctx.accounts.trader.key(),
    maturity_time,
    base_amount,
    bonds,
    vault_share_price: vault.vault_share_price,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}
