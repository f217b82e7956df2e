//! Vault share price update - authority only
//! Interest accrues to the pool's vault shares through this price. The
//! authority keeps the token vault funded to match.

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::VaultSharePriceUpdated;
use crate::instructions::PoolAdmin;

pub fn handler(ctx: Context<PoolAdmin>, vault_share_price: u128) -> Result<()> {
  require!(vault_share_price > 0, HyperdriveError::InvalidConfig);

  let pool_account = &mut ctx.accounts.pool_account;
  let old_price = pool_account.vault_share_price;
  pool_account.vault_share_price = vault_share_price;

  msg!("Vault share price: {} -> {}", old_price, vault_share_price);

  emit!(VaultSharePriceUpdated {
    authority: ctx.accounts.authority.key(),
    old_price,
    new_price: vault_share_price,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}
