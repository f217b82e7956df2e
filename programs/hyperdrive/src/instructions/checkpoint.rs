//! Checkpoint instruction - permissionless, creates the checkpoint at an
//! aligned timestamp and settles positions maturing there
//! Calling it for an existing checkpoint does nothing.

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::CheckpointApplied;
use crate::instructions::settle_pool;
use crate::state::*;
use crate::vault::PriceSnapshot;

pub fn handler(ctx: Context<ApplyCheckpoint>, checkpoint_time: u64) -> Result<()> {
  let now = u64::try_from(ctx.accounts.clock.unix_timestamp)?;
  let pool_account = &mut ctx.accounts.pool_account;
  let vault_share_price = pool_account.vault_share_price;
  let vault_shares = pool_account.vault_shares;

  let mut source = PriceSnapshot(vault_share_price);
  pool_account.pool.checkpoint(checkpoint_time, now, &mut source)?;

  let checkpoint = pool_account
    .pool
    .checkpoints
    .get(&checkpoint_time)
    .copied()
    .ok_or(HyperdriveError::MissingCheckpoint)?;
  settle_pool(pool_account, vault_shares, now)?;

  msg!(
    "Checkpoint {} at price {} ({:?})",
    checkpoint_time,
    checkpoint.vault_share_price,
    checkpoint.status
  );

  emit!(CheckpointApplied {
    checkpoint_time,
    vault_share_price: checkpoint.vault_share_price,
    matured_longs: checkpoint.matured_longs,
    matured_shorts: checkpoint.matured_shorts,
    long_base_volume: checkpoint.long_base_volume,
    short_base_volume: checkpoint.short_base_volume,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}

#[derive(Accounts)]
pub struct ApplyCheckpoint<'info> {
  pub caller: Signer<'info>,

  #[account(
    mut,
    seeds = [POOL_SEED, pool_account.base_mint.as_ref()],
    bump = pool_account.bump,
    constraint = pool_account.to_account_info().owner == &crate::ID @ HyperdriveError::Unauthorized,
  )]
  pub pool_account: Box<Account<'info, PoolAccount>>,

  pub clock: Sysvar<'info, Clock>,
}
