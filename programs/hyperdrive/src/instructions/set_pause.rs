//! Emergency pause - authority only
//! While paused every mutating pool operation fails with `Paused`.

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::EmergencyPause;
use crate::state::*;

pub fn handler(ctx: Context<PoolAdmin>, paused: bool) -> Result<()> {
  let pool_account = &mut ctx.accounts.pool_account;
  pool_account.pool.set_paused(paused);

  emit!(EmergencyPause {
    authority: ctx.accounts.authority.key(),
    paused,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}

#[derive(Accounts)]
pub struct PoolAdmin<'info> {
  pub authority: Signer<'info>,

  #[account(
    mut,
    seeds = [POOL_SEED, pool_account.base_mint.as_ref()],
    bump = pool_account.bump,
    has_one = authority @ HyperdriveError::Unauthorized,
  )]
  pub pool_account: Box<Account<'info, PoolAccount>>,

  pub clock: Sysvar<'info, Clock>,
}
