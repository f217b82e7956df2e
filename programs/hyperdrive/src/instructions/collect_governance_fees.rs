//! Collect governance fees - authority only
//! Pays the fees governance has accrued, in base, to the authority.

use anchor_lang::prelude::*;

use crate::error::HyperdriveError;
use crate::events::GovernanceFeesCollected;
use crate::instructions::PoolTrade;

pub fn handler(ctx: Context<PoolTrade>) -> Result<()> {
  require!(
    ctx.accounts.pool_account.authority == ctx.accounts.trader.key(),
    HyperdriveError::Unauthorized
  );
  let now = ctx.accounts.now()?;

  let mut vault = ctx.accounts.token_vault();
  let base_proceeds = ctx.accounts.pool_account.pool.collect_governance_fees(&mut vault)?;
  ctx.accounts.settle(&vault, now)?;

  emit!(GovernanceFeesCollected {
    authority: ctx.accounts.trader.key(),
    base_proceeds,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}
