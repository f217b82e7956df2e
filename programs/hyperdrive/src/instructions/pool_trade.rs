//! Accounts shared by every instruction that moves a trader's base
//! The trader account is created on first use.

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::{MAX_CHECKPOINTS, MAX_POSITIONS};
use crate::error::HyperdriveError;
use crate::invariants::assert_storage_within_bounds;
use crate::state::*;
use crate::vault::TokenVault;

#[derive(Accounts)]
pub struct PoolTrade<'info> {
  #[account(mut)]
  pub trader: Signer<'info>,

  #[account(
    mut,
    seeds = [POOL_SEED, base_mint.key().as_ref()],
    bump = pool_account.bump,
    has_one = base_mint,
    has_one = vault,
  )]
  pub pool_account: Box<Account<'info, PoolAccount>>,

  #[account(
    init_if_needed,
    payer = trader,
    space = TraderAccount::LEN,
    seeds = [TRADER_SEED, pool_account.key().as_ref(), trader.key().as_ref()],
    bump,
  )]
  pub trader_account: Box<Account<'info, TraderAccount>>,

  pub base_mint: Box<InterfaceAccount<'info, Mint>>,

  /// Trader's base token account
  #[account(
    mut,
    token::mint = base_mint,
    token::authority = trader,
  )]
  pub trader_token_account: Box<InterfaceAccount<'info, TokenAccount>>,

  #[account(
    mut,
    token::mint = base_mint,
    token::authority = vault_authority,
  )]
  pub vault: Box<InterfaceAccount<'info, TokenAccount>>,

  /// CHECK: PDA validated by seeds
  #[account(
    seeds = [VAULT_AUTHORITY_SEED, pool_account.key().as_ref()],
    bump = pool_account.vault_authority_bump,
  )]
  pub vault_authority: UncheckedAccount<'info>,

  pub token_program: Interface<'info, TokenInterface>,
  pub system_program: Program<'info, System>,

  pub clock: Sysvar<'info, Clock>,
}

impl<'info> PoolTrade<'info> {
  /// Current time as the engine sees it
  pub fn now(&self) -> Result<u64> {
    Ok(u64::try_from(self.clock.unix_timestamp)?)
  }

  /// Yield source moving base between the trader and the vault
  pub fn token_vault(&self) -> TokenVault<'info> {
    TokenVault {
      pool_key: self.pool_account.key(),
      vault_authority_bump: self.pool_account.vault_authority_bump,
      vault_share_price: self.pool_account.vault_share_price,
      vault_shares: self.pool_account.vault_shares,
      decimals: self.base_mint.decimals,
      mint: self.base_mint.to_account_info(),
      vault: self.vault.to_account_info(),
      vault_authority: self.vault_authority.to_account_info(),
      trader: self.trader.to_account_info(),
      trader_token_account: self.trader_token_account.to_account_info(),
      token_program: self.token_program.to_account_info(),
    }
  }

  /// Binds a fresh trader account to its owner and pool
  pub fn bind_trader_account(&mut self, bump: u8) -> Result<()> {
    let pool_key = self.pool_account.key();
    let owner = self.trader.key();
    let trader_account = &mut self.trader_account;
    if trader_account.owner == Pubkey::default() {
      trader_account.owner = owner;
      trader_account.pool = pool_key;
      trader_account.bump = bump;
    }
    require!(trader_account.owner == owner, HyperdriveError::Unauthorized);
    require!(trader_account.pool == pool_key, HyperdriveError::Unauthorized);
    Ok(())
  }

  /// Writes the vault ledger back and keeps the pool within its account
  pub fn settle(&mut self, vault: &TokenVault<'info>, now: u64) -> Result<()> {
    settle_pool(&mut self.pool_account, vault.vault_shares, now)
  }
}

/// Records the vault's share balance, drops unneeded checkpoints and checks
/// the maps still fit in the account
pub fn settle_pool(pool_account: &mut PoolAccount, vault_shares: u128, now: u64) -> Result<()> {
  pool_account.vault_shares = vault_shares;
  pool_account.pool.prune_checkpoints(now);
  assert_storage_within_bounds(
    pool_account.pool.checkpoints.len(),
    MAX_CHECKPOINTS,
    pool_account.pool.positions.len(),
    MAX_POSITIONS,
  )
}
