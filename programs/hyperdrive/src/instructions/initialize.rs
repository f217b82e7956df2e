//! Initialize instruction - creates a pool for a base mint and seeds it
//! Creates PoolAccount, the token vault and the authority's trader account.
//! The authority is the first LP.

use anchor_lang::prelude::*;
use anchor_spl::{associated_token::AssociatedToken, token_interface::{Mint, TokenAccount, TokenInterface}};

use crate::error::HyperdriveError;
use crate::events::PoolInitialized;
use crate::instructions::settle_pool;
use crate::math::calculate_time_stretch;
use crate::state::*;
use crate::vault::{token_to_wad, TokenVault};

/// Pool parameters chosen at creation
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct InitializeArgs {
  /// First contribution, in base tokens
  pub contribution: u64,
  /// Target spot APR, 18 decimals
  pub apr: u128,
  pub initial_vault_share_price: u128,
  pub position_duration: u64,
  pub checkpoint_duration: u64,
  /// Zero derives the time stretch from `apr` and `position_duration`
  pub time_stretch: u128,
  pub minimum_share_reserves: u128,
  pub minimum_transaction_amount: u128,
  pub fees: Fees,
}

impl InitializeArgs {
  pub fn pool_config(&self) -> Result<PoolConfig> {
    let time_stretch = if self.time_stretch == 0 {
      calculate_time_stretch(self.apr, self.position_duration).ok_or(HyperdriveError::InvalidApr)?
    } else {
      self.time_stretch
    };

    let config = PoolConfig {
      initial_vault_share_price: self.initial_vault_share_price,
      minimum_share_reserves: self.minimum_share_reserves,
      minimum_transaction_amount: self.minimum_transaction_amount,
      position_duration: self.position_duration,
      checkpoint_duration: self.checkpoint_duration,
      time_stretch,
      fees: self.fees,
      tolerances: Tolerances::default(),
    };
    config.validate()?;
    Ok(config)
  }
}

pub fn handler(ctx: Context<Initialize>, args: InitializeArgs) -> Result<()> {
  require!(args.contribution > 0, HyperdriveError::ZeroAmount);
  let config = args.pool_config()?;
  let now = u64::try_from(ctx.accounts.clock.unix_timestamp)?;
  let decimals = ctx.accounts.base_mint.decimals;
  let contribution = token_to_wad(args.contribution, decimals).ok_or(HyperdriveError::InvalidConfig)?;

  let pool_key = ctx.accounts.pool_account.key();
  {
    let pool_account = &mut ctx.accounts.pool_account;
    pool_account.authority = ctx.accounts.authority.key();
    pool_account.base_mint = ctx.accounts.base_mint.key();
    pool_account.vault = ctx.accounts.vault.key();
    pool_account.vault_share_price = config.initial_vault_share_price;
    pool_account.vault_shares = 0;
    pool_account.bump = ctx.bumps.pool_account;
    pool_account.vault_authority_bump = ctx.bumps.vault_authority;
    pool_account.pool = Pool::new(config);
  }

  let mut vault = TokenVault {
    pool_key,
    vault_authority_bump: ctx.bumps.vault_authority,
    vault_share_price: config.initial_vault_share_price,
    vault_shares: 0,
    decimals,
    mint: ctx.accounts.base_mint.to_account_info(),
    vault: ctx.accounts.vault.to_account_info(),
    vault_authority: ctx.accounts.vault_authority.to_account_info(),
    trader: ctx.accounts.authority.to_account_info(),
    trader_token_account: ctx.accounts.authority_token_account.to_account_info(),
    token_program: ctx.accounts.token_program.to_account_info(),
  };

  let pool_account = &mut ctx.accounts.pool_account;
  let lp_shares = pool_account.pool.initialize(contribution, args.apr, now, &mut vault)?;
  settle_pool(pool_account, vault.vault_shares, now)?;
  let share_reserves = pool_account.pool.market.share_reserves;
  let bond_reserves = pool_account.pool.market.bond_reserves;

  let trader_account = &mut ctx.accounts.trader_account;
  trader_account.owner = ctx.accounts.authority.key();
  trader_account.pool = pool_key;
  trader_account.lp_shares = lp_shares;
  trader_account.withdrawal_shares = 0;
  trader_account.positions = Vec::new();
  trader_account.bump = ctx.bumps.trader_account;

  msg!("Pool initialized!");
  msg!("Base mint: {}", ctx.accounts.base_mint.key());
  msg!("Time stretch: {}", config.time_stretch);
  msg!("LP shares: {}", lp_shares);

  emit!(PoolInitialized {
    authority: ctx.accounts.authority.key(),
    base_mint: ctx.accounts.base_mint.key(),
    contribution: args.contribution,
    apr: args.apr,
    lp_shares,
    share_reserves,
    bond_reserves,
    timestamp: ctx.accounts.clock.unix_timestamp,
  });

  Ok(())
}

#[derive(Accounts)]
pub struct Initialize<'info> {
  #[account(mut)]
  pub authority: Signer<'info>,

  /// Pool PDA - one per base mint
  #[account(
    init,
    payer = authority,
    space = PoolAccount::LEN,
    seeds = [POOL_SEED, base_mint.key().as_ref()],
    bump
  )]
  pub pool_account: Box<Account<'info, PoolAccount>>,

  /// Authority's balances as the first LP
  #[account(
    init,
    payer = authority,
    space = TraderAccount::LEN,
    seeds = [TRADER_SEED, pool_account.key().as_ref(), authority.key().as_ref()],
    bump
  )]
  pub trader_account: Box<Account<'info, TraderAccount>>,

  /// The pool's base asset
  pub base_mint: Box<InterfaceAccount<'info, Mint>>,

  /// Base vault - deterministic ATA owned by vault_authority PDA
  #[account(
    init,
    payer = authority,
    associated_token::mint = base_mint,
    associated_token::authority = vault_authority,
    associated_token::token_program = token_program,
  )]
  pub vault: Box<InterfaceAccount<'info, TokenAccount>>,

  /// CHECK: PDA will be validated by the seeds
  #[account(
    seeds = [VAULT_AUTHORITY_SEED, pool_account.key().as_ref()],
    bump
  )]
  pub vault_authority: UncheckedAccount<'info>,

  /// Source of the first contribution
  #[account(
    mut,
    token::mint = base_mint,
    token::authority = authority,
  )]
  pub authority_token_account: Box<InterfaceAccount<'info, TokenAccount>>,

  pub token_program: Interface<'info, TokenInterface>,
  pub associated_token_program: Program<'info, AssociatedToken>,
  pub system_program: Program<'info, System>,

  pub clock: Sysvar<'info, Clock>,
}
