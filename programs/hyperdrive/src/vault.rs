//! Token vault yield source
//!
//! Base sits in an SPL token account owned by a per-pool PDA. The pool
//! keeps a share ledger over it, priced by the vault share price the
//! authority maintains. Token amounts are scaled to 18 decimals at the
//! boundary.

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{self, TransferChecked};

use crate::constants::WAD_DECIMALS;
use crate::engine::YieldSource;
use crate::error::HyperdriveError;
use crate::math::{div_down, mul_down};
use crate::state::VAULT_AUTHORITY_SEED;

/// `10^(18 - decimals)`
pub fn wad_scale(decimals: u8) -> Option<u128> {
  let shift = WAD_DECIMALS.checked_sub(decimals)?;
  10u128.checked_pow(shift as u32)
}

/// Token amount to 18-decimal base
pub fn token_to_wad(amount: u64, decimals: u8) -> Option<u128> {
  (amount as u128).checked_mul(wad_scale(decimals)?)
}

/// 18-decimal base to whole tokens, rounded down
pub fn wad_to_token_down(base: u128, decimals: u8) -> Option<u64> {
  u64::try_from(base.checked_div(wad_scale(decimals)?)?).ok()
}

/// 18-decimal base to whole tokens, rounded up
pub fn wad_to_token_up(base: u128, decimals: u8) -> Option<u64> {
  let scale = wad_scale(decimals)?;
  let amount = base.checked_add(scale - 1)?.checked_div(scale)?;
  u64::try_from(amount).ok()
}

/// Vault share balance after paying out `shares`, and the whole tokens sent
///
/// A payout that rounds to zero tokens leaves the balance untouched, so the
/// shares stay in the vault's ledger rather than vanishing.
pub fn plan_withdrawal(vault_shares: u128, shares: u128, vault_share_price: u128, decimals: u8) -> Result<(u128, u64)> {
  require!(shares <= vault_shares, HyperdriveError::InsufficientBalance);
  let base = mul_down(shares, vault_share_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
  let amount = wad_to_token_down(base, decimals).ok_or(HyperdriveError::ArithmeticOverflow)?;
  if amount == 0 {
    return Ok((vault_shares, 0));
  }
  Ok((vault_shares - shares, amount))
}

/// `YieldSource` over the pool's token vault for one trader
pub struct TokenVault<'info> {
  pub pool_key: Pubkey,
  pub vault_authority_bump: u8,
  pub vault_share_price: u128,
  /// Shares the pool holds; written back to the pool account afterwards
  pub vault_shares: u128,
  pub decimals: u8,
  pub mint: AccountInfo<'info>,
  pub vault: AccountInfo<'info>,
  pub vault_authority: AccountInfo<'info>,
  pub trader: AccountInfo<'info>,
  pub trader_token_account: AccountInfo<'info>,
  pub token_program: AccountInfo<'info>,
}

impl<'info> YieldSource for TokenVault<'info> {
  fn vault_share_price(&self) -> Result<u128> {
    require!(self.vault_share_price > 0, HyperdriveError::InvalidConfig);
    Ok(self.vault_share_price)
  }

  fn deposit(&mut self, base: u128) -> Result<u128> {
    let amount = wad_to_token_up(base, self.decimals).ok_or(HyperdriveError::ArithmeticOverflow)?;
    require!(amount > 0, HyperdriveError::ZeroAmount);

    let transfer_accounts = TransferChecked {
      from: self.trader_token_account.clone(),
      mint: self.mint.clone(),
      to: self.vault.clone(),
      authority: self.trader.clone(),
    };
    let cpi_ctx = CpiContext::new(self.token_program.clone(), transfer_accounts);
    token_interface::transfer_checked(cpi_ctx, amount, self.decimals)?;

    let shares = div_down(base, self.vault_share_price).ok_or(HyperdriveError::ArithmeticOverflow)?;
    self.vault_shares = self
      .vault_shares
      .checked_add(shares)
      .ok_or(HyperdriveError::ArithmeticOverflow)?;
    msg!("Deposited {} tokens for {} vault shares", amount, shares);
    Ok(shares)
  }

  fn withdraw(&mut self, shares: u128) -> Result<u128> {
    let (remaining, amount) = plan_withdrawal(self.vault_shares, shares, self.vault_share_price, self.decimals)?;
    self.vault_shares = remaining;
    if amount == 0 {
      msg!("Withdrawal of {} vault shares rounds to zero tokens; ledger unchanged", shares);
      return Ok(0);
    }

    let bump = [self.vault_authority_bump];
    let seeds = &[VAULT_AUTHORITY_SEED, self.pool_key.as_ref(), &bump];
    let signer = &[&seeds[..]];

    let transfer_accounts = TransferChecked {
      from: self.vault.clone(),
      mint: self.mint.clone(),
      to: self.trader_token_account.clone(),
      authority: self.vault_authority.clone(),
    };
    let cpi_ctx = CpiContext::new_with_signer(self.token_program.clone(), transfer_accounts, signer);
    token_interface::transfer_checked(cpi_ctx, amount, self.decimals)?;

    msg!("Withdrew {} vault shares as {} tokens", shares, amount);
    token_to_wad(amount, self.decimals).ok_or(HyperdriveError::ArithmeticOverflow.into())
  }
}

/// Price-only source for operations that never move tokens
pub struct PriceSnapshot(pub u128);

impl YieldSource for PriceSnapshot {
  fn vault_share_price(&self) -> Result<u128> {
    require!(self.0 > 0, HyperdriveError::InvalidConfig);
    Ok(self.0)
  }

  fn deposit(&mut self, _base: u128) -> Result<u128> {
    err!(HyperdriveError::Unauthorized)
  }

  fn withdraw(&mut self, _shares: u128) -> Result<u128> {
    err!(HyperdriveError::Unauthorized)
  }
}
