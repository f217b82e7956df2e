//! State for the hyperdrive pool
//! `Pool` is the engine's state machine; `PoolAccount` and `TraderAccount`
//! are the accounts that hold it and each trader's balances on chain.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::HyperdriveError;
use crate::invariants::assert_valid_config;

/// Side of a bond position
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
  Long,
  Short,
}

/// Identifies fungible positions: every long (or short) maturing at the
/// same time is the same asset
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId {
  pub kind: AssetKind,
  pub maturity: u64,
}

impl AssetId {
  pub const LEN: usize = 1 + 8;

  pub fn long(maturity: u64) -> Self {
    Self { kind: AssetKind::Long, maturity }
  }

  pub fn short(maturity: u64) -> Self {
    Self { kind: AssetKind::Short, maturity }
  }
}

/// Fee schedule, all in 18-decimal fixed point
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fees {
  /// Charged on the curve leg of every trade
  pub curve: u128,
  /// Charged on the matured leg of closes and on short collateral
  pub flat: u128,
  /// Governance's share of curve and flat fees
  pub governance_lp: u128,
}

impl Default for Fees {
  fn default() -> Self {
    Self {
      curve: DEFAULT_CURVE_FEE,
      flat: DEFAULT_FLAT_FEE,
      governance_lp: DEFAULT_GOVERNANCE_LP_FEE,
    }
  }
}

/// Numerical slack the pool accepts
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tolerances {
  pub lp_share_price_relative: u128,
  pub distribute_excess_idle_absolute: u128,
  pub distribute_excess_idle_max_iterations: u64,
}

impl Default for Tolerances {
  fn default() -> Self {
    Self {
      lp_share_price_relative: LP_SHARE_PRICE_RELATIVE_TOLERANCE,
      distribute_excess_idle_absolute: DISTRIBUTE_EXCESS_IDLE_ABSOLUTE_TOLERANCE,
      distribute_excess_idle_max_iterations: DISTRIBUTE_EXCESS_IDLE_MAX_ITERATIONS,
    }
  }
}

/// Immutable pool parameters
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
  /// `mu`: vault share price when the pool was deployed
  pub initial_vault_share_price: u128,
  pub minimum_share_reserves: u128,
  pub minimum_transaction_amount: u128,
  /// Term of every position, in seconds
  pub position_duration: u64,
  pub checkpoint_duration: u64,
  pub time_stretch: u128,
  pub fees: Fees,
  pub tolerances: Tolerances,
}

impl PoolConfig {
  pub const LEN: usize = 16 + 16 + 16 + 8 + 8 + 16 + 48 + 40;

  pub fn validate(&self) -> Result<()> {
    assert_valid_config(self)
  }
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self {
      initial_vault_share_price: ONE,
      minimum_share_reserves: DEFAULT_MINIMUM_SHARE_RESERVES,
      minimum_transaction_amount: DEFAULT_MINIMUM_TRANSACTION_AMOUNT,
      position_duration: DEFAULT_POSITION_DURATION,
      checkpoint_duration: DEFAULT_CHECKPOINT_DURATION,
      time_stretch: DEFAULT_TIME_STRETCH,
      fees: Fees::default(),
      tolerances: Tolerances::default(),
    }
  }
}

/// Reserves, supplies and aggregates that change with every trade
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarketState {
  /// `z`
  pub share_reserves: u128,
  /// `y`
  pub bond_reserves: u128,
  /// `zeta`: shares traders have claim to that are not on the curve
  pub share_adjustment: i128,
  pub lp_total_supply: u128,
  pub withdrawal_share_total_supply: u128,
  pub withdrawal_shares_ready_to_withdraw: u128,
  /// Shares set aside for ready withdrawal shares
  pub withdrawal_share_proceeds: u128,
  pub longs_outstanding: u128,
  pub shorts_outstanding: u128,
  /// 18-decimal seconds
  pub long_average_maturity_time: u128,
  /// 18-decimal seconds
  pub short_average_maturity_time: u128,
  /// Shares set aside for matured positions nobody has closed yet
  pub matured_share_reserves: u128,
  pub governance_fees_accrued: u128,
}

impl MarketState {
  pub const LEN: usize = 13 * 16;

  pub fn withdrawal_shares_outstanding(&self) -> u128 {
    self
      .withdrawal_share_total_supply
      .saturating_sub(self.withdrawal_shares_ready_to_withdraw)
  }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointStatus {
  Active,
  Finalized,
}

/// Snapshot for one checkpoint-aligned timestamp. An absent map entry is the
/// third state.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
  pub vault_share_price: u128,
  /// Long bonds that matured at this checkpoint
  pub matured_longs: u128,
  /// Short bonds that matured at this checkpoint
  pub matured_shorts: u128,
  /// Base paid into longs opened while this was the latest checkpoint
  pub long_base_volume: u128,
  /// Base paid into shorts opened while this was the latest checkpoint
  pub short_base_volume: u128,
  pub status: CheckpointStatus,
}

impl Checkpoint {
  pub const LEN: usize = 5 * 16 + 1;

  pub fn new(vault_share_price: u128) -> Self {
    Self {
      vault_share_price,
      matured_longs: 0,
      matured_shorts: 0,
      long_base_volume: 0,
      short_base_volume: 0,
      status: CheckpointStatus::Active,
    }
  }

  pub fn is_finalized(&self) -> bool {
    self.status == CheckpointStatus::Finalized
  }
}

/// The pool's full engine state
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Pool {
  pub config: PoolConfig,
  pub market: MarketState,
  /// Keyed by checkpoint-aligned timestamp
  pub checkpoints: BTreeMap<u64, Checkpoint>,
  /// Aggregate bonds per asset
  pub positions: BTreeMap<AssetId, u128>,
  pub initialized: bool,
  pub paused: bool,
  pub locked: bool,
}

impl Pool {
  pub const LEN: usize = PoolConfig::LEN +
    MarketState::LEN +
    4 + MAX_CHECKPOINTS * (8 + Checkpoint::LEN) + // checkpoints
    4 + MAX_POSITIONS * (AssetId::LEN + 16) + // positions
    1 + // initialized
    1 + // paused
    1; // locked

  pub fn new(config: PoolConfig) -> Self {
    Self { config, ..Default::default() }
  }
}

/// One pool per base mint. Holds the engine state and the token vault's
/// share ledger.
#[account]
pub struct PoolAccount {
  pub authority: Pubkey,

  pub base_mint: Pubkey,

  /// Token account holding the pool's base
  pub vault: Pubkey,

  /// Base per vault share, 18 decimals. Set by the authority.
  pub vault_share_price: u128,

  /// Vault shares the pool holds
  pub vault_shares: u128,

  pub bump: u8,

  pub vault_authority_bump: u8,

  pub pool: Pool,
}

impl PoolAccount {
  pub const LEN: usize = 8 + // discriminator
    32 + // authority
    32 + // base_mint
    32 + // vault
    16 + // vault_share_price
    16 + // vault_shares
    1 + // bump
    1 + // vault_authority_bump
    Pool::LEN;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionBalance {
  pub asset: AssetId,
  pub bonds: u128,
}

impl PositionBalance {
  pub const LEN: usize = AssetId::LEN + 16;
}

/// Per-owner balances in one pool
#[account]
pub struct TraderAccount {
  pub owner: Pubkey,

  pub pool: Pubkey,

  pub lp_shares: u128,

  pub withdrawal_shares: u128,

  pub positions: Vec<PositionBalance>,

  pub bump: u8,
}

impl TraderAccount {
  pub const LEN: usize = 8 +
    32 +
    32 +
    16 +
    16 +
    4 + MAX_TRADER_POSITIONS * PositionBalance::LEN +
    1;

  pub fn position(&self, asset: AssetId) -> u128 {
    self
      .positions
      .iter()
      .find(|p| p.asset == asset)
      .map(|p| p.bonds)
      .unwrap_or(0)
  }

  pub fn credit_position(&mut self, asset: AssetId, bonds: u128) -> Result<()> {
    if let Some(entry) = self.positions.iter_mut().find(|p| p.asset == asset) {
      entry.bonds = entry.bonds.checked_add(bonds).ok_or(HyperdriveError::ArithmeticOverflow)?;
      return Ok(());
    }

    require!(self.positions.len() < MAX_TRADER_POSITIONS, HyperdriveError::StorageFull);
    self.positions.push(PositionBalance { asset, bonds });
    Ok(())
  }

  pub fn debit_position(&mut self, asset: AssetId, bonds: u128) -> Result<()> {
    let index = self
      .positions
      .iter()
      .position(|p| p.asset == asset)
      .ok_or(HyperdriveError::InsufficientBalance)?;

    let remaining = self.positions[index]
      .bonds
      .checked_sub(bonds)
      .ok_or(HyperdriveError::InsufficientBalance)?;

    if remaining == 0 {
      self.positions.swap_remove(index);
    } else {
      self.positions[index].bonds = remaining;
    }
    Ok(())
  }
}

pub const POOL_SEED: &[u8] = b"pool";

pub const TRADER_SEED: &[u8] = b"trader";

pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";
