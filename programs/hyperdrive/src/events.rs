use anchor_lang::prelude::*;

#[event]
pub struct PoolInitialized {
  pub authority: Pubkey,
  pub base_mint: Pubkey,
  pub contribution: u64,
  pub apr: u128,
  pub lp_shares: u128,
  pub share_reserves: u128,
  pub bond_reserves: u128,
  pub timestamp: i64,
}

#[event]
pub struct LiquidityAdded {
  pub provider: Pubkey,
  pub contribution: u64,
  pub lp_shares: u128,
  pub lp_share_price: u128,
  pub timestamp: i64,
}

#[event]
pub struct LiquidityRemoved {
  pub provider: Pubkey,
  pub lp_shares: u128,
  pub base_proceeds: u128,
  pub withdrawal_shares: u128,
  pub timestamp: i64,
}

#[event]
pub struct WithdrawalSharesRedeemed {
  pub provider: Pubkey,
  pub shares_redeemed: u128,
  pub base_proceeds: u128,
  pub timestamp: i64,
}

#[event]
pub struct LongOpened {
  pub trader: Pubkey,
  pub maturity_time: u64,
  pub base_amount: u64,
  pub bonds: u128,
  pub vault_share_price: u128,
  pub timestamp: i64,
}

#[event]
pub struct LongClosed {
  pub trader: Pubkey,
  pub maturity_time: u64,
  pub bonds: u128,
  pub base_proceeds: u128,
  pub vault_share_price: u128,
  pub timestamp: i64,
}

#[event]
pub struct ShortOpened {
  pub trader: Pubkey,
  pub maturity_time: u64,
  pub bonds: u128,
  pub base_paid: u128,
  pub vault_share_price: u128,
  pub timestamp: i64,
}

#[event]
pub struct ShortClosed {
  pub trader: Pubkey,
  pub maturity_time: u64,
  pub bonds: u128,
  pub base_proceeds: u128,
  pub vault_share_price: u128,
  pub timestamp: i64,
}

#[event]
pub struct CheckpointApplied {
  pub checkpoint_time: u64,
  pub vault_share_price: u128,
  pub matured_longs: u128,
  pub matured_shorts: u128,
  pub long_base_volume: u128,
  pub short_base_volume: u128,
  pub timestamp: i64,
}

#[event]
pub struct EmergencyPause {
  pub authority: Pubkey,
  pub paused: bool,
  pub timestamp: i64,
}

#[event]
pub struct VaultSharePriceUpdated {
  pub authority: Pubkey,
  pub old_price: u128,
  pub new_price: u128,
  pub timestamp: i64,
}

#[event]
pub struct GovernanceFeesCollected {
  pub authority: Pubkey,
  pub base_proceeds: u128,
  pub timestamp: i64,
}
