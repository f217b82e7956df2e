//! Pool instructions
//! Each instruction validates its accounts, runs the engine and records the
//! trader's balances.

pub mod add_liquidity;
pub mod checkpoint;
pub mod close_long;
pub mod close_short;
pub mod collect_governance_fees;
pub mod initialize;
pub mod open_long;
pub mod open_short;
pub mod pool_trade;
pub mod redeem_withdrawal_shares;
pub mod remove_liquidity;
pub mod set_pause;
pub mod set_vault_share_price;

#[allow(ambiguous_glob_reexports)]
pub use checkpoint::*;
#[allow(ambiguous_glob_reexports)]
pub use initialize::*;
#[allow(ambiguous_glob_reexports)]
pub use pool_trade::*;
#[allow(ambiguous_glob_reexports)]
pub use set_pause::*;
