use anchor_lang::prelude::*;

#[error_code]
#[derive(PartialEq,Eq)]
pub enum HyperdriveError {
  #[msg("Pool is currently paused by its authority")]
  Paused,

  #[msg("Reentrancy attack detected - operation blocked")]
  Reentrancy,

  #[msg("Pool has not been initialized")]
  NotInitialized,

  #[msg("Pool has already been initialized")]
  AlreadyInitialized,

  #[msg("Amount must be greater than zero")]
  ZeroAmount,

  #[msg("Amount is below the pool's minimum transaction amount")]
  MinimumTransactionAmount,

  #[msg("Initial contribution must cover twice the minimum share reserves")]
  BelowMinimumContribution,

  #[msg("Slippage tolerance exceeded - output is outside your bound")]
  OutputLimit,

  #[msg("Spot APR is outside the requested range")]
  InvalidApr,

  #[msg("Vault share price is below your minimum")]
  MinimumSharePrice,

  #[msg("Checkpoint time is not aligned to the checkpoint duration")]
  InvalidCheckpointTime,

  #[msg("Checkpoint time is in the future")]
  FutureCheckpoint,

  #[msg("Maturity time does not match any position")]
  InvalidMaturityTime,

  #[msg("Insufficient balance - check your position")]
  InsufficientBalance,

  #[msg("Invalid pool configuration")]
  InvalidConfig,

  #[msg("Signer is not the pool authority")]
  Unauthorized,

  #[msg("Pool storage is full - too many open maturities")]
  StorageFull,

  #[msg("Yield source returned fewer shares than required")]
  DepositShortfall,

  #[msg("Math overflow occurred - values exceeded u128 bounds")]
  ArithmeticOverflow,

  #[msg("Trade leaves the bonding curve's domain")]
  CurveFailure,

  #[msg("Trade would price bonds above par")]
  NegativeInterest,

  #[msg("Fees exceed the proceeds of the trade")]
  FeesExceedProceeds,

  #[msg("Required checkpoint does not exist")]
  MissingCheckpoint,

  #[msg("Effective share reserves would fall below the minimum")]
  BelowMinimumShareReserves,

  #[msg("Share reserves cannot cover outstanding long exposure")]
  InsufficientLiquidity,

  #[msg("Present value of the pool would be negative")]
  NegativePresentValue,

  #[msg("Adding liquidity decreased the pool's present value")]
  DecreasedPresentValueWhenAddingLiquidity,

  #[msg("LP share price decreased beyond tolerance")]
  LpSharePriceDecreased,
}

/// Coarse classification of failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  /// Bad or out-of-bound caller input, or a pool that cannot accept calls
  InputValidation,
  /// Overflow, curve domain failure or negative interest
  Arithmetic,
  /// The operation would leave the pool unable to meet its obligations
  Solvency,
}

impl HyperdriveError {
  pub fn kind(&self) -> ErrorKind {
    use HyperdriveError::*;
    match self {
      ArithmeticOverflow | CurveFailure | NegativeInterest | FeesExceedProceeds | MissingCheckpoint => {
        ErrorKind::Arithmetic
      }
      BelowMinimumShareReserves
      | InsufficientLiquidity
      | NegativePresentValue
      | DecreasedPresentValueWhenAddingLiquidity
      | LpSharePriceDecreased => ErrorKind::Solvency,
      _ => ErrorKind::InputValidation,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_kinds() {
    assert_eq!(HyperdriveError::Paused.kind(), ErrorKind::InputValidation);
    assert_eq!(HyperdriveError::OutputLimit.kind(), ErrorKind::InputValidation);
    assert_eq!(HyperdriveError::NegativeInterest.kind(), ErrorKind::Arithmetic);
    assert_eq!(HyperdriveError::ArithmeticOverflow.kind(), ErrorKind::Arithmetic);
    assert_eq!(HyperdriveError::NegativePresentValue.kind(), ErrorKind::Solvency);
    assert_eq!(HyperdriveError::InsufficientLiquidity.kind(), ErrorKind::Solvency);
  }

  #[test]
  fn test_errors_convert_to_anchor_errors() {
    let err: anchor_lang::error::Error = HyperdriveError::FutureCheckpoint.into();
    assert_eq!(err, HyperdriveError::FutureCheckpoint.into());
    assert_ne!(err, HyperdriveError::InvalidCheckpointTime.into());
  }
}
