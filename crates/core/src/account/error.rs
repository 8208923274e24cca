//! Error types for ledger operations.

use meridian_shared::types::{Money, MoneyError};
use thiserror::Error;

use super::types::AccountStatus;

/// Error types for balance ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The account is not in `active` status.
    #[error("Account is {0}, only active accounts can be debited or credited")]
    AccountInactive(AccountStatus),

    /// Available balance plus overdraft does not cover the debit.
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Available balance at the time of the check.
        available: Money,
        /// Amount that was requested.
        requested: Money,
    },

    /// Amount must be strictly positive.
    #[error("Amount must be positive: {0}")]
    NonPositiveAmount(Money),

    /// Attempted to release more than is currently held.
    #[error("Hold release of {requested} exceeds held {held}")]
    ExcessiveHoldRelease {
        /// Currently held amount.
        held: Money,
        /// Amount requested for release.
        requested: Money,
    },

    /// Monetary arithmetic failure (currency mismatch or overflow).
    #[error(transparent)]
    Money(#[from] MoneyError),
}
