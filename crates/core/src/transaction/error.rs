//! Error types for transaction state transitions.

use meridian_shared::types::MoneyError;
use thiserror::Error;

use crate::account::LedgerError;

use super::types::TransactionStatus;

/// Error types for the transaction state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The requested transition is not allowed from the current status.
    #[error("Cannot transition transaction from {from} to {to}")]
    InvalidTransition {
        /// Status the transaction is currently in.
        from: TransactionStatus,
        /// Status that was requested.
        to: TransactionStatus,
    },

    /// The transaction is already in a terminal status.
    #[error("Transaction is {0} and can no longer change")]
    Terminal(TransactionStatus),

    /// The transaction type requires an account that was not supplied.
    #[error("Transaction requires a {0} account")]
    MissingAccount(&'static str),

    /// A ledger primitive refused the mutation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Monetary arithmetic failure (currency mismatch or overflow).
    #[error(transparent)]
    Money(#[from] MoneyError),
}
