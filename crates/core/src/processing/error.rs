//! Error taxonomy for the processing service.

use thiserror::Error;

use crate::account::LedgerError;
use crate::settlement::SettlementError;
use crate::transaction::TransactionError;
use crate::transfer::TransferError;

/// Error types surfaced by [`super::BankService`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    /// No account under this id or number.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// No transaction under this id or reference.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// The transaction is not yet eligible to be confirmed.
    #[error("Transaction {reference} is not eligible for confirmation")]
    NotEligible {
        /// Reference of the transaction.
        reference: String,
    },

    /// A ledger primitive refused.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Routing or compliance rejected the transfer.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// A state transition was invalid.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// The settlement network rejected the destination or reference.
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

impl ProcessingError {
    /// Stable machine-readable code for API consumers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) | Self::TransactionNotFound(_) => "not_found",
            Self::NotEligible { .. } => "not_eligible_for_confirmation",
            Self::Ledger(LedgerError::InsufficientFunds { .. }) => "insufficient_funds",
            Self::Ledger(LedgerError::AccountInactive(_)) => "account_inactive",
            Self::Ledger(_) => "ledger_error",
            Self::Transfer(TransferError::ComplianceBlocked { .. }) => "compliance_blocked",
            Self::Transfer(TransferError::LimitExceeded { .. }) => "limit_exceeded",
            Self::Transfer(TransferError::SelfTransfer) => "self_transfer",
            Self::Transfer(_) => "invalid_destination",
            Self::Transaction(TransactionError::Terminal(_)) => "already_terminal",
            Self::Transaction(_) => "invalid_transition",
            Self::Settlement(SettlementError::InvalidDestination(_)) => "invalid_destination",
            Self::Settlement(_) => "network_error",
        }
    }
}
