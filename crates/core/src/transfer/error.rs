//! Error types for transfer routing and validation.

use meridian_shared::types::{Money, MoneyError};
use thiserror::Error;

/// Error types for transfer creation and routing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Source and destination are the same account.
    #[error("Cannot transfer to the same account")]
    SelfTransfer,

    /// The beneficiary name matched the sanctions list.
    #[error("Transfer blocked by sanctions screening (matched: {matched_entry})")]
    ComplianceBlocked {
        /// Sanctions list entry that matched.
        matched_entry: String,
    },

    /// The amount exceeds a configured transfer limit.
    #[error("{scope} limit exceeded: limit {limit}, requested {requested}")]
    LimitExceeded {
        /// Which limit was hit.
        scope: &'static str,
        /// The configured limit.
        limit: Money,
        /// Amount requested.
        requested: Money,
    },

    /// Destination metadata is malformed or incomplete.
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// Monetary arithmetic failure (currency mismatch or overflow).
    #[error(transparent)]
    Money(#[from] MoneyError),
}
