//! Transaction record, its enums, and pure status transitions.

use chrono::{DateTime, NaiveDate, Utc};
use meridian_shared::types::{AccountId, Money, TransactionId, TransferRequestId};
use serde::{Deserialize, Serialize};

use super::error::TransactionError;

/// What kind of money movement a transaction represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Funds entering an account from outside the bank.
    Deposit,
    /// Funds leaving an account to the owner.
    Withdrawal,
    /// Funds moving between accounts.
    Transfer,
    /// A bill or merchant payment.
    Payment,
    /// A fee charged by the bank.
    Fee,
    /// Interest credited by the bank.
    Interest,
    /// A reversal of a prior transaction.
    Reversal,
    /// A miscellaneous charge.
    Charge,
}

impl TransactionType {
    /// Returns true for types that debit the source account.
    #[must_use]
    pub const fn debits_source(self) -> bool {
        matches!(
            self,
            Self::Withdrawal | Self::Transfer | Self::Payment | Self::Fee | Self::Charge
        )
    }

    /// Returns true for types that credit the destination account.
    #[must_use]
    pub const fn credits_destination(self) -> bool {
        matches!(
            self,
            Self::Deposit | Self::Transfer | Self::Interest | Self::Reversal
        )
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposit => write!(f, "deposit"),
            Self::Withdrawal => write!(f, "withdrawal"),
            Self::Transfer => write!(f, "transfer"),
            Self::Payment => write!(f, "payment"),
            Self::Fee => write!(f, "fee"),
            Self::Interest => write!(f, "interest"),
            Self::Reversal => write!(f, "reversal"),
            Self::Charge => write!(f, "charge"),
        }
    }
}

/// Where a transaction sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Created, not yet confirmed or processed.
    Pending,
    /// Confirmed and awaiting processing.
    Confirmed,
    /// Balances mutated; awaiting settlement or completion.
    Processing,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully; balances restored.
    Failed,
    /// Cancelled before any mutation.
    Cancelled,
}

impl TransactionStatus {
    /// Returns true for statuses that can never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How deposited funds arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositSource {
    /// Cash over the counter or at a machine.
    Cash,
    /// A deposited check.
    Check,
    /// An incoming wire.
    Wire,
    /// An incoming ACH credit.
    Ach,
    /// Funds moved from another internal account.
    Internal,
}

/// The channel a transaction was initiated through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Web banking.
    Online,
    /// Mobile app.
    Mobile,
    /// Cash machine.
    Atm,
    /// In-branch teller.
    Branch,
}

/// An event emitted by a state transition, for the caller to dispatch.
///
/// Transitions never trigger side effects themselves; notification or
/// audit fan-out is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "event")]
pub enum TransactionEvent {
    /// Transaction was confirmed.
    Confirmed {
        /// Transaction reference.
        reference: String,
    },
    /// Balance mutation applied; transaction is processing.
    Processing {
        /// Transaction reference.
        reference: String,
    },
    /// Transaction completed successfully.
    Completed {
        /// Transaction reference.
        reference: String,
    },
    /// Transaction failed; any mutation was restored.
    Failed {
        /// Transaction reference.
        reference: String,
        /// Why it failed.
        reason: String,
    },
    /// Transaction was cancelled before processing.
    Cancelled {
        /// Transaction reference.
        reference: String,
    },
}

/// A single movement of money through the bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Human-facing reference, `TXN` followed by 12 characters.
    pub reference: String,
    /// Kind of movement.
    pub transaction_type: TransactionType,
    /// Current lifecycle status.
    pub status: TransactionStatus,
    /// Principal amount.
    pub amount: Money,
    /// Fee charged on top of the principal.
    pub fee: Money,
    /// `amount + fee`, computed once at creation.
    pub total_amount: Money,
    /// Account debited, when the type debits one.
    pub from_account: Option<AccountId>,
    /// Account credited, when the type credits one.
    pub to_account: Option<AccountId>,
    /// How deposited funds arrived (deposits only).
    pub deposit_source: Option<DepositSource>,
    /// Channel the transaction came in through.
    pub channel: Channel,
    /// Free-text description.
    pub description: Option<String>,
    /// Human-readable progress note.
    pub status_message: Option<String>,
    /// Why the transaction failed, when it did.
    pub failure_reason: Option<String>,
    /// Source balance captured immediately before mutation.
    pub from_balance_before: Option<Money>,
    /// Source balance captured immediately after mutation.
    pub from_balance_after: Option<Money>,
    /// Destination balance captured immediately before mutation.
    pub to_balance_before: Option<Money>,
    /// Destination balance captured immediately after mutation.
    pub to_balance_after: Option<Money>,
    /// Whether the sweep may confirm this transaction once the
    /// configured delay has elapsed.
    pub auto_confirm: bool,
    /// Business-day completion estimate, assigned once at creation.
    pub expected_completion_date: Option<NaiveDate>,
    /// Reference assigned by an external settlement network.
    pub external_reference: Option<String>,
    /// Transfer request this transaction belongs to, if any.
    pub transfer_request: Option<TransferRequestId>,
    /// Original transaction, for reversals.
    pub reversal_of: Option<TransactionId>,
    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
    /// When it was confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When its balance mutation was applied.
    pub processed_at: Option<DateTime<Utc>>,
    /// When it completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When it failed.
    pub failed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Creates a new pending transaction.
    ///
    /// `total_amount` is computed here, exactly once; later transitions
    /// read it and never recompute.
    pub fn new(
        reference: String,
        transaction_type: TransactionType,
        amount: Money,
        fee: Money,
        channel: Channel,
        now: DateTime<Utc>,
    ) -> Result<Self, TransactionError> {
        let total_amount = amount.checked_add(fee)?;
        Ok(Self {
            id: TransactionId::new(),
            reference,
            transaction_type,
            status: TransactionStatus::Pending,
            amount,
            fee,
            total_amount,
            from_account: None,
            to_account: None,
            deposit_source: None,
            channel,
            description: None,
            status_message: None,
            failure_reason: None,
            from_balance_before: None,
            from_balance_after: None,
            to_balance_before: None,
            to_balance_after: None,
            auto_confirm: true,
            expected_completion_date: None,
            external_reference: None,
            transfer_request: None,
            reversal_of: None,
            created_at: now,
            confirmed_at: None,
            processed_at: None,
            completed_at: None,
            failed_at: None,
        })
    }

    /// Confirms a pending transaction.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<TransactionEvent, TransactionError> {
        self.transition_from(TransactionStatus::Pending, TransactionStatus::Confirmed)?;
        self.confirmed_at = Some(now);
        Ok(TransactionEvent::Confirmed {
            reference: self.reference.clone(),
        })
    }

    /// Cancels a pending transaction. Only `pending` may be cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<TransactionEvent, TransactionError> {
        self.transition_from(TransactionStatus::Pending, TransactionStatus::Cancelled)?;
        self.failed_at = Some(now);
        self.failure_reason = Some("cancelled".to_string());
        self.status_message = Some("Cancelled before processing".to_string());
        Ok(TransactionEvent::Cancelled {
            reference: self.reference.clone(),
        })
    }

    /// Completes a processing transaction.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<TransactionEvent, TransactionError> {
        self.transition_from(TransactionStatus::Processing, TransactionStatus::Completed)?;
        self.completed_at = Some(now);
        Ok(TransactionEvent::Completed {
            reference: self.reference.clone(),
        })
    }

    /// Returns true once the transaction can never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn transition_from(
        &mut self,
        expected: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<(), TransactionError> {
        if self.status.is_terminal() {
            return Err(TransactionError::Terminal(self.status));
        }
        if self.status != expected {
            return Err(TransactionError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_shared::types::Currency;
    use rust_decimal_macros::dec;

    fn txn(transaction_type: TransactionType) -> Transaction {
        Transaction::new(
            "TXNABCDEF123456".to_string(),
            transaction_type,
            Money::new(dec!(100.00), Currency::Usd),
            Money::new(dec!(15.00), Currency::Usd),
            Channel::Online,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_total_amount_computed_once() {
        let t = txn(TransactionType::Transfer);
        assert_eq!(t.total_amount.amount, dec!(115.00));
    }

    #[test]
    fn test_confirm_only_from_pending() {
        let mut t = txn(TransactionType::Deposit);
        t.confirm(Utc::now()).unwrap();
        assert_eq!(t.status, TransactionStatus::Confirmed);
        assert!(t.confirmed_at.is_some());
        assert!(matches!(
            t.confirm(Utc::now()),
            Err(TransactionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cancel_only_from_pending() {
        let mut t = txn(TransactionType::Withdrawal);
        t.confirm(Utc::now()).unwrap();
        assert!(matches!(
            t.cancel(Utc::now()),
            Err(TransactionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_statuses_are_frozen() {
        let mut t = txn(TransactionType::Deposit);
        t.cancel(Utc::now()).unwrap();
        assert!(t.is_terminal());
        assert!(matches!(
            t.confirm(Utc::now()),
            Err(TransactionError::Terminal(TransactionStatus::Cancelled))
        ));
    }

    #[test]
    fn test_type_direction_flags() {
        assert!(TransactionType::Deposit.credits_destination());
        assert!(!TransactionType::Deposit.debits_source());
        assert!(TransactionType::Transfer.debits_source());
        assert!(TransactionType::Transfer.credits_destination());
        assert!(TransactionType::Fee.debits_source());
        assert!(!TransactionType::Fee.credits_destination());
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_string(&TransactionStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
