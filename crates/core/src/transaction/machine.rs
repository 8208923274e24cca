//! Balance mutation and failure restoration for transactions.
//!
//! `apply_mutation` is the only path from `pending`/`confirmed` into
//! `processing`: it captures before-snapshots, runs the ledger
//! primitives for the transaction type, captures after-snapshots, and
//! returns the events. `fail_with_restoration` is its inverse and is
//! safe to call any number of times.
//!
//! The caller resolves and locks the accounts; the machine never
//! touches storage.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::account::Account;

use super::error::TransactionError;
use super::types::{Transaction, TransactionEvent, TransactionStatus, TransactionType};

/// Reason string recorded when a debit is refused for lack of funds.
pub const REASON_INSUFFICIENT_FUNDS: &str = "insufficient_funds";

/// Applies the type-appropriate balance mutation and moves the
/// transaction to `processing`.
///
/// Debiting types debit `total_amount` from the source; crediting
/// types credit `amount` only, so fees are never forwarded to the
/// recipient. A transfer with no destination account is an external
/// transfer: the source is debited and the credit happens off-book at
/// the settlement network.
///
/// An insufficient-funds refusal is not an error: the transaction is
/// failed in place with no mutation and the `Failed` event is
/// returned.
pub fn apply_mutation(
    txn: &mut Transaction,
    mut from: Option<&mut Account>,
    mut to: Option<&mut Account>,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionEvent>, TransactionError> {
    match txn.status {
        TransactionStatus::Pending | TransactionStatus::Confirmed => {}
        status if status.is_terminal() => return Err(TransactionError::Terminal(status)),
        status => {
            return Err(TransactionError::InvalidTransition {
                from: status,
                to: TransactionStatus::Processing,
            });
        }
    }

    let debits = txn.transaction_type.debits_source();
    let credits = txn.transaction_type.credits_destination();
    let external = txn.transaction_type == TransactionType::Transfer && to.is_none();

    if debits && from.is_none() {
        return Err(TransactionError::MissingAccount("source"));
    }
    if credits && !external && to.is_none() {
        return Err(TransactionError::MissingAccount("destination"));
    }

    // Snapshots are captured exactly once, before any mutation.
    if let Some(account) = from.as_deref() {
        if txn.from_balance_before.is_none() {
            txn.from_balance_before = Some(account.balance());
        }
    }
    if let Some(account) = to.as_deref() {
        if txn.to_balance_before.is_none() {
            txn.to_balance_before = Some(account.balance());
        }
    }

    if debits {
        if let Some(account) = from.as_deref_mut() {
            if !account.can_debit(txn.total_amount) {
                return Ok(vec![fail_in_place(txn, REASON_INSUFFICIENT_FUNDS, now)]);
            }
            account.debit(txn.total_amount, now)?;
            txn.from_balance_after = Some(account.balance());
        }
    }
    if credits && !external {
        if let Some(account) = to.as_deref_mut() {
            // The recipient receives the principal, never the fee.
            account.credit(txn.amount, now)?;
            txn.to_balance_after = Some(account.balance());
        }
    }

    txn.status = TransactionStatus::Processing;
    txn.processed_at = Some(now);
    info!(
        reference = %txn.reference,
        transaction_type = %txn.transaction_type,
        amount = %txn.amount,
        "transaction processing"
    );
    Ok(vec![TransactionEvent::Processing {
        reference: txn.reference.clone(),
    }])
}

/// Fails a transaction, restoring every touched account to its
/// before-snapshot.
///
/// Idempotent: calling it on an already-failed transaction does
/// nothing and returns no events. Completed and cancelled
/// transactions are frozen and rejected; undoing a completed
/// transaction is a reversal, not a fail. Restoration uses the
/// ledger's `restore` primitive, which skips the status check so
/// funds return even to a suspended account.
pub fn fail_with_restoration(
    txn: &mut Transaction,
    from: Option<&mut Account>,
    to: Option<&mut Account>,
    reason: impl Into<String>,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionEvent>, TransactionError> {
    if txn.status == TransactionStatus::Failed {
        return Ok(Vec::new());
    }
    if txn.status.is_terminal() {
        return Err(TransactionError::Terminal(txn.status));
    }

    // Only restore what was actually mutated: the after-snapshot is
    // the marker that the mutation ran.
    if let Some(account) = from {
        if let Some(before) = txn.from_balance_after.and(txn.from_balance_before) {
            account.restore(before, now)?;
        }
    }
    if let Some(account) = to {
        if let Some(before) = txn.to_balance_after.and(txn.to_balance_before) {
            account.restore(before, now)?;
        }
    }

    Ok(vec![fail_in_place(txn, reason, now)])
}

fn fail_in_place(
    txn: &mut Transaction,
    reason: impl Into<String>,
    now: DateTime<Utc>,
) -> TransactionEvent {
    let reason = reason.into();
    txn.status = TransactionStatus::Failed;
    txn.failure_reason = Some(reason.clone());
    txn.status_message = Some(format!("Failed: {reason}"));
    txn.failed_at = Some(now);
    info!(reference = %txn.reference, %reason, "transaction failed");
    TransactionEvent::Failed {
        reference: txn.reference.clone(),
        reason,
    }
}
