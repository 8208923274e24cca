//! The banking service: every external operation goes through here.
//!
//! Request-driven entry points (deposit, withdrawal, transfer,
//! confirm, fail, cancel) plus the periodic sweep
//! (`process_eligible`). Each mutation validates and applies the
//! status transition on the stored transaction, under its lock, with
//! the balance change inside the owning account's lock; settlement
//! network calls always happen between locked sections, never inside
//! one.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use meridian_shared::config::BankConfig;
use meridian_shared::types::{AccountId, Currency, CustomerId, Money, TransactionId, TransferRequestId};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::account::{Account, AccountStatus, LedgerError, generate_account_number};
use crate::compliance::SanctionsList;
use crate::schedule::{HolidayCalendar, next_business_day};
use crate::settlement::{NetworkStatus, SettlementGateway, SettlementInstruction};
use crate::transaction::{
    Channel, DepositSource, Transaction, TransactionError, TransactionEvent, TransactionStatus,
    TransactionType, apply_mutation, fail_with_restoration, generate_reference,
};
use crate::transfer::{
    Destination, FeeSchedule, TransferError, TransferLimits, TransferRequest, TransferType, route,
};

use super::clock::Clock;
use super::error::ProcessingError;
use super::store::{BankStore, lock, lock_ordered};

/// Point-in-time view of a transaction for status queries.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    /// Transaction reference.
    pub reference: String,
    /// Kind of movement.
    pub transaction_type: TransactionType,
    /// Current status.
    pub status: TransactionStatus,
    /// Principal amount.
    pub amount: Money,
    /// Fee charged.
    pub fee: Money,
    /// Principal plus fee.
    pub total_amount: Money,
    /// Business-day completion estimate.
    pub expected_completion_date: Option<NaiveDate>,
    /// Source balance before mutation.
    pub from_balance_before: Option<Money>,
    /// Source balance after mutation.
    pub from_balance_after: Option<Money>,
    /// Destination balance before mutation.
    pub to_balance_before: Option<Money>,
    /// Destination balance after mutation.
    pub to_balance_after: Option<Money>,
    /// Why the transaction failed, when it did.
    pub failure_reason: Option<String>,
    /// Settlement network reference, once assigned.
    pub external_reference: Option<String>,
    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
    /// When it completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Transaction> for StatusView {
    fn from(txn: Transaction) -> Self {
        Self {
            reference: txn.reference,
            transaction_type: txn.transaction_type,
            status: txn.status,
            amount: txn.amount,
            fee: txn.fee,
            total_amount: txn.total_amount,
            expected_completion_date: txn.expected_completion_date,
            from_balance_before: txn.from_balance_before,
            from_balance_after: txn.from_balance_after,
            to_balance_before: txn.to_balance_before,
            to_balance_after: txn.to_balance_after,
            failure_reason: txn.failure_reason,
            external_reference: txn.external_reference,
            created_at: txn.created_at,
            completed_at: txn.completed_at,
        }
    }
}

/// What a sweep iteration did.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepCounts {
    /// Transactions looked at.
    pub examined: usize,
    /// Pending transactions confirmed.
    pub confirmed: usize,
    /// External transfers submitted to a network.
    pub submitted: usize,
    /// Transactions completed.
    pub completed: usize,
    /// Transactions failed (with restoration).
    pub failed: usize,
}

/// The transaction processing service.
pub struct BankService {
    store: BankStore,
    clock: Arc<dyn Clock>,
    config: BankConfig,
    calendar: HolidayCalendar,
    sanctions: SanctionsList,
    fees: FeeSchedule,
    limits: TransferLimits,
    ach: Arc<dyn SettlementGateway>,
    swift: Arc<dyn SettlementGateway>,
}

impl BankService {
    /// Creates a service over an empty store.
    #[must_use]
    pub fn new(
        config: BankConfig,
        clock: Arc<dyn Clock>,
        ach: Arc<dyn SettlementGateway>,
        swift: Arc<dyn SettlementGateway>,
    ) -> Self {
        let calendar = HolidayCalendar::from_dates(config.holidays.iter().copied());
        let fees = FeeSchedule::from_config(&config);
        let limits = TransferLimits::from_config(&config);
        Self {
            store: BankStore::new(),
            clock,
            config,
            calendar,
            sanctions: SanctionsList::default(),
            fees,
            limits,
            ach,
            swift,
        }
    }

    /// Replaces the default sanctions list.
    pub fn set_sanctions(&mut self, sanctions: SanctionsList) {
        self.sanctions = sanctions;
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &BankStore {
        &self.store
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn new_reference(&self) -> String {
        generate_reference(self.config.reference_length, |candidate| {
            self.store.reference_exists(candidate)
        })
    }

    fn expected_completion(&self, auto_confirm: bool) -> NaiveDate {
        let days = if auto_confirm {
            self.config.auto_confirm_completion_days
        } else {
            self.config.manual_completion_days
        };
        next_business_day(self.now().date_naive(), days, &self.calendar)
    }

    fn confirmation_due(&self, txn: &Transaction) -> bool {
        let due = txn.created_at + Duration::hours(self.config.confirmation_delay_hours);
        self.now() >= due
    }

    fn gateway_for(&self, transfer_type: TransferType) -> Option<&dyn SettlementGateway> {
        match transfer_type {
            TransferType::Internal => None,
            TransferType::DomesticExternal => Some(self.ach.as_ref()),
            TransferType::International => Some(self.swift.as_ref()),
        }
    }

    fn is_external_transfer(txn: &Transaction) -> bool {
        txn.transaction_type == TransactionType::Transfer && txn.to_account.is_none()
    }

    // ---- accounts ----------------------------------------------------

    /// Opens a new account with a generated number.
    pub fn open_account(&self, owner: CustomerId, name: String, currency: Currency) -> Account {
        let number = generate_account_number(self.config.account_number_length, |candidate| {
            self.store.account_number_exists(candidate)
        });
        let account = Account::open(owner, number, name, currency, self.now());
        let snapshot = account.clone();
        self.store.insert_account(account);
        info!(account_number = %snapshot.account_number, "account opened");
        snapshot
    }

    /// Snapshot of an account by id.
    pub fn account(&self, id: AccountId) -> Result<Account, ProcessingError> {
        let handle = self
            .store
            .account(id)
            .ok_or_else(|| ProcessingError::AccountNotFound(id.to_string()))?;
        let account = lock(&handle);
        Ok(account.clone())
    }

    /// Snapshot of an account by number.
    pub fn account_by_number(&self, number: &str) -> Result<Account, ProcessingError> {
        let handle = self
            .store
            .account_by_number(number)
            .ok_or_else(|| ProcessingError::AccountNotFound(number.to_string()))?;
        let account = lock(&handle);
        Ok(account.clone())
    }

    /// Checks that a destination is valid for its settlement network
    /// without creating anything.
    pub fn validate_destination(&self, destination: &Destination) -> Result<TransferType, ProcessingError> {
        let decision = route(
            destination,
            Money::new(rust_decimal::Decimal::ONE, Currency::Usd),
            &self.sanctions,
            &self.fees,
            &self.limits,
            |number| self.store.resolve_active_number(number),
        )?;
        if let Some(gateway) = self.gateway_for(decision.transfer_type) {
            gateway.validate_destination(destination)?;
        }
        Ok(decision.transfer_type)
    }

    /// Quotes the fee a destination would incur for a given amount.
    pub fn quote_fee(&self, destination: &Destination, amount: Money) -> Result<(TransferType, Money), ProcessingError> {
        let decision = route(
            destination,
            amount,
            &self.sanctions,
            &self.fees,
            &self.limits,
            |number| self.store.resolve_active_number(number),
        )?;
        Ok((decision.transfer_type, decision.fee))
    }

    // ---- creation entry points ---------------------------------------

    /// Creates a deposit. Processes immediately when no confirmation
    /// delay is configured.
    pub fn create_deposit(
        &self,
        account_id: AccountId,
        amount: Money,
        source: DepositSource,
        channel: Channel,
        description: Option<String>,
    ) -> Result<Transaction, ProcessingError> {
        self.check_account_ready(account_id, amount)?;

        let mut txn = Transaction::new(
            self.new_reference(),
            TransactionType::Deposit,
            amount,
            Money::zero(amount.currency),
            channel,
            self.now(),
        )?;
        txn.to_account = Some(account_id);
        txn.deposit_source = Some(source);
        txn.description = description;
        txn.expected_completion_date = Some(self.expected_completion(true));
        let id = txn.id;
        self.store.insert_transaction(txn);

        self.advance_if_due(id)?;
        self.transaction_by_id(id)
    }

    /// Creates a withdrawal. An insufficient balance surfaces as a
    /// `failed` transaction with no balance touched, not as an error.
    pub fn create_withdrawal(
        &self,
        account_id: AccountId,
        amount: Money,
        channel: Channel,
        description: Option<String>,
    ) -> Result<Transaction, ProcessingError> {
        self.check_account_ready(account_id, amount)?;

        let mut txn = Transaction::new(
            self.new_reference(),
            TransactionType::Withdrawal,
            amount,
            Money::zero(amount.currency),
            channel,
            self.now(),
        )?;
        txn.from_account = Some(account_id);
        txn.description = description;
        txn.expected_completion_date = Some(self.expected_completion(true));
        let id = txn.id;
        self.store.insert_transaction(txn);

        self.advance_if_due(id)?;
        self.transaction_by_id(id)
    }

    /// Creates a transfer: routes, screens, holds, and stores.
    ///
    /// Internal transfers between accounts of the same owner are
    /// approved and processed synchronously. External transfers place
    /// a hold on `total_amount` and wait for the sweep to confirm and
    /// submit them.
    pub fn create_transfer(
        &self,
        from_account: AccountId,
        destination: Destination,
        amount: Money,
        channel: Channel,
        description: Option<String>,
    ) -> Result<(Transaction, TransferRequest), ProcessingError> {
        let from_handle = self
            .store
            .account(from_account)
            .ok_or_else(|| ProcessingError::AccountNotFound(from_account.to_string()))?;
        let (from_number, from_owner) = {
            let account = lock(&from_handle);
            if account.status != AccountStatus::Active {
                return Err(LedgerError::AccountInactive(account.status).into());
            }
            if amount.currency != account.currency {
                return Err(ProcessingError::Ledger(
                    meridian_shared::types::MoneyError::CurrencyMismatch {
                        left: account.currency,
                        right: amount.currency,
                    }
                    .into(),
                ));
            }
            (account.account_number.clone(), account.owner)
        };
        if destination.account_number == from_number {
            return Err(TransferError::SelfTransfer.into());
        }
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount).into());
        }

        let decision = route(
            &destination,
            amount,
            &self.sanctions,
            &self.fees,
            &self.limits,
            |number| self.store.resolve_active_number(number),
        )?;
        if let Some(gateway) = self.gateway_for(decision.transfer_type) {
            gateway.validate_destination(&destination)?;
        }

        let now = self.now();
        let mut txn = Transaction::new(
            self.new_reference(),
            TransactionType::Transfer,
            amount,
            decision.fee,
            channel,
            now,
        )?;
        txn.from_account = Some(from_account);
        txn.to_account = decision.to_account;
        txn.description = description;
        txn.expected_completion_date = Some(self.expected_completion(txn.auto_confirm));
        let total = txn.total_amount;

        // External transfers hold the full amount until submission; a
        // hold that cannot be placed surfaces immediately and nothing
        // is created.
        let hold_amount = if decision.transfer_type.is_external() {
            let mut account = lock(&from_handle);
            account.place_hold(total, now)?;
            Some(total)
        } else {
            None
        };

        let transfer = TransferRequest {
            id: TransferRequestId::new(),
            transaction: txn.id,
            from_account,
            to_account: decision.to_account,
            transfer_type: decision.transfer_type,
            amount,
            fee: decision.fee,
            destination,
            aml: decision.aml,
            hold_amount,
            network_reference: None,
            network_status: None,
            network_fee: None,
            rejection_reason: None,
            created_at: now,
        };
        txn.transfer_request = Some(transfer.id);
        let txn_id = txn.id;
        self.store.insert_transaction(txn);
        self.store.insert_transfer(transfer.clone());
        info!(
            transfer_type = %transfer.transfer_type,
            amount = %amount,
            "transfer created"
        );

        if decision.transfer_type == TransferType::Internal {
            let same_owner = decision
                .to_account
                .and_then(|id| self.store.account(id))
                .map(|handle| lock(&handle).owner == from_owner)
                .unwrap_or(false);
            if same_owner {
                self.confirm_and_process(txn_id)?;
            } else {
                self.advance_if_due(txn_id)?;
            }
        } else {
            self.advance_if_due(txn_id)?;
        }

        let txn = self.transaction_by_id(txn_id)?;
        let transfer = self
            .store
            .transfer(transfer.id)
            .ok_or_else(|| ProcessingError::TransactionNotFound(txn_id.to_string()))?;
        Ok((txn, transfer))
    }

    // ---- transitions -------------------------------------------------

    /// Forces confirmation of a pending transaction, regardless of the
    /// configured delay.
    pub fn confirm(&self, id: TransactionId) -> Result<Vec<TransactionEvent>, ProcessingError> {
        self.confirm_and_process(id)
    }

    /// Fails a transaction, restoring balances and releasing any hold.
    ///
    /// Failing an already-failed transaction is a no-op; a completed
    /// or cancelled transaction is rejected (undoing a completed
    /// transaction is [`Self::reverse`]).
    pub fn fail(
        &self,
        id: TransactionId,
        reason: &str,
    ) -> Result<Vec<TransactionEvent>, ProcessingError> {
        let handle = self
            .store
            .transaction_handle(id)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))?;
        let mut txn = lock(&handle);
        self.fail_under_lock(&mut txn, reason)
    }

    /// Cancels a pending transaction, releasing any hold. Only the
    /// `pending` status may be cancelled.
    pub fn cancel(&self, id: TransactionId) -> Result<Vec<TransactionEvent>, ProcessingError> {
        let handle = self
            .store
            .transaction_handle(id)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))?;
        let now = self.now();
        let mut txn = lock(&handle);

        // The transition is validated on the stored record before the
        // hold is touched; a concurrent confirm blocks on this lock.
        let event = txn.cancel(now)?;
        self.release_transfer_hold(&txn)?;
        info!(reference = %txn.reference, "transaction cancelled");
        Ok(vec![event])
    }

    /// Status view for a transaction.
    pub fn get_status(&self, id: TransactionId) -> Result<StatusView, ProcessingError> {
        self.transaction_by_id(id).map(StatusView::from)
    }

    /// Copy of a transaction by id.
    pub fn transaction_by_id(&self, id: TransactionId) -> Result<Transaction, ProcessingError> {
        self.store
            .transaction(id)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))
    }

    /// Creates and processes a reversal of a completed transaction.
    ///
    /// The reversal credits the original source with the original
    /// `total_amount`; the original record is untouched apart from
    /// being referenced.
    pub fn reverse(&self, original_id: TransactionId) -> Result<Transaction, ProcessingError> {
        let original = self.transaction_by_id(original_id)?;
        if original.status != TransactionStatus::Completed {
            return Err(ProcessingError::NotEligible {
                reference: original.reference,
            });
        }
        let source = original
            .from_account
            .ok_or_else(|| ProcessingError::NotEligible {
                reference: original.reference.clone(),
            })?;

        let mut txn = Transaction::new(
            self.new_reference(),
            TransactionType::Reversal,
            original.total_amount,
            Money::zero(original.total_amount.currency),
            original.channel,
            self.now(),
        )?;
        txn.to_account = Some(source);
        txn.reversal_of = Some(original_id);
        txn.description = Some(format!("Reversal of {}", original.reference));
        let id = txn.id;
        self.store.insert_transaction(txn);
        self.confirm_and_process(id)?;
        self.transaction_by_id(id)
    }

    // ---- sweep -------------------------------------------------------

    /// Advances every eligible transaction, up to `limit`.
    ///
    /// Three passes: confirm pending transactions past their delay,
    /// submit confirmed external transfers, and complete or fail
    /// processing external transfers whose settlement date has
    /// arrived. One failing transaction never aborts the sweep.
    pub async fn process_eligible(&self, limit: usize, dry_run: bool) -> SweepCounts {
        let mut counts = SweepCounts::default();
        let today = self.now().date_naive();

        let due: Vec<TransactionId> = self
            .store
            .transactions_where(|txn| {
                txn.status == TransactionStatus::Pending
                    && txn.auto_confirm
                    && self.confirmation_due(txn)
            })
            .into_iter()
            .take(limit)
            .collect();
        for id in due {
            counts.examined += 1;
            if dry_run {
                counts.confirmed += 1;
                continue;
            }
            match self.confirm_and_process(id) {
                Ok(events) => {
                    counts.confirmed += 1;
                    for event in events {
                        match event {
                            TransactionEvent::Completed { .. } => counts.completed += 1,
                            TransactionEvent::Failed { .. } => counts.failed += 1,
                            _ => {}
                        }
                    }
                }
                Err(err) => {
                    warn!(transaction = %id, error = %err, "sweep confirmation failed");
                }
            }
        }

        let submittable: Vec<TransactionId> = self
            .store
            .transactions_where(|txn| {
                txn.status == TransactionStatus::Confirmed && Self::is_external_transfer(txn)
            })
            .into_iter()
            .take(limit.saturating_sub(counts.examined))
            .collect();
        for id in submittable {
            counts.examined += 1;
            if dry_run {
                counts.submitted += 1;
                continue;
            }
            match self.submit_external(id).await {
                Ok(submitted) => {
                    if submitted {
                        counts.submitted += 1;
                    } else {
                        counts.failed += 1;
                    }
                }
                Err(err) => {
                    warn!(transaction = %id, error = %err, "sweep submission failed");
                }
            }
        }

        let settling: Vec<TransactionId> = self
            .store
            .transactions_where(|txn| {
                txn.status == TransactionStatus::Processing
                    && Self::is_external_transfer(txn)
                    && txn.external_reference.is_some()
                    && txn.expected_completion_date.is_some_and(|date| date <= today)
            })
            .into_iter()
            .take(limit.saturating_sub(counts.examined))
            .collect();
        for id in settling {
            counts.examined += 1;
            if dry_run {
                continue;
            }
            match self.poll_settlement(id).await {
                Ok(Some(NetworkStatus::Completed)) => counts.completed += 1,
                Ok(Some(NetworkStatus::Failed)) => counts.failed += 1,
                Ok(_) => {}
                Err(err) => {
                    warn!(transaction = %id, error = %err, "sweep settlement poll failed");
                }
            }
        }

        info!(
            examined = counts.examined,
            confirmed = counts.confirmed,
            submitted = counts.submitted,
            completed = counts.completed,
            failed = counts.failed,
            dry_run,
            "sweep iteration finished"
        );
        counts
    }

    // ---- internals ---------------------------------------------------

    fn check_account_ready(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<(), ProcessingError> {
        let handle = self
            .store
            .account(account_id)
            .ok_or_else(|| ProcessingError::AccountNotFound(account_id.to_string()))?;
        let account = lock(&handle);
        if account.status != AccountStatus::Active {
            return Err(LedgerError::AccountInactive(account.status).into());
        }
        if amount.currency != account.currency {
            return Err(ProcessingError::Ledger(
                meridian_shared::types::MoneyError::CurrencyMismatch {
                    left: account.currency,
                    right: amount.currency,
                }
                .into(),
            ));
        }
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount).into());
        }
        Ok(())
    }

    fn advance_if_due(&self, id: TransactionId) -> Result<(), ProcessingError> {
        let txn = self.transaction_by_id(id)?;
        if txn.status == TransactionStatus::Pending && txn.auto_confirm && self.confirmation_due(&txn)
        {
            match self.confirm_and_process(id) {
                Ok(_) => {}
                // A concurrent sweep got there first.
                Err(ProcessingError::Transaction(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Confirms a pending transaction; for everything except external
    /// transfers this also applies the mutation and completes.
    /// External transfers stop at `confirmed` and wait for submission.
    ///
    /// Works on the stored transaction under its lock, so concurrent
    /// callers serialize and exactly one can win each transition.
    fn confirm_and_process(&self, id: TransactionId) -> Result<Vec<TransactionEvent>, ProcessingError> {
        let now = self.now();
        let handle = self
            .store
            .transaction_handle(id)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))?;
        let mut txn = lock(&handle);
        let mut events = vec![txn.confirm(now)?];

        if Self::is_external_transfer(&txn) {
            return Ok(events);
        }

        let (from, to) = (txn.from_account, txn.to_account);
        let more = self.with_accounts(from, to, |from_acct, to_acct| {
            let mut inner = apply_mutation(&mut txn, from_acct, to_acct, now)?;
            if txn.status == TransactionStatus::Processing {
                inner.push(txn.complete(now)?);
            }
            Ok::<_, ProcessingError>(inner)
        })??;
        events.extend(more);
        Ok(events)
    }

    /// Submits a confirmed external transfer to its network.
    ///
    /// Returns `Ok(true)` when the network accepted, `Ok(false)` when
    /// it rejected (the transaction is failed and funds restored).
    async fn submit_external(&self, id: TransactionId) -> Result<bool, ProcessingError> {
        let now = self.now();
        let handle = self
            .store
            .transaction_handle(id)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))?;
        let transfer = self
            .store
            .transfer_for_transaction(id)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))?;
        let from_handle = self
            .store
            .account(transfer.from_account)
            .ok_or_else(|| ProcessingError::AccountNotFound(transfer.from_account.to_string()))?;

        // First locked section: release the hold and debit. The status
        // check runs on the stored record so a concurrent submit of
        // the same transfer cannot release the hold twice.
        let reference = {
            let mut txn = lock(&handle);
            if txn.status != TransactionStatus::Confirmed {
                return Err(TransactionError::InvalidTransition {
                    from: txn.status,
                    to: TransactionStatus::Processing,
                }
                .into());
            }
            let mut account = lock(&from_handle);
            if let Some(hold) = transfer.hold_amount {
                account.release_hold(hold, now)?;
                self.store
                    .update_transfer(transfer.id, |stored| stored.hold_amount = None);
            }
            let events = apply_mutation(&mut txn, Some(&mut account), None, now)?;
            if matches!(events.first(), Some(TransactionEvent::Failed { .. })) {
                return Ok(false);
            }
            txn.reference.clone()
        };

        // Network call with no lock held.
        let gateway = self
            .gateway_for(transfer.transfer_type)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))?;
        let instruction = SettlementInstruction {
            reference,
            amount: transfer.amount,
            destination: transfer.destination.clone(),
        };
        let outcome = gateway.submit(&instruction).await;

        // Second, short locked section: apply the network's answer.
        match outcome {
            Ok(result) if result.success => {
                self.store.update_transfer(transfer.id, |stored| {
                    stored.network_reference = result.network_reference.clone();
                    stored.network_status = Some(result.network_status);
                    stored.network_fee = result.network_fee;
                });
                self.store.update_transaction(id, |stored| {
                    stored.external_reference = result.network_reference.clone();
                    stored.status_message =
                        Some(format!("Submitted to {}", gateway.network_name()));
                });
                Ok(true)
            }
            Ok(result) => {
                let reason = result
                    .rejection_reason
                    .unwrap_or_else(|| "network_rejected".to_string());
                self.store.update_transfer(transfer.id, |stored| {
                    stored.network_status = Some(NetworkStatus::Failed);
                    stored.rejection_reason = Some(reason.clone());
                });
                let mut txn = lock(&handle);
                self.fail_under_lock(&mut txn, &reason)?;
                Ok(false)
            }
            Err(err) => {
                let mut txn = lock(&handle);
                self.fail_under_lock(&mut txn, &err.to_string())?;
                Ok(false)
            }
        }
    }

    /// Polls the settlement network for a processing external transfer
    /// and applies a terminal answer.
    async fn poll_settlement(
        &self,
        id: TransactionId,
    ) -> Result<Option<NetworkStatus>, ProcessingError> {
        let now = self.now();
        let handle = self
            .store
            .transaction_handle(id)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))?;
        let transfer = self
            .store
            .transfer_for_transaction(id)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))?;
        let Some(reference) = transfer.network_reference.clone() else {
            return Ok(None);
        };
        let gateway = self
            .gateway_for(transfer.transfer_type)
            .ok_or_else(|| ProcessingError::TransactionNotFound(id.to_string()))?;

        let status = gateway.check_status(&reference).await?;
        self.store
            .update_transfer(transfer.id, |stored| stored.network_status = Some(status));

        match status {
            NetworkStatus::Completed => {
                let mut txn = lock(&handle);
                txn.complete(now)?;
                info!(reference = %txn.reference, network_reference = %reference, "external transfer settled");
                Ok(Some(status))
            }
            NetworkStatus::Failed => {
                let mut txn = lock(&handle);
                self.fail_under_lock(&mut txn, "network_failed")?;
                Ok(Some(status))
            }
            NetworkStatus::Processing | NetworkStatus::PendingCompliance => Ok(Some(status)),
        }
    }

    /// Fails the stored transaction the caller has locked, restoring
    /// balances under the accounts' locks and releasing any
    /// outstanding hold first.
    ///
    /// A no-op on an already-failed transaction; a completed or
    /// cancelled one is rejected before the hold is touched.
    fn fail_under_lock(
        &self,
        txn: &mut Transaction,
        reason: &str,
    ) -> Result<Vec<TransactionEvent>, ProcessingError> {
        let now = self.now();
        if txn.status == TransactionStatus::Failed {
            return Ok(Vec::new());
        }
        if txn.status.is_terminal() {
            return Err(TransactionError::Terminal(txn.status).into());
        }
        self.release_transfer_hold(txn)?;

        let (from, to) = (txn.from_account, txn.to_account);
        let events = self.with_accounts(from, to, |from_acct, to_acct| {
            fail_with_restoration(txn, from_acct, to_acct, reason, now)
        })??;
        Ok(events)
    }

    /// Releases the hold backing a transfer, if one is still placed.
    fn release_transfer_hold(&self, txn: &Transaction) -> Result<(), ProcessingError> {
        let Some(transfer_id) = txn.transfer_request else {
            return Ok(());
        };
        let Some(transfer) = self.store.transfer(transfer_id) else {
            return Ok(());
        };
        let Some(hold) = transfer.hold_amount else {
            return Ok(());
        };
        let handle = self
            .store
            .account(transfer.from_account)
            .ok_or_else(|| ProcessingError::AccountNotFound(transfer.from_account.to_string()))?;
        let now = self.now();
        {
            let mut account = lock(&handle);
            account.release_hold(hold, now)?;
        }
        self.store
            .update_transfer(transfer_id, |stored| stored.hold_amount = None);
        Ok(())
    }

    /// Resolves and locks the accounts a transaction touches, in
    /// ascending account-id order, and runs `f` under the locks.
    fn with_accounts<R>(
        &self,
        from: Option<AccountId>,
        to: Option<AccountId>,
        f: impl FnOnce(Option<&mut Account>, Option<&mut Account>) -> R,
    ) -> Result<R, ProcessingError> {
        let resolve = |id: AccountId| {
            self.store
                .account(id)
                .ok_or_else(|| ProcessingError::AccountNotFound(id.to_string()))
        };
        match (from, to) {
            (Some(from_id), Some(to_id)) => {
                let from_handle = resolve(from_id)?;
                let to_handle = resolve(to_id)?;
                let (mut from_guard, mut to_guard) =
                    lock_ordered(&from_handle, from_id, &to_handle, to_id);
                Ok(f(Some(&mut from_guard), Some(&mut to_guard)))
            }
            (Some(from_id), None) => {
                let handle = resolve(from_id)?;
                let mut guard = lock(&handle);
                Ok(f(Some(&mut guard), None))
            }
            (None, Some(to_id)) => {
                let handle = resolve(to_id)?;
                let mut guard = lock(&handle);
                Ok(f(None, Some(&mut guard)))
            }
            (None, None) => Ok(f(None, None)),
        }
    }
}
