//! In-memory store for accounts, transactions, and transfer requests.
//!
//! Account and transaction mutexes are the units of mutual exclusion:
//! every balance mutation happens under the owning account's lock and
//! every status transition under the transaction's lock, so a
//! transition is validated and applied on the stored record, never on
//! a stale copy. Two-account operations acquire account locks in
//! ascending account-id order; when a transaction and its accounts are
//! both needed, the transaction lock is taken first. Locks are never
//! held across a network call.

use dashmap::DashMap;
use meridian_shared::types::{AccountId, TransactionId, TransferRequestId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::account::{Account, AccountStatus};
use crate::transaction::Transaction;
use crate::transfer::TransferRequest;

/// Shared handle to a stored account.
pub type AccountHandle = Arc<Mutex<Account>>;

/// Shared handle to a stored transaction.
pub type TransactionHandle = Arc<Mutex<Transaction>>;

/// Locks a shared handle, recovering from poisoning.
pub fn lock<T>(handle: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Locks two account handles in ascending account-id order, returning
/// the guards in argument order.
///
/// Account ids are time-ordered UUIDs, so the ordering is total and
/// stable; two concurrent opposite-direction transfers on the same
/// pair can never deadlock.
pub fn lock_ordered<'a>(
    first: &'a AccountHandle,
    first_id: AccountId,
    second: &'a AccountHandle,
    second_id: AccountId,
) -> (MutexGuard<'a, Account>, MutexGuard<'a, Account>) {
    if first_id <= second_id {
        let first_guard = lock(first);
        let second_guard = lock(second);
        (first_guard, second_guard)
    } else {
        let second_guard = lock(second);
        let first_guard = lock(first);
        (first_guard, second_guard)
    }
}

/// The in-memory backing store.
#[derive(Debug, Default)]
pub struct BankStore {
    accounts: DashMap<AccountId, AccountHandle>,
    account_numbers: DashMap<String, AccountId>,
    transactions: DashMap<TransactionId, TransactionHandle>,
    references: DashMap<String, TransactionId>,
    transfers: DashMap<TransferRequestId, TransferRequest>,
}

impl BankStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an account and registers its number.
    pub fn insert_account(&self, account: Account) -> AccountHandle {
        let id = account.id;
        self.account_numbers
            .insert(account.account_number.clone(), id);
        let handle = Arc::new(Mutex::new(account));
        self.accounts.insert(id, Arc::clone(&handle));
        handle
    }

    /// Looks up an account handle by id.
    #[must_use]
    pub fn account(&self, id: AccountId) -> Option<AccountHandle> {
        self.accounts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Looks up an account handle by account number.
    #[must_use]
    pub fn account_by_number(&self, number: &str) -> Option<AccountHandle> {
        let id = *self.account_numbers.get(number)?;
        self.account(id)
    }

    /// Resolves an account number to an id only if the account exists
    /// and is active. This is the router's `resolve_local` check.
    #[must_use]
    pub fn resolve_active_number(&self, number: &str) -> Option<AccountId> {
        let handle = self.account_by_number(number)?;
        let account = lock(&handle);
        (account.status == AccountStatus::Active).then_some(account.id)
    }

    /// Returns true if an account number is already taken.
    #[must_use]
    pub fn account_number_exists(&self, number: &str) -> bool {
        self.account_numbers.contains_key(number)
    }

    /// Stores a transaction and registers its reference.
    pub fn insert_transaction(&self, transaction: Transaction) -> TransactionHandle {
        self.references
            .insert(transaction.reference.clone(), transaction.id);
        let id = transaction.id;
        let handle = Arc::new(Mutex::new(transaction));
        self.transactions.insert(id, Arc::clone(&handle));
        handle
    }

    /// Looks up a transaction handle by id.
    #[must_use]
    pub fn transaction_handle(&self, id: TransactionId) -> Option<TransactionHandle> {
        self.transactions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Returns a copy of a transaction by id.
    #[must_use]
    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.transactions
            .get(&id)
            .map(|entry| lock(entry.value()).clone())
    }

    /// Returns a copy of a transaction by reference.
    #[must_use]
    pub fn transaction_by_reference(&self, reference: &str) -> Option<Transaction> {
        let id = *self.references.get(reference)?;
        self.transaction(id)
    }

    /// Mutates a stored transaction under its lock.
    ///
    /// Must not be called while the same transaction's lock is already
    /// held; callers holding a [`TransactionHandle`] guard mutate
    /// through it directly.
    pub fn update_transaction<R>(
        &self,
        id: TransactionId,
        f: impl FnOnce(&mut Transaction) -> R,
    ) -> Option<R> {
        let handle = self.transaction_handle(id)?;
        let mut txn = lock(&handle);
        Some(f(&mut txn))
    }

    /// Returns true if a transaction reference is already taken.
    #[must_use]
    pub fn reference_exists(&self, reference: &str) -> bool {
        self.references.contains_key(reference)
    }

    /// Ids of transactions matching a predicate, in creation order.
    #[must_use]
    pub fn transactions_where(&self, pred: impl Fn(&Transaction) -> bool) -> Vec<TransactionId> {
        let mut ids: Vec<TransactionId> = self
            .transactions
            .iter()
            .filter(|entry| pred(&lock(entry.value())))
            .map(|entry| *entry.key())
            .collect();
        // Transaction ids are time-ordered UUIDs.
        ids.sort_unstable();
        ids
    }

    /// Stores a transfer request.
    pub fn insert_transfer(&self, transfer: TransferRequest) {
        self.transfers.insert(transfer.id, transfer);
    }

    /// Returns a copy of a transfer request by id.
    #[must_use]
    pub fn transfer(&self, id: TransferRequestId) -> Option<TransferRequest> {
        self.transfers.get(&id).map(|entry| entry.value().clone())
    }

    /// Returns a copy of the transfer request driving a transaction.
    #[must_use]
    pub fn transfer_for_transaction(&self, transaction: TransactionId) -> Option<TransferRequest> {
        self.transfers
            .iter()
            .find(|entry| entry.transaction == transaction)
            .map(|entry| entry.value().clone())
    }

    /// Mutates a stored transfer request in place.
    pub fn update_transfer<R>(
        &self,
        id: TransferRequestId,
        f: impl FnOnce(&mut TransferRequest) -> R,
    ) -> Option<R> {
        self.transfers.get_mut(&id).map(|mut entry| f(&mut entry))
    }
}
