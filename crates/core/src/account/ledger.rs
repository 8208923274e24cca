//! The balance ledger: the only code allowed to mutate balances.
//!
//! Two primitives, `credit` and `debit`, perform every balance change
//! in the system. Each one checks account status, checks funds for
//! debits, mutates `balance`, and recomputes
//! `available_balance = balance - hold_balance` in the same unit of
//! work. Hold primitives follow the same discipline.

use chrono::{DateTime, Utc};
use meridian_shared::types::{AccountId, Currency, CustomerId, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::AccountStatus;

/// A bank account with its balances.
///
/// Balance fields are private: the ledger primitives below are the only
/// mutation path, which is what keeps the
/// `available_balance = balance - hold_balance` invariant enforceable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owner of the account.
    pub owner: CustomerId,
    /// Unique human-facing account number.
    pub account_number: String,
    /// Display name for the account.
    pub account_name: String,
    /// Account currency.
    pub currency: Currency,
    /// Current status.
    pub status: AccountStatus,
    /// Overdraft allowance added to available funds for debit checks.
    pub overdraft_limit: Money,
    balance: Money,
    hold_balance: Money,
    available_balance: Money,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
    /// When the account was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Opens a new account with a zero balance.
    #[must_use]
    pub fn open(
        owner: CustomerId,
        account_number: String,
        account_name: String,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            owner,
            account_number,
            account_name,
            currency,
            status: AccountStatus::Active,
            overdraft_limit: Money::zero(currency),
            balance: Money::zero(currency),
            hold_balance: Money::zero(currency),
            available_balance: Money::zero(currency),
            created_at: now,
            updated_at: now,
        }
    }

    /// Current settled balance.
    #[must_use]
    pub const fn balance(&self) -> Money {
        self.balance
    }

    /// Funds held against pending transfers.
    #[must_use]
    pub const fn hold_balance(&self) -> Money {
        self.hold_balance
    }

    /// Balance minus holds; always equals `balance - hold_balance`.
    #[must_use]
    pub const fn available_balance(&self) -> Money {
        self.available_balance
    }

    /// Returns true if a debit of `amount` would be allowed.
    #[must_use]
    pub fn can_debit(&self, amount: Money) -> bool {
        if amount.currency != self.currency {
            return false;
        }
        let headroom = self
            .available_balance
            .amount
            .saturating_add(self.overdraft_limit.amount);
        headroom >= amount.amount
    }

    /// Credits `amount` to the account.
    pub fn credit(&mut self, amount: Money, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.check_active()?;
        Self::check_positive(amount)?;
        self.balance = self.balance.checked_add(amount)?;
        self.recompute_available(now)
    }

    /// Debits `amount` from the account.
    ///
    /// Refused with [`LedgerError::InsufficientFunds`] when
    /// `available_balance + overdraft_limit < amount`; nothing is
    /// mutated on refusal.
    pub fn debit(&mut self, amount: Money, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.check_active()?;
        Self::check_positive(amount)?;
        if !self.can_debit(amount) {
            return Err(LedgerError::InsufficientFunds {
                available: self.available_balance,
                requested: amount,
            });
        }
        self.balance = self.balance.checked_sub(amount)?;
        self.recompute_available(now)
    }

    /// Places a hold, reducing available funds without moving balance.
    pub fn place_hold(&mut self, amount: Money, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.check_active()?;
        Self::check_positive(amount)?;
        if !self.can_debit(amount) {
            return Err(LedgerError::InsufficientFunds {
                available: self.available_balance,
                requested: amount,
            });
        }
        self.hold_balance = self.hold_balance.checked_add(amount)?;
        self.recompute_available(now)
    }

    /// Releases a previously placed hold.
    pub fn release_hold(&mut self, amount: Money, now: DateTime<Utc>) -> Result<(), LedgerError> {
        Self::check_positive(amount)?;
        if amount.amount > self.hold_balance.amount {
            return Err(LedgerError::ExcessiveHoldRelease {
                held: self.hold_balance,
                requested: amount,
            });
        }
        self.hold_balance = self.hold_balance.checked_sub(amount)?;
        self.recompute_available(now)
    }

    /// Restores the settled balance from a pre-transition snapshot.
    ///
    /// This is the reversal-on-failure primitive: a transaction that
    /// fails after mutating balances puts every touched account back to
    /// the balance captured before the mutation. It deliberately skips
    /// the status check so that funds always return, even if the
    /// account was suspended in the meantime.
    pub fn restore(&mut self, balance_before: Money, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if balance_before.currency != self.currency {
            return Err(LedgerError::Money(
                meridian_shared::types::MoneyError::CurrencyMismatch {
                    left: self.currency,
                    right: balance_before.currency,
                },
            ));
        }
        self.balance = balance_before;
        self.recompute_available(now)
    }

    fn check_active(&self) -> Result<(), LedgerError> {
        if self.status == AccountStatus::Active {
            Ok(())
        } else {
            Err(LedgerError::AccountInactive(self.status))
        }
    }

    fn check_positive(amount: Money) -> Result<(), LedgerError> {
        if amount.is_positive() {
            Ok(())
        } else {
            Err(LedgerError::NonPositiveAmount(amount))
        }
    }

    fn recompute_available(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.available_balance = self.balance.checked_sub(self.hold_balance)?;
        self.updated_at = now;
        Ok(())
    }

    /// Test/seed helper: deposit an opening balance without going
    /// through a transaction.
    pub fn seed_balance(&mut self, amount: Decimal, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.credit(Money::new(amount, self.currency), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::Usd)
    }

    fn test_account(balance: Decimal) -> Account {
        let now = Utc::now();
        let mut account = Account::open(
            CustomerId::new(),
            "0123456789".to_string(),
            "Test Account".to_string(),
            Currency::Usd,
            now,
        );
        if balance > Decimal::ZERO {
            account.seed_balance(balance, now).unwrap();
        }
        account
    }

    #[test]
    fn test_credit_increases_balance_and_available() {
        let mut account = test_account(dec!(100.00));
        account.credit(usd(dec!(50.00)), Utc::now()).unwrap();
        assert_eq!(account.balance().amount, dec!(150.00));
        assert_eq!(account.available_balance().amount, dec!(150.00));
    }

    #[test]
    fn test_debit_decreases_balance() {
        let mut account = test_account(dec!(100.00));
        account.debit(usd(dec!(40.00)), Utc::now()).unwrap();
        assert_eq!(account.balance().amount, dec!(60.00));
        assert_eq!(account.available_balance().amount, dec!(60.00));
    }

    #[test]
    fn test_debit_refused_on_insufficient_funds() {
        let mut account = test_account(dec!(100.00));
        let err = account.debit(usd(dec!(150.00)), Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        // Nothing mutated on refusal.
        assert_eq!(account.balance().amount, dec!(100.00));
        assert_eq!(account.available_balance().amount, dec!(100.00));
    }

    #[test]
    fn test_overdraft_extends_debit_headroom() {
        let mut account = test_account(dec!(100.00));
        account.overdraft_limit = usd(dec!(50.00));
        account.debit(usd(dec!(130.00)), Utc::now()).unwrap();
        assert_eq!(account.balance().amount, dec!(-30.00));
    }

    #[test]
    fn test_inactive_account_rejects_mutations() {
        let mut account = test_account(dec!(100.00));
        account.status = AccountStatus::Suspended;
        assert!(matches!(
            account.credit(usd(dec!(10.00)), Utc::now()),
            Err(LedgerError::AccountInactive(AccountStatus::Suspended))
        ));
        assert!(matches!(
            account.debit(usd(dec!(10.00)), Utc::now()),
            Err(LedgerError::AccountInactive(AccountStatus::Suspended))
        ));
    }

    #[test]
    fn test_hold_reduces_available_not_balance() {
        let mut account = test_account(dec!(100.00));
        account.place_hold(usd(dec!(30.00)), Utc::now()).unwrap();
        assert_eq!(account.balance().amount, dec!(100.00));
        assert_eq!(account.hold_balance().amount, dec!(30.00));
        assert_eq!(account.available_balance().amount, dec!(70.00));
    }

    #[test]
    fn test_hold_respects_available_funds() {
        let mut account = test_account(dec!(100.00));
        account.place_hold(usd(dec!(80.00)), Utc::now()).unwrap();
        assert!(matches!(
            account.place_hold(usd(dec!(30.00)), Utc::now()),
            Err(LedgerError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_release_hold_restores_available() {
        let mut account = test_account(dec!(100.00));
        account.place_hold(usd(dec!(30.00)), Utc::now()).unwrap();
        account.release_hold(usd(dec!(30.00)), Utc::now()).unwrap();
        assert_eq!(account.available_balance().amount, dec!(100.00));
        assert!(account.hold_balance().is_zero());
    }

    #[test]
    fn test_release_more_than_held_is_rejected() {
        let mut account = test_account(dec!(100.00));
        account.place_hold(usd(dec!(10.00)), Utc::now()).unwrap();
        assert!(matches!(
            account.release_hold(usd(dec!(20.00)), Utc::now()),
            Err(LedgerError::ExcessiveHoldRelease { .. })
        ));
    }

    #[test]
    fn test_restore_rewinds_to_snapshot() {
        let mut account = test_account(dec!(100.00));
        let before = account.balance();
        account.debit(usd(dec!(60.00)), Utc::now()).unwrap();
        account.restore(before, Utc::now()).unwrap();
        assert_eq!(account.balance().amount, dec!(100.00));
        assert_eq!(account.available_balance().amount, dec!(100.00));
    }

    #[test]
    fn test_currency_mismatch_rejected() {
        let mut account = test_account(dec!(100.00));
        let eur = Money::new(dec!(10.00), Currency::Eur);
        assert!(account.credit(eur, Utc::now()).is_err());
        assert!(!account.can_debit(eur));
    }

    #[test]
    fn test_available_invariant_across_mutations() {
        let mut account = test_account(dec!(500.00));
        let now = Utc::now();
        account.place_hold(usd(dec!(120.00)), now).unwrap();
        account.credit(usd(dec!(75.50)), now).unwrap();
        account.debit(usd(dec!(60.00)), now).unwrap();
        account.release_hold(usd(dec!(20.00)), now).unwrap();

        let expected = account.balance().amount - account.hold_balance().amount;
        assert_eq!(account.available_balance().amount, expected);
    }
}
