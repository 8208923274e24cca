//! Accounts and the balance ledger.
//!
//! All balance mutation flows through the ledger primitives on
//! [`Account`]; no other code writes balance fields. The ledger
//! maintains the invariant `available_balance = balance - hold_balance`
//! across every mutation.

pub mod error;
pub mod ledger;
pub mod types;

pub use error::LedgerError;
pub use ledger::Account;
pub use types::{AccountStatus, generate_account_number};
