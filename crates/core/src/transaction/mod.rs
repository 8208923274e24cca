//! Transactions and their state machine.
//!
//! Every movement of money is a transaction row moving through
//! `pending → (confirmed →) processing → completed | failed`, with
//! `cancelled` reachable only from `pending`. The machine in
//! [`machine`] is the single place that applies balance mutations and
//! captures before/after snapshots.

pub mod error;
pub mod machine;
pub mod reference;
pub mod types;

pub use error::TransactionError;
pub use machine::{apply_mutation, fail_with_restoration};
pub use reference::generate_reference;
pub use types::{
    Channel, DepositSource, Transaction, TransactionEvent, TransactionStatus, TransactionType,
};
