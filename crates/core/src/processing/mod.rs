//! Orchestration: the service tying ledger, machine, router,
//! compliance, and settlement together over the in-memory store.

pub mod clock;
pub mod error;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ProcessingError;
pub use service::{BankService, StatusView, SweepCounts};
pub use store::BankStore;
