//! Core banking logic for Meridian.
//!
//! This crate contains pure banking logic with ZERO web dependencies.
//! All domain types, the transaction state machine, and settlement
//! routing live here.
//!
//! # Modules
//!
//! - `account` - Accounts and the balance ledger primitives
//! - `transaction` - The transaction state machine and audit snapshots
//! - `transfer` - Transfer classification, fees and routing
//! - `settlement` - External settlement gateways (ACH/SWIFT mocks)
//! - `compliance` - Sanctions screening and AML risk scoring
//! - `schedule` - Business-day and settlement-date calculations
//! - `processing` - The orchestration service, store and sweep

pub mod account;
pub mod compliance;
pub mod processing;
pub mod schedule;
pub mod settlement;
pub mod transaction;
pub mod transfer;
