//! Compliance checks consulted before committing external transfers.
//!
//! Two checks run before any funds are held: sanctions screening on the
//! beneficiary name (a match blocks the transfer outright) and AML risk
//! scoring (a high score flags the transfer for enhanced due diligence
//! but does not block it).

pub mod screening;

pub use screening::{AmlAssessment, RiskLevel, SanctionsList, ScreeningOutcome, assess_aml_risk};
