//! Transfer classification, fees, limits, and compliance gating.
//!
//! The router derives `transfer_type` exactly once from the destination
//! metadata; nothing downstream re-derives it. External transfers pass
//! through sanctions screening before any hold is placed.

pub mod error;
pub mod router;
pub mod types;

pub use error::TransferError;
pub use router::{FeeSchedule, RoutingDecision, TransferLimits, route};
pub use types::{Destination, TransferRequest, TransferType};
