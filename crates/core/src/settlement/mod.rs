//! External settlement networks behind a pluggable gateway trait.
//!
//! The mock ACH and SWIFT gateways model real-world network variance
//! with probabilistic outcomes; production deployments wire real
//! clients against [`SettlementGateway`]. Callers select a gateway by
//! transfer type only, never by concrete type.

pub mod ach;
pub mod gateway;
pub mod swift;

pub use ach::MockAchGateway;
pub use gateway::{
    NetworkStatus, OutcomePolicy, SettlementError, SettlementGateway, SettlementInstruction,
    SettlementResult,
};
pub use swift::MockSwiftGateway;
