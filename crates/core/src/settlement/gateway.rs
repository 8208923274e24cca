//! The settlement gateway trait and its shared types.

use async_trait::async_trait;
use meridian_shared::types::Money;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transfer::Destination;

/// Status reported by a settlement network for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    /// Accepted and moving through the network.
    Processing,
    /// Held at the network's own compliance stage.
    PendingCompliance,
    /// Settled at the receiving institution.
    Completed,
    /// Rejected or timed out by the network.
    Failed,
}

impl NetworkStatus {
    /// Returns true once the network will report nothing further.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::PendingCompliance => write!(f, "pending_compliance"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What a gateway reports back for a submission.
///
/// A rejection is a successful call with `success == false`; errors are
/// reserved for malformed destinations and unknown references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResult {
    /// Whether the network accepted the submission.
    pub success: bool,
    /// Reference assigned by the network on acceptance.
    pub network_reference: Option<String>,
    /// Status at the time of the response.
    pub network_status: NetworkStatus,
    /// Fee charged by the network itself, when reported.
    pub network_fee: Option<Money>,
    /// Amount in the settlement currency, when FX applied.
    pub settlement_amount: Option<Money>,
    /// Why the network rejected the submission, when it did.
    pub rejection_reason: Option<String>,
}

/// Error types for settlement gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// The destination fails the network's format or whitelist rules.
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// No submission is known under this reference.
    #[error("Unknown network reference: {0}")]
    UnknownReference(String),
}

/// A transfer as handed to a settlement network.
#[derive(Debug, Clone)]
pub struct SettlementInstruction {
    /// Our transaction reference, quoted back in network logs.
    pub reference: String,
    /// Principal amount in the source currency.
    pub amount: Money,
    /// Destination metadata.
    pub destination: Destination,
}

/// A settlement network client.
///
/// `submit` and `check_status` are network calls: callers must never
/// hold an account lock across them.
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    /// Short network name for logs (`ach`, `swift`).
    fn network_name(&self) -> &'static str;

    /// Validates destination metadata without submitting anything.
    fn validate_destination(&self, destination: &Destination) -> Result<(), SettlementError>;

    /// Submits a transfer to the network.
    async fn submit(
        &self,
        instruction: &SettlementInstruction,
    ) -> Result<SettlementResult, SettlementError>;

    /// Polls the network for the status of a prior submission.
    async fn check_status(&self, network_reference: &str) -> Result<NetworkStatus, SettlementError>;
}

/// How a mock gateway decides submission outcomes.
#[derive(Debug, Clone, Copy)]
pub enum OutcomePolicy {
    /// Accept with probability `num` in `den`, modeling network
    /// variance.
    Probabilistic {
        /// Numerator of the acceptance ratio.
        num: u32,
        /// Denominator of the acceptance ratio.
        den: u32,
    },
    /// Accept every submission. For tests.
    AlwaysAccept,
    /// Reject every submission. For tests.
    AlwaysReject,
}

impl OutcomePolicy {
    pub(crate) fn accepts(self, rng: &mut StdRng) -> bool {
        match self {
            Self::Probabilistic { num, den } => rng.random_ratio(num, den),
            Self::AlwaysAccept => true,
            Self::AlwaysReject => false,
        }
    }
}

/// Generates a network reference: prefix plus `digits` random digits.
pub(crate) fn network_reference(prefix: &str, digits: usize, rng: &mut StdRng) -> String {
    let mut reference = String::with_capacity(prefix.len() + digits);
    reference.push_str(prefix);
    for _ in 0..digits {
        let digit: u8 = rng.random_range(0..10);
        reference.push(char::from(b'0' + digit));
    }
    reference
}
