//! Mock ACH gateway for domestic external transfers.

use async_trait::async_trait;
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::transfer::Destination;

use super::gateway::{
    NetworkStatus, OutcomePolicy, SettlementError, SettlementGateway, SettlementInstruction,
    SettlementResult, network_reference,
};

/// Routing numbers the mock network will accept.
pub const ROUTING_WHITELIST: [&str; 6] = [
    "021000021", "026009593", "111000025", "121000248", "122000661", "123456789",
];

/// ACH-style return codes used for mock rejections.
const RETURN_CODES: [&str; 3] = [
    "R02 account closed at receiving institution",
    "R03 no account on file",
    "R04 invalid account number structure",
];

struct Submission {
    status: NetworkStatus,
    polls_remaining: u32,
}

/// Mock ACH network: whitelist-validated routing numbers, `ACH` +
/// 8-digit references, probabilistic acceptance, polled completion.
pub struct MockAchGateway {
    policy: OutcomePolicy,
    rng: Mutex<StdRng>,
    submissions: DashMap<String, Submission>,
    polls_to_complete: u32,
}

impl MockAchGateway {
    /// Creates a gateway with the default 95% acceptance rate.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(OutcomePolicy::Probabilistic { num: 19, den: 20 })
    }

    /// Creates a gateway with an explicit outcome policy.
    #[must_use]
    pub fn with_policy(policy: OutcomePolicy) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::from_os_rng()),
            submissions: DashMap::new(),
            polls_to_complete: 1,
        }
    }

    /// Creates a seeded gateway for deterministic tests.
    #[must_use]
    pub fn with_seed(policy: OutcomePolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            submissions: DashMap::new(),
            polls_to_complete: 1,
        }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockAchGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettlementGateway for MockAchGateway {
    fn network_name(&self) -> &'static str {
        "ach"
    }

    fn validate_destination(&self, destination: &Destination) -> Result<(), SettlementError> {
        let routing = destination.routing_number.as_deref().ok_or_else(|| {
            SettlementError::InvalidDestination("routing number is required".to_string())
        })?;
        if routing.len() != 9 || !routing.chars().all(|c| c.is_ascii_digit()) {
            return Err(SettlementError::InvalidDestination(
                "routing number must be 9 digits".to_string(),
            ));
        }
        if !ROUTING_WHITELIST.contains(&routing) {
            return Err(SettlementError::InvalidDestination(format!(
                "routing number {routing} is not a recognized institution"
            )));
        }
        let account = &destination.account_number;
        if account.is_empty() || account.len() > 17 || !account.chars().all(|c| c.is_ascii_digit())
        {
            return Err(SettlementError::InvalidDestination(
                "account number must be 1-17 digits".to_string(),
            ));
        }
        Ok(())
    }

    async fn submit(
        &self,
        instruction: &SettlementInstruction,
    ) -> Result<SettlementResult, SettlementError> {
        self.validate_destination(&instruction.destination)?;

        let (accepted, reference, return_code) = {
            let mut rng = self.rng();
            let accepted = self.policy.accepts(&mut rng);
            let reference = network_reference("ACH", 8, &mut rng);
            let code = RETURN_CODES[rng.random_range(0..RETURN_CODES.len())];
            (accepted, reference, code)
        };

        if !accepted {
            info!(
                reference = %instruction.reference,
                reason = return_code,
                "ach submission rejected"
            );
            return Ok(SettlementResult {
                success: false,
                network_reference: None,
                network_status: NetworkStatus::Failed,
                network_fee: None,
                settlement_amount: None,
                rejection_reason: Some(return_code.to_string()),
            });
        }

        self.submissions.insert(
            reference.clone(),
            Submission {
                status: NetworkStatus::Processing,
                polls_remaining: self.polls_to_complete,
            },
        );
        info!(
            reference = %instruction.reference,
            network_reference = %reference,
            amount = %instruction.amount,
            "ach submission accepted"
        );
        Ok(SettlementResult {
            success: true,
            network_reference: Some(reference),
            network_status: NetworkStatus::Processing,
            network_fee: None,
            settlement_amount: None,
            rejection_reason: None,
        })
    }

    async fn check_status(&self, network_reference: &str) -> Result<NetworkStatus, SettlementError> {
        let mut submission = self
            .submissions
            .get_mut(network_reference)
            .ok_or_else(|| SettlementError::UnknownReference(network_reference.to_string()))?;
        if submission.status.is_terminal() {
            return Ok(submission.status);
        }
        if submission.polls_remaining > 0 {
            submission.polls_remaining -= 1;
        }
        if submission.polls_remaining == 0 {
            submission.status = NetworkStatus::Completed;
        }
        Ok(submission.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_shared::types::{Currency, Money};
    use rust_decimal_macros::dec;

    fn instruction(routing: &str) -> SettlementInstruction {
        SettlementInstruction {
            reference: "TXNTEST00000001".to_string(),
            amount: Money::new(dec!(500.00), Currency::Usd),
            destination: Destination {
                account_number: "987654321".to_string(),
                beneficiary_name: "Jane Doe".to_string(),
                bank_name: Some("First National".to_string()),
                routing_number: Some(routing.to_string()),
                ..Destination::default()
            },
        }
    }

    #[test]
    fn test_validate_rejects_unknown_routing() {
        let gateway = MockAchGateway::with_policy(OutcomePolicy::AlwaysAccept);
        assert!(matches!(
            gateway.validate_destination(&instruction("999999999").destination),
            Err(SettlementError::InvalidDestination(_))
        ));
        assert!(matches!(
            gateway.validate_destination(&instruction("12345").destination),
            Err(SettlementError::InvalidDestination(_))
        ));
        assert!(
            gateway
                .validate_destination(&instruction("021000021").destination)
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_accepted_submission_gets_ach_reference() {
        let gateway = MockAchGateway::with_policy(OutcomePolicy::AlwaysAccept);
        let result = gateway.submit(&instruction("021000021")).await.unwrap();

        assert!(result.success);
        assert_eq!(result.network_status, NetworkStatus::Processing);
        let reference = result.network_reference.unwrap();
        assert!(reference.starts_with("ACH"));
        assert_eq!(reference.len(), 11);
        assert!(reference[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_rejected_submission_carries_return_code() {
        let gateway = MockAchGateway::with_policy(OutcomePolicy::AlwaysReject);
        let result = gateway.submit(&instruction("021000021")).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.network_status, NetworkStatus::Failed);
        assert!(result.network_reference.is_none());
        assert!(result.rejection_reason.unwrap().starts_with('R'));
    }

    #[tokio::test]
    async fn test_status_progresses_to_completed_on_poll() {
        let gateway = MockAchGateway::with_policy(OutcomePolicy::AlwaysAccept);
        let result = gateway.submit(&instruction("021000021")).await.unwrap();
        let reference = result.network_reference.unwrap();

        assert_eq!(
            gateway.check_status(&reference).await.unwrap(),
            NetworkStatus::Completed
        );
        // Terminal status stays put.
        assert_eq!(
            gateway.check_status(&reference).await.unwrap(),
            NetworkStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_unknown_reference_is_an_error() {
        let gateway = MockAchGateway::new();
        assert!(matches!(
            gateway.check_status("ACH00000000").await,
            Err(SettlementError::UnknownReference(_))
        ));
    }
}
