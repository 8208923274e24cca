//! Mock SWIFT gateway for international transfers.

use async_trait::async_trait;
use dashmap::DashMap;
use meridian_shared::types::{Currency, Money};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::transfer::Destination;

use super::gateway::{
    NetworkStatus, OutcomePolicy, SettlementError, SettlementGateway, SettlementInstruction,
    SettlementResult, network_reference,
};

/// BICs the mock network will accept, matched on their first 8
/// characters.
pub const BIC_WHITELIST: [&str; 7] = [
    "DEUTDEFF", "CHASUS33", "BOFAUS3N", "WFBIUS6S", "CITIUS33", "HBUKGB4B", "TESTSWIFT",
];

const REJECTION_REASONS: [&str; 3] = [
    "beneficiary bank declined the payment",
    "intermediary bank unavailable",
    "beneficiary account cannot receive this currency",
];

struct Submission {
    status: NetworkStatus,
    polls_remaining: u32,
}

/// Mock SWIFT network: BIC/IBAN validation, FX conversion, `FT` +
/// 8-digit references, a compliance-hold stage before completion.
pub struct MockSwiftGateway {
    policy: OutcomePolicy,
    rng: Mutex<StdRng>,
    submissions: DashMap<String, Submission>,
    polls_to_complete: u32,
}

impl MockSwiftGateway {
    /// Creates a gateway with the default 90% acceptance rate.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(OutcomePolicy::Probabilistic { num: 9, den: 10 })
    }

    /// Creates a gateway with an explicit outcome policy.
    #[must_use]
    pub fn with_policy(policy: OutcomePolicy) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::from_os_rng()),
            submissions: DashMap::new(),
            polls_to_complete: 2,
        }
    }

    /// Creates a seeded gateway for deterministic tests.
    #[must_use]
    pub fn with_seed(policy: OutcomePolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            submissions: DashMap::new(),
            polls_to_complete: 2,
        }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockSwiftGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_bic(bic: &str) -> Result<(), SettlementError> {
    if !(bic.len() == 8 || bic.len() == 11) || !bic.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SettlementError::InvalidDestination(
            "BIC must be 8 or 11 alphanumeric characters".to_string(),
        ));
    }
    let prefix = &bic[..8];
    if !BIC_WHITELIST.iter().any(|entry| {
        let entry_prefix = if entry.len() >= 8 { &entry[..8] } else { entry };
        entry_prefix == prefix
    }) {
        return Err(SettlementError::InvalidDestination(format!(
            "BIC {bic} is not a recognized correspondent"
        )));
    }
    Ok(())
}

/// Loose IBAN shape check: length 15-34, two-letter country code, two
/// check digits. Full mod-97 validation is the real network's job.
fn validate_iban(iban: &str) -> Result<(), SettlementError> {
    let ok = iban.is_ascii()
        && (15..=34).contains(&iban.len())
        && iban[..2].chars().all(|c| c.is_ascii_alphabetic())
        && iban[2..4].chars().all(|c| c.is_ascii_digit())
        && iban[4..].chars().all(|c| c.is_ascii_alphanumeric());
    if ok {
        Ok(())
    } else {
        Err(SettlementError::InvalidDestination(
            "IBAN must be 15-34 characters: country code, check digits, BBAN".to_string(),
        ))
    }
}

/// Mock mid-market FX rate between two currencies.
///
/// Returns `None` for pairs the mock desk does not quote.
#[must_use]
pub fn fx_rate(from: Currency, to: Currency) -> Option<Decimal> {
    if from == to {
        return Some(Decimal::ONE);
    }
    let rate = match (from, to) {
        (Currency::Usd, Currency::Eur) => Decimal::new(92, 2),
        (Currency::Usd, Currency::Gbp) => Decimal::new(79, 2),
        (Currency::Usd, Currency::Cad) => Decimal::new(136, 2),
        (Currency::Eur, Currency::Usd) => Decimal::new(109, 2),
        (Currency::Gbp, Currency::Usd) => Decimal::new(127, 2),
        (Currency::Cad, Currency::Usd) => Decimal::new(74, 2),
        _ => return None,
    };
    Some(rate)
}

/// Settlement currency implied by the beneficiary country, when the
/// mock desk knows it.
fn settlement_currency(country: Option<&str>) -> Option<Currency> {
    let country = country?.to_uppercase();
    match country.as_str() {
        "DE" | "FR" | "ES" | "IT" | "NL" | "AT" | "IE" => Some(Currency::Eur),
        "GB" => Some(Currency::Gbp),
        "CA" => Some(Currency::Cad),
        "US" => Some(Currency::Usd),
        _ => None,
    }
}

fn convert(amount: Money, country: Option<&str>) -> Option<Money> {
    let target = settlement_currency(country)?;
    if target == amount.currency {
        return None;
    }
    let rate = fx_rate(amount.currency, target)?;
    let converted = amount.amount.checked_mul(rate)?;
    Some(Money::new(converted.round_dp(2), target))
}

#[async_trait]
impl SettlementGateway for MockSwiftGateway {
    fn network_name(&self) -> &'static str {
        "swift"
    }

    fn validate_destination(&self, destination: &Destination) -> Result<(), SettlementError> {
        let bic = destination.swift_bic.as_deref().ok_or_else(|| {
            SettlementError::InvalidDestination("SWIFT BIC is required".to_string())
        })?;
        validate_bic(bic)?;
        if let Some(iban) = destination.iban.as_deref() {
            validate_iban(iban)?;
        }
        Ok(())
    }

    async fn submit(
        &self,
        instruction: &SettlementInstruction,
    ) -> Result<SettlementResult, SettlementError> {
        self.validate_destination(&instruction.destination)?;

        let (accepted, reference, reason) = {
            let mut rng = self.rng();
            let accepted = self.policy.accepts(&mut rng);
            let reference = network_reference("FT", 8, &mut rng);
            let reason = REJECTION_REASONS[rng.random_range(0..REJECTION_REASONS.len())];
            (accepted, reference, reason)
        };

        if !accepted {
            info!(
                reference = %instruction.reference,
                reason,
                "swift submission rejected"
            );
            return Ok(SettlementResult {
                success: false,
                network_reference: None,
                network_status: NetworkStatus::Failed,
                network_fee: None,
                settlement_amount: None,
                rejection_reason: Some(reason.to_string()),
            });
        }

        let settlement_amount = convert(
            instruction.amount,
            instruction.destination.country.as_deref(),
        );
        self.submissions.insert(
            reference.clone(),
            Submission {
                status: NetworkStatus::PendingCompliance,
                polls_remaining: self.polls_to_complete,
            },
        );
        info!(
            reference = %instruction.reference,
            network_reference = %reference,
            amount = %instruction.amount,
            "swift submission accepted, pending network compliance"
        );
        Ok(SettlementResult {
            success: true,
            network_reference: Some(reference),
            network_status: NetworkStatus::PendingCompliance,
            network_fee: None,
            settlement_amount,
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
        submission.status = match submission.polls_remaining {
            0 => NetworkStatus::Completed,
            1 => NetworkStatus::Processing,
            _ => NetworkStatus::PendingCompliance,
        };
        Ok(submission.status)
    }
}
