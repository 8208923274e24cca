//! Transfer classification, fee lookup, limit checks, and the
//! compliance gate.

use meridian_shared::config::BankConfig;
use meridian_shared::types::{AccountId, Currency, Money};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::compliance::{AmlAssessment, SanctionsList, assess_aml_risk};

use super::error::TransferError;
use super::types::{Destination, TransferType};

/// Fixed fee table keyed by transfer type.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    ach: Decimal,
    swift: Decimal,
}

impl FeeSchedule {
    /// Builds the schedule from bank configuration.
    #[must_use]
    pub const fn from_config(config: &BankConfig) -> Self {
        Self {
            ach: config.ach_fee,
            swift: config.swift_fee,
        }
    }

    /// Looks up the fee for a transfer type, in the given currency.
    #[must_use]
    pub fn fee_for(&self, transfer_type: TransferType, currency: Currency) -> Money {
        let amount = match transfer_type {
            TransferType::Internal => Decimal::ZERO,
            TransferType::DomesticExternal => self.ach,
            TransferType::International => self.swift,
        };
        Money::new(amount, currency)
    }
}

/// Per-transaction transfer limits.
#[derive(Debug, Clone)]
pub struct TransferLimits {
    per_transfer: Decimal,
    international: Decimal,
}

impl TransferLimits {
    /// Builds the limits from bank configuration.
    #[must_use]
    pub const fn from_config(config: &BankConfig) -> Self {
        Self {
            per_transfer: config.daily_transfer_limit,
            international: config.international_transfer_limit,
        }
    }

    fn check(&self, transfer_type: TransferType, amount: Money) -> Result<(), TransferError> {
        if amount.amount > self.per_transfer {
            return Err(TransferError::LimitExceeded {
                scope: "per-transfer",
                limit: Money::new(self.per_transfer, amount.currency),
                requested: amount,
            });
        }
        if transfer_type == TransferType::International && amount.amount > self.international {
            return Err(TransferError::LimitExceeded {
                scope: "international",
                limit: Money::new(self.international, amount.currency),
                requested: amount,
            });
        }
        Ok(())
    }
}

/// Everything the service needs to build the transaction and transfer
/// request for a routed transfer.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    /// The derived settlement path.
    pub transfer_type: TransferType,
    /// Resolved local destination, for internal transfers.
    pub to_account: Option<AccountId>,
    /// Fee from the schedule, computed once here.
    pub fee: Money,
    /// AML assessment, run for external transfers only.
    pub aml: Option<AmlAssessment>,
}

/// Classifies a destination.
///
/// Canonical order: a destination number resolving to a local active
/// account wins; then any international routing field; everything else,
/// including a bare routing number, bank name, or an unroutable
/// destination, settles domestically. A transfer is never silently
/// dropped; it takes the cheapest external path.
fn classify(
    destination: &Destination,
    resolve_local: impl Fn(&str) -> Option<AccountId>,
) -> (TransferType, Option<AccountId>) {
    if let Some(account_id) = resolve_local(&destination.account_number) {
        return (TransferType::Internal, Some(account_id));
    }
    if destination.has_international_fields() {
        return (TransferType::International, None);
    }
    (TransferType::DomesticExternal, None)
}

/// Routes a transfer: classification, limits, compliance, fee.
///
/// `resolve_local` must return `Some` only for existing *active*
/// accounts. For external transfers, a sanctions match on the
/// beneficiary name rejects the transfer before anything is created or
/// held; a high AML score proceeds flagged for enhanced due diligence.
pub fn route(
    destination: &Destination,
    amount: Money,
    sanctions: &SanctionsList,
    fees: &FeeSchedule,
    limits: &TransferLimits,
    resolve_local: impl Fn(&str) -> Option<AccountId>,
) -> Result<RoutingDecision, TransferError> {
    let (transfer_type, to_account) = classify(destination, resolve_local);
    limits.check(transfer_type, amount)?;

    let aml = if transfer_type.is_external() {
        let screening = sanctions.screen(&destination.beneficiary_name);
        if let crate::compliance::ScreeningOutcome::Blocked { matched_entry } = screening {
            warn!(
                beneficiary = %destination.beneficiary_name,
                matched = %matched_entry,
                "transfer blocked by sanctions screening"
            );
            return Err(TransferError::ComplianceBlocked { matched_entry });
        }
        let assessment = assess_aml_risk(amount.amount, destination.country.as_deref());
        if assessment.requires_enhanced_due_diligence {
            info!(
                beneficiary = %destination.beneficiary_name,
                score = assessment.score,
                "transfer flagged for enhanced due diligence"
            );
        }
        Some(assessment)
    } else {
        None
    };

    let fee = fees.fee_for(transfer_type, amount.currency);
    Ok(RoutingDecision {
        transfer_type,
        to_account,
        fee,
        aml,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_shared::types::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::Usd)
    }

    fn fixtures() -> (SanctionsList, FeeSchedule, TransferLimits) {
        let config = BankConfig::default();
        (
            SanctionsList::default(),
            FeeSchedule::from_config(&config),
            TransferLimits::from_config(&config),
        )
    }

    fn destination(account_number: &str) -> Destination {
        Destination {
            account_number: account_number.to_string(),
            beneficiary_name: "Jane Doe".to_string(),
            ..Destination::default()
        }
    }

    #[test]
    fn test_local_account_classifies_internal() {
        let (sanctions, fees, limits) = fixtures();
        let local = AccountId::new();
        let decision = route(
            &destination("0123456789"),
            usd(dec!(100.00)),
            &sanctions,
            &fees,
            &limits,
            |number| (number == "0123456789").then_some(local),
        )
        .unwrap();

        assert_eq!(decision.transfer_type, TransferType::Internal);
        assert_eq!(decision.to_account, Some(local));
        assert!(decision.fee.is_zero());
        assert!(decision.aml.is_none());
    }

    #[test]
    fn test_swift_fields_classify_international() {
        let (sanctions, fees, limits) = fixtures();
        let mut dest = destination("DE89370400440532013000");
        dest.swift_bic = Some("DEUTDEFF".to_string());
        dest.country = Some("DE".to_string());

        let decision = route(
            &dest,
            usd(dec!(500.00)),
            &sanctions,
            &fees,
            &limits,
            |_| None,
        )
        .unwrap();

        assert_eq!(decision.transfer_type, TransferType::International);
        assert_eq!(decision.fee.amount, dec!(45.00));
        assert!(decision.aml.is_some());
    }

    #[test]
    fn test_unroutable_defaults_to_domestic_external() {
        let (sanctions, fees, limits) = fixtures();
        let decision = route(
            &destination("99999999"),
            usd(dec!(500.00)),
            &sanctions,
            &fees,
            &limits,
            |_| None,
        )
        .unwrap();

        assert_eq!(decision.transfer_type, TransferType::DomesticExternal);
        assert_eq!(decision.fee.amount, dec!(15.00));
    }

    #[test]
    fn test_sanctions_match_blocks_before_anything() {
        let (sanctions, fees, limits) = fixtures();
        let mut dest = destination("99999999");
        dest.beneficiary_name = "Blocked Person".to_string();

        let err = route(
            &dest,
            usd(dec!(100.00)),
            &sanctions,
            &fees,
            &limits,
            |_| None,
        )
        .unwrap_err();

        assert!(matches!(err, TransferError::ComplianceBlocked { .. }));
    }

    #[test]
    fn test_internal_transfers_skip_screening() {
        let (sanctions, fees, limits) = fixtures();
        let local = AccountId::new();
        let mut dest = destination("0123456789");
        // Same name would block an external transfer.
        dest.beneficiary_name = "Blocked Person".to_string();

        let decision = route(
            &dest,
            usd(dec!(100.00)),
            &sanctions,
            &fees,
            &limits,
            |_| Some(local),
        )
        .unwrap();
        assert_eq!(decision.transfer_type, TransferType::Internal);
    }

    #[test]
    fn test_per_transfer_limit() {
        let (sanctions, fees, limits) = fixtures();
        let err = route(
            &destination("99999999"),
            usd(dec!(50000.01)),
            &sanctions,
            &fees,
            &limits,
            |_| None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TransferError::LimitExceeded {
                scope: "per-transfer",
                ..
            }
        ));
    }

    #[test]
    fn test_international_limit() {
        let (sanctions, fees, limits) = fixtures();
        let mut dest = destination("DE89370400440532013000");
        dest.swift_bic = Some("DEUTDEFF".to_string());

        let err = route(&dest, usd(dec!(10000.01)), &sanctions, &fees, &limits, |_| {
            None
        })
        .unwrap_err();
        assert!(matches!(
            err,
            TransferError::LimitExceeded {
                scope: "international",
                ..
            }
        ));
    }

    #[test]
    fn test_high_aml_score_proceeds_flagged() {
        let (sanctions, fees, limits) = fixtures();
        let mut dest = destination("99999999");
        dest.country = Some("IR".to_string());
        dest.swift_bic = Some("TESTSWIFT00".to_string());

        let decision = route(&dest, usd(dec!(9000.00)), &sanctions, &fees, &limits, |_| {
            None
        })
        .unwrap();

        let aml = decision.aml.unwrap();
        // 10 (amount over 5k) + 30 (high-risk country) = 40: flagged
        // medium but below the EDD threshold.
        assert_eq!(aml.score, 40);
        assert!(!aml.requires_enhanced_due_diligence);
    }
}
