//! Transfer request and destination metadata.

use chrono::{DateTime, Utc};
use meridian_shared::types::{AccountId, Money, TransactionId, TransferRequestId};
use serde::{Deserialize, Serialize};

use crate::compliance::AmlAssessment;
use crate::settlement::NetworkStatus;

/// Which settlement path a transfer takes.
///
/// Derived exactly once at routing time and never re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    /// Both accounts live in this ledger.
    Internal,
    /// ACH-style transfer to another domestic bank.
    DomesticExternal,
    /// SWIFT-style transfer to a foreign bank.
    International,
}

impl TransferType {
    /// Returns true for transfers that settle over an external network.
    #[must_use]
    pub const fn is_external(self) -> bool {
        !matches!(self, Self::Internal)
    }
}

impl std::fmt::Display for TransferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::DomesticExternal => write!(f, "domestic_external"),
            Self::International => write!(f, "international"),
        }
    }
}

/// Where a transfer is going.
///
/// Which fields are set drives classification: a local account number
/// alone means internal, SWIFT/IBAN fields mean international, routing
/// number or bank name means domestic external.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Destination {
    /// Destination account number (local or at the beneficiary bank).
    pub account_number: String,
    /// Beneficiary name, screened against the sanctions list.
    pub beneficiary_name: String,
    /// Beneficiary postal address, when known.
    pub beneficiary_address: Option<String>,
    /// Beneficiary bank name (external transfers).
    pub bank_name: Option<String>,
    /// 9-digit ABA routing number (domestic external).
    pub routing_number: Option<String>,
    /// 8/11-character BIC (international).
    pub swift_bic: Option<String>,
    /// IBAN (international).
    pub iban: Option<String>,
    /// ISO 3166-1 alpha-2 beneficiary country.
    pub country: Option<String>,
}

impl Destination {
    /// Returns true when any international routing field is present.
    #[must_use]
    pub fn has_international_fields(&self) -> bool {
        self.swift_bic.is_some()
            || self.iban.is_some()
            || self
                .country
                .as_deref()
                .is_some_and(|c| !c.eq_ignore_ascii_case("US"))
    }
}

/// A transfer request wrapping a transaction with routing metadata.
///
/// It has no status field of its own: status is always read off the
/// associated transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Unique identifier.
    pub id: TransferRequestId,
    /// The transaction this transfer drives.
    pub transaction: TransactionId,
    /// Source account.
    pub from_account: AccountId,
    /// Local destination account, for internal transfers.
    pub to_account: Option<AccountId>,
    /// Settlement path, derived once.
    pub transfer_type: TransferType,
    /// Principal amount.
    pub amount: Money,
    /// Fee for this transfer type.
    pub fee: Money,
    /// Destination metadata as submitted.
    pub destination: Destination,
    /// AML assessment, recorded for external transfers.
    pub aml: Option<AmlAssessment>,
    /// Hold currently placed on the source account, cleared when the
    /// hold is released.
    pub hold_amount: Option<Money>,
    /// Reference assigned by the settlement network on acceptance.
    pub network_reference: Option<String>,
    /// Last status reported by the settlement network.
    pub network_status: Option<NetworkStatus>,
    /// Fee charged by the network itself, when reported.
    pub network_fee: Option<Money>,
    /// Reason the network rejected the transfer, when it did.
    pub rejection_reason: Option<String>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

impl TransferRequest {
    /// Returns true once flagged for enhanced due diligence.
    #[must_use]
    pub fn requires_enhanced_due_diligence(&self) -> bool {
        self.aml
            .as_ref()
            .is_some_and(|a| a.requires_enhanced_due_diligence)
    }
}
