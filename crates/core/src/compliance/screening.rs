//! Sanctions screening and AML risk scoring.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Countries scored as high-risk for AML purposes (ISO 3166-1 alpha-2).
pub const HIGH_RISK_COUNTRIES: [&str; 4] = ["AF", "IR", "KP", "SY"];

/// Score above which a transfer requires enhanced due diligence.
pub const EDD_THRESHOLD: u32 = 50;

const SCORE_CAP: u32 = 100;
const HIGH_THRESHOLD: u32 = 70;
const MEDIUM_THRESHOLD: u32 = 30;

/// A configurable blocklist of sanctioned party names.
///
/// Matching is a case-insensitive substring check: a beneficiary name
/// that contains any list entry is blocked. Substring matching is
/// deliberately broad; false positives go to manual review, false
/// negatives go to the regulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanctionsList {
    entries: Vec<String>,
}

impl Default for SanctionsList {
    fn default() -> Self {
        Self::with_entries([
            "BLOCKED PERSON",
            "SANCTIONED ENTITY",
            "TEST SANCTIONS",
            "DENIED PARTY",
        ])
    }
}

impl SanctionsList {
    /// Builds a list from the given entries, upper-casing each one.
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.into().to_uppercase())
                .collect(),
        }
    }

    /// Adds an entry to the list.
    pub fn add(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into().to_uppercase());
    }

    /// Screens a beneficiary name against the list.
    #[must_use]
    pub fn screen(&self, name: &str) -> ScreeningOutcome {
        let upper = name.to_uppercase();
        for entry in &self.entries {
            if upper.contains(entry.as_str()) {
                return ScreeningOutcome::Blocked {
                    matched_entry: entry.clone(),
                };
            }
        }
        ScreeningOutcome::Cleared
    }
}

/// Result of a sanctions screening check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "outcome")]
pub enum ScreeningOutcome {
    /// No list entry matched.
    Cleared,
    /// A list entry matched; the transfer must be blocked.
    Blocked {
        /// The list entry that matched.
        matched_entry: String,
    },
}

impl ScreeningOutcome {
    /// Returns true when the name matched a list entry.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// AML risk band derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score 0 to 30.
    Low,
    /// Score 31 to 70.
    Medium,
    /// Score 71 and above.
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Outcome of AML risk scoring for a transfer.
///
/// Scoring never blocks on its own; a high score only flags the
/// transfer for enhanced due diligence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmlAssessment {
    /// Total risk score, capped at 100.
    pub score: u32,
    /// Risk band for the score.
    pub level: RiskLevel,
    /// Human-readable factors that contributed to the score.
    pub factors: Vec<String>,
    /// Whether the score exceeds the enhanced due diligence threshold.
    pub requires_enhanced_due_diligence: bool,
}

/// Scores a transfer for AML risk.
///
/// Amount bands: over 10,000 adds 20, over 5,000 adds 10. A destination
/// in a high-risk country adds 30. The score is capped at 100.
#[must_use]
pub fn assess_aml_risk(amount: Decimal, destination_country: Option<&str>) -> AmlAssessment {
    let mut score: u32 = 0;
    let mut factors = Vec::new();

    if amount > Decimal::from(10_000) {
        score += 20;
        factors.push("amount exceeds 10,000".to_string());
    } else if amount > Decimal::from(5_000) {
        score += 10;
        factors.push("amount exceeds 5,000".to_string());
    }

    if let Some(country) = destination_country {
        let upper = country.to_uppercase();
        if HIGH_RISK_COUNTRIES.contains(&upper.as_str()) {
            score += 30;
            factors.push(format!("destination country {upper} is high-risk"));
        }
    }

    score = score.min(SCORE_CAP);

    let level = if score > HIGH_THRESHOLD {
        RiskLevel::High
    } else if score > MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    AmlAssessment {
        score,
        level,
        factors,
        requires_enhanced_due_diligence: score > EDD_THRESHOLD,
    }
}
