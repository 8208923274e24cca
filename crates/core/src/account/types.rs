//! Account status and number generation.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a bank account.
///
/// Only `active` accounts may be debited or credited. Closed accounts
/// are soft state: the row is never physically deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account is open and transacting.
    Active,
    /// Account is temporarily disabled.
    Inactive,
    /// Account is suspended pending review.
    Suspended,
    /// Account has been closed.
    Closed,
    /// Account has seen no activity for an extended period.
    Dormant,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Suspended => write!(f, "suspended"),
            Self::Closed => write!(f, "closed"),
            Self::Dormant => write!(f, "dormant"),
        }
    }
}

const DIGITS: &[u8] = b"0123456789";

/// Generates a unique numeric account number.
///
/// The collision check is injected so the generator stays free of any
/// storage dependency.
#[must_use]
pub fn generate_account_number(length: usize, exists: impl Fn(&str) -> bool) -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    loop {
        let candidate: String = (0..length)
            .map(|_| {
                let idx = rng.random_range(0..DIGITS.len());
                char::from(DIGITS[idx])
            })
            .collect();
        if !exists(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_status_display() {
        assert_eq!(AccountStatus::Active.to_string(), "active");
        assert_eq!(AccountStatus::Suspended.to_string(), "suspended");
        assert_eq!(AccountStatus::Dormant.to_string(), "dormant");
    }

    #[test]
    fn test_generate_account_number_length_and_digits() {
        let number = generate_account_number(10, |_| false);
        assert_eq!(number.len(), 10);
        assert!(number.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_account_number_retries_on_collision() {
        use std::cell::Cell;

        let collisions = Cell::new(0u32);
        let number = generate_account_number(10, |_| {
            // Reject the first three candidates.
            if collisions.get() < 3 {
                collisions.set(collisions.get() + 1);
                true
            } else {
                false
            }
        });
        assert_eq!(collisions.get(), 3);
        assert_eq!(number.len(), 10);
    }
}
