//! Transaction reference generation.

use rand::Rng;

const PREFIX: &str = "TXN";
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a unique transaction reference: `TXN` followed by
/// `length` random uppercase alphanumerics.
///
/// The collision check is injected so the generator stays free of any
/// storage dependency.
#[must_use]
pub fn generate_reference(length: usize, exists: impl Fn(&str) -> bool) -> String {
    let mut rng = rand::rng();
    loop {
        let mut candidate = String::with_capacity(PREFIX.len() + length);
        candidate.push_str(PREFIX);
        for _ in 0..length {
            let idx = rng.random_range(0..CHARSET.len());
            candidate.push(char::from(CHARSET[idx]));
        }
        if !exists(&candidate) {
            return candidate;
        }
    }
}
