use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::constants::{PHONE_COUNTRY_CODE, PHONE_MAX, PHONE_MIN};

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("static regex"));

fn digits_only(phone_number: &str) -> String {
    NON_DIGIT.replace_all(phone_number, "").into_owned()
}

/// A plausible Indian mobile number: exactly ten digits once punctuation is
/// stripped, numerically within 6000000000..=9999999999.
pub fn is_valid_mobile(phone_number: &str) -> bool {
    let cleaned = digits_only(phone_number);
    if cleaned.len() != 10 {
        return false;
    }
    cleaned
        .parse::<u64>()
        .map(|n| (PHONE_MIN..=PHONE_MAX).contains(&n))
        .unwrap_or(false)
}

/// SHA-256 hex digest of `"91"` followed by the last ten digits, or `None`
/// for numbers that fail validation.
///
/// Validation runs against the cleaned digits and again against the raw
/// input; both must pass.
pub fn phone_number_hash(phone_number: &str) -> Option<String> {
    let cleaned = digits_only(phone_number);
    if !is_valid_mobile(&cleaned) || !is_valid_mobile(phone_number) {
        return None;
    }

    let last_ten = &cleaned[cleaned.len() - 10..];
    let mut hasher = Sha256::new();
    hasher.update(PHONE_COUNTRY_CODE.as_bytes());
    hasher.update(last_ten.as_bytes());
    Some(hex::encode(hasher.finalize()))
}
