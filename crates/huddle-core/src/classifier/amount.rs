//! Numeric contribution extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Sanity ceiling against fat-finger and garbage input.
pub const MAX_CONTRIBUTION: f64 = 100_000_000.0;

/// First decimal number (optionally comma-grouped), an optional `k`
/// thousands marker ending a word, and an optional currency token.
static CONTRIBUTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)(\s*k\b)?(?:\s*(?:tzs|tsh)\b)?")
        .expect("contribution pattern is a valid regex")
});

/// A monetary pledge found in free text.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub amount: f64,
    /// The matched slice of the original text.
    pub raw: String,
}

/// Extract the first monetary amount from `text`.
///
/// `5k` means 5000. Returns `None` when there is no number, or when the
/// amount is not in `(0, MAX_CONTRIBUTION]`.
pub fn extract_contribution(text: &str) -> Option<Contribution> {
    let caps = CONTRIBUTION_PATTERN.captures(text)?;

    let digits = caps.get(1)?.as_str().replace(',', "");
    let mut amount: f64 = digits.parse().ok()?;
    if caps.get(2).is_some() {
        amount *= 1000.0;
    }

    if !(amount > 0.0 && amount <= MAX_CONTRIBUTION) {
        return None;
    }

    Some(Contribution {
        amount,
        raw: caps.get(0)?.as_str().trim().to_string(),
    })
}
