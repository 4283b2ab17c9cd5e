//! Shareable session codes.
//!
//! Codes look like `HUD-7KQ2XP`: a constant tag followed by six symbols from
//! a 32-symbol alphabet without visually ambiguous characters (no `I`, `O`,
//! `0`, `1`). That is ~2^30 codes, so uniqueness among active sessions is
//! probabilistic; the store retries on the rare collision.

use rand::Rng;

/// Constant tag every code starts with.
pub const CODE_PREFIX: &str = "HUD-";

/// Number of random symbols after the tag.
pub const CODE_LENGTH: usize = 6;

/// Symbols codes are drawn from.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a fresh random session code.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{CODE_PREFIX}{body}")
}

/// Normalize a user-typed code token to its canonical uppercase form.
///
/// The tag is required; case and surrounding punctuation (`hud-abc234.`)
/// are not significant. Returns `None` for anything malformed, including
/// bare six-letter words like `sunday`.
pub fn normalize_code(token: &str) -> Option<String> {
    let upper = token
        .trim()
        .trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | '"' | '\'' | '*'))
        .to_uppercase();
    let body = upper.strip_prefix(CODE_PREFIX)?;

    let well_formed = body.len() == CODE_LENGTH
        && body.bytes().all(|b| CODE_ALPHABET.contains(&b));

    well_formed.then(|| format!("{CODE_PREFIX}{body}"))
}
