//! Trigger classification: free text to intent.
//!
//! Classification is a first-match-wins scan over an ordered list of keyword
//! groups using substring containment on the lower-cased, trimmed text. Only
//! when no keyword group matches is the numeric contribution fallback tried,
//! so "close 5000" is a close, never a pledge.
//!
//! Both [`classify`] and [`detect_language`] are pure and total.

pub mod amount;
pub mod language;

use huddle_types::intent::Intent;
use tracing::debug;

use crate::code::normalize_code;

pub use amount::{extract_contribution, Contribution, MAX_CONTRIBUTION};
pub use language::detect_language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Start,
    Close,
    Summarize,
    Join,
    MySession,
    Leave,
    Commit,
}

struct KeywordGroup {
    kind: GroupKind,
    keywords: &'static [&'static str],
}

/// Keyword groups in precedence order.
const KEYWORD_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        kind: GroupKind::Start,
        keywords: &["start huddle", "anza huddle"],
    },
    KeywordGroup {
        kind: GroupKind::Close,
        keywords: &["close huddle", "funga huddle", "close", "funga"],
    },
    KeywordGroup {
        kind: GroupKind::Summarize,
        keywords: &["summary", "muhtasari"],
    },
    KeywordGroup {
        kind: GroupKind::Join,
        keywords: &["join", "jiunge"],
    },
    KeywordGroup {
        kind: GroupKind::MySession,
        keywords: &["my huddle", "my session", "huddle yangu"],
    },
    KeywordGroup {
        kind: GroupKind::Leave,
        keywords: &["leave huddle", "ondoka huddle", "toka huddle"],
    },
    KeywordGroup {
        kind: GroupKind::Commit,
        keywords: &["i will", "nitafanya", "niko tayari"],
    },
];

/// Classify a message into an intent, or `None` when nothing matched.
pub fn classify(text: &str) -> Option<Intent> {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    for group in KEYWORD_GROUPS {
        if !group.keywords.iter().any(|kw| normalized.contains(kw)) {
            continue;
        }

        let intent = match group.kind {
            GroupKind::Start => Some(Intent::Start),
            GroupKind::Close => Some(Intent::Close),
            GroupKind::Summarize => Some(Intent::Summarize),
            // A join without a well-formed trailing code falls through.
            GroupKind::Join => trailing_code(&normalized).map(|code| Intent::Join { code }),
            GroupKind::MySession => Some(Intent::MySession),
            GroupKind::Leave => Some(Intent::Leave),
            GroupKind::Commit => Some(Intent::Commit {
                text: text.trim().to_string(),
            }),
        };

        if let Some(intent) = intent {
            debug!(intent = intent.name(), "trigger matched");
            return Some(intent);
        }
    }

    extract_contribution(text).map(|c| Intent::Contribute {
        amount: c.amount,
        raw: c.raw,
    })
}

fn trailing_code(normalized: &str) -> Option<String> {
    normalized.split_whitespace().last().and_then(normalize_code)
}
