//! Heuristic English/Swahili detection.

use huddle_types::intent::Language;

/// Words whose presence signals Swahili. Matched by substring containment.
const SWAHILI_MARKERS: &[&str] = &[
    "habari", "sawa", "asante", "tafadhali", "ndiyo", "hapana",
    "karibu", "kwaheri", "sana", "bado", "tayari", "kazi",
    "pesa", "hela", "shilingi", "mchango", "kikundi", "watu",
    "nitafanya", "niko", "tuko", "anza", "funga", "muhtasari",
    "nimeshatuma", "nitatuma", "tunaendelea", "haya", "safi",
];

/// Marker-to-token ratio above which the text counts as Swahili.
const RATIO_THRESHOLD: f64 = 0.1;

/// Distinct markers that classify as Swahili regardless of ratio.
const MIN_DISTINCT_MARKERS: usize = 2;

/// Detect whether `text` is Swahili or English. Never fails; empty text is
/// English.
pub fn detect_language(text: &str) -> Language {
    let normalized = text.to_lowercase();
    let words = normalized.split_whitespace().count();
    if words == 0 {
        return Language::En;
    }

    let matched = SWAHILI_MARKERS
        .iter()
        .filter(|marker| normalized.contains(*marker))
        .count();
    let ratio = matched as f64 / words as f64;

    if ratio > RATIO_THRESHOLD || matched >= MIN_DISTINCT_MARKERS {
        Language::Sw
    } else {
        Language::En
    }
}
