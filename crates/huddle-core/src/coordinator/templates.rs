//! Per-language reply templates.
//!
//! Formatting is pure and separate from the dispatch logic: adding a
//! language means adding one template function here. A language that has
//! no wording for some reply falls back to English.

use huddle_types::intent::Language;
use huddle_types::session::RETENTION_DAYS;

/// Every reply the coordinator can produce, with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<'a> {
    SessionStarted { code: &'a str },
    SessionExists { code: &'a str },
    Joined { code: &'a str, participants: usize },
    JoinNotice { name: &'a str, participants: usize },
    InvalidCode { code: &'a str },
    AlreadyJoined { code: &'a str },
    ContributionLogged { name: &'a str, amount: f64 },
    TaskLogged { name: &'a str, text: &'a str },
    NoSession,
    Summary { text: &'a str },
    SummaryUnavailable,
    SessionClosed { summary: Option<&'a str> },
    Status { code: &'a str, participants: usize, contributions: u64 },
    Left { code: &'a str },
    NotInSession,
    Intro,
    Error,
}

/// Render `reply` in `language`, falling back to English.
pub fn render(language: Language, reply: &Reply<'_>) -> String {
    match language {
        Language::En => english(reply),
        Language::Sw => swahili(reply).unwrap_or_else(|| english(reply)),
    }
}

fn english(reply: &Reply<'_>) -> String {
    match reply {
        Reply::SessionStarted { code } => format!(
            "🟢 Huddle started! Code: *{code}*. Others can join with \"join {code}\". \
             Share contributions or commitments. Type \"summary\" anytime, \"close\" when done."
        ),
        Reply::SessionExists { code } => {
            format!("⚡ A Huddle is already active: *{code}*.")
        }
        Reply::Joined { code, participants } => format!(
            "🤝 You joined Huddle *{code}*. {participants} participants so far."
        ),
        Reply::JoinNotice { name, participants } => {
            format!("👋 {name} joined the Huddle. {participants} participants now.")
        }
        Reply::InvalidCode { code } => {
            format!("❌ No active Huddle with code {code}. Check the code and try again.")
        }
        Reply::AlreadyJoined { code } => format!(
            "⚡ You're already in Huddle *{code}*. Type \"leave huddle\" before joining another."
        ),
        Reply::ContributionLogged { name, amount } => format!("✅ {name}: {amount} TZS logged."),
        Reply::TaskLogged { name, text } => format!("📌 {name} committed: \"{text}\""),
        Reply::NoSession => "❌ No active Huddle. Type \"start huddle\" to begin, \
                             or \"join <code>\" to join one."
            .to_string(),
        Reply::Summary { text } => format!("📊 *Huddle Summary*\n\n{text}"),
        Reply::SummaryUnavailable => {
            "📊 The summary isn't available right now. Please try again shortly.".to_string()
        }
        Reply::SessionClosed { summary } => with_final_summary(
            *summary,
            format!("🔴 Huddle closed. Data will be auto-deleted in {RETENTION_DAYS} days."),
        ),
        Reply::Status {
            code,
            participants,
            contributions,
        } => format!(
            "📋 Huddle *{code}*: {participants} participants, {contributions} contributions logged."
        ),
        Reply::Left { code } => format!("👋 You left Huddle *{code}*."),
        Reply::NotInSession => "❌ You're not in any Huddle.".to_string(),
        Reply::Intro => "👋 I'm Huddle. I help groups align quickly. Type \"start huddle\" \
                         to begin, or \"join <code>\" to join one. Auto-deletes when done."
            .to_string(),
        Reply::Error => "⚠️ Something went wrong. Please try again.".to_string(),
    }
}

fn swahili(reply: &Reply<'_>) -> Option<String> {
    let text = match reply {
        Reply::SessionStarted { code } => format!(
            "🟢 Huddle imeanza! Namba: *{code}*. Wengine wajiunge kwa \"jiunge {code}\". \
             Tuma mchango au ahadi yako. Andika \"muhtasari\" wakati wowote, \"funga\" ukimaliza."
        ),
        Reply::SessionExists { code } => format!("⚡ Huddle tayari ipo: *{code}*."),
        Reply::Joined { code, participants } => format!(
            "🤝 Umejiunga na Huddle *{code}*. Washiriki {participants} hadi sasa."
        ),
        Reply::JoinNotice { name, participants } => {
            format!("👋 {name} amejiunga na Huddle. Washiriki {participants} sasa.")
        }
        Reply::InvalidCode { code } => {
            format!("❌ Hakuna Huddle inayoendelea yenye namba {code}. Hakiki namba ujaribu tena.")
        }
        Reply::AlreadyJoined { code } => format!(
            "⚡ Tayari uko kwenye Huddle *{code}*. Andika \"ondoka huddle\" kabla ya kujiunga nyingine."
        ),
        Reply::ContributionLogged { name, amount } => {
            format!("✅ {name}: {amount} TZS imerekodiwa.")
        }
        Reply::TaskLogged { name, text } => format!("📌 {name} ameahidi: \"{text}\""),
        Reply::NoSession => "❌ Hakuna Huddle inayoendelea. Andika \"anza huddle\" kuanza, \
                             au \"jiunge <namba>\" kujiunga."
            .to_string(),
        Reply::Summary { text } => format!("📊 *Muhtasari wa Huddle*\n\n{text}"),
        Reply::SummaryUnavailable => {
            "📊 Muhtasari haupatikani kwa sasa. Tafadhali jaribu tena baadaye.".to_string()
        }
        Reply::SessionClosed { summary } => with_final_summary(
            *summary,
            format!("🔴 Huddle imefungwa. Data itafutwa baada ya siku {RETENTION_DAYS}."),
        ),
        Reply::Left { code } => format!("👋 Umeondoka kwenye Huddle *{code}*."),
        Reply::NotInSession => "❌ Hauko kwenye Huddle yoyote.".to_string(),
        Reply::Intro => "👋 Mimi ni Huddle. Ninasaidia vikundi kupatana haraka. Andika \
                         \"anza huddle\" kuanza, au \"jiunge <namba>\" kujiunga. Inajifuta ikimalizika."
            .to_string(),
        Reply::Error => "⚠️ Kuna tatizo. Tafadhali jaribu tena.".to_string(),
        Reply::Status { .. } => return None,
    };
    Some(text)
}

fn with_final_summary(summary: Option<&str>, closing: String) -> String {
    match summary {
        Some(summary) => format!("📊 *Final Summary*\n\n{summary}\n\n{closing}"),
        None => closing,
    }
}
