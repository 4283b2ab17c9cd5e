//! Classified intents and reply languages.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Language a message was written in, and the language replies are rendered in.
///
/// English is the primary language: anything not confidently detected as
/// Swahili, and every missing template, falls back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Sw,
}

impl Language {
    /// Two-letter tag persisted alongside sessions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Sw => "sw",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "sw" => Ok(Language::Sw),
            other => Err(format!("invalid language: '{other}'")),
        }
    }
}

/// The classified purpose of an inbound message, with extracted parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Open a new session for the chat.
    Start,
    /// Close the actor's active session.
    Close,
    /// Ask for a summary of the actor's active session.
    Summarize,
    /// Join a session by its shareable code (canonical `HUD-XXXXXX` form).
    Join { code: String },
    /// Ask for a status snapshot of the actor's session.
    MySession,
    /// Leave the actor's active session.
    Leave,
    /// A free-text commitment ("I will bring the chairs").
    Commit { text: String },
    /// A monetary pledge.
    Contribute { amount: f64, raw: String },
}

impl Intent {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Start => "start",
            Intent::Close => "close",
            Intent::Summarize => "summarize",
            Intent::Join { .. } => "join",
            Intent::MySession => "my_session",
            Intent::Leave => "leave",
            Intent::Commit { .. } => "commit",
            Intent::Contribute { .. } => "contribute",
        }
    }
}
