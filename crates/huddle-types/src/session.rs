//! Session, participant, and contribution record types.
//!
//! A session is a time-boxed coordination window for one group (or one user
//! when the channel has no native group). Participants join it by its
//! shareable code, and every pledge or commitment is appended as an
//! immutable contribution record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::intent::Language;

/// Days a closed or expired session is kept before it is purged.
pub const RETENTION_DAYS: i64 = 3;

/// Retention window as a duration.
pub fn retention_window() -> Duration {
    Duration::days(RETENTION_DAYS)
}

/// Lifecycle status of a session.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('active', 'closed', 'expired'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Closed,
    Expired,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Closed => write!(f, "closed"),
            SessionStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "closed" => Ok(SessionStatus::Closed),
            "expired" => Ok(SessionStatus::Expired),
            other => Err(format!("invalid session status: '{other}'")),
        }
    }
}

/// A coordination session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Human-shareable code, `HUD-` followed by six unambiguous symbols.
    pub session_code: String,
    /// Group the session belongs to, or the creator's id for direct chats.
    pub group_id: String,
    pub creator_id: Option<String>,
    pub language: Language,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

impl Session {
    /// Whether the session still accepts joins and contributions.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Membership of one identity in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub session_id: Uuid,
    pub user_id: String,
    pub user_name: Option<String>,
    pub joined_at: DateTime<Utc>,
}

/// One logged pledge or commitment.
///
/// Exactly one of `amount` and `commitment_text` is populated, depending on
/// the intent that created the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: String,
    pub user_name: Option<String>,
    pub amount: Option<f64>,
    pub commitment_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ContributionRecord {
    /// Name to show for the contributor, falling back to the raw user id.
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(&self.user_id)
    }
}

/// A session together with its contributions, as handed to summarization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAggregate {
    pub session: Session,
    pub contributions: Vec<ContributionRecord>,
    /// Sum of every non-null amount; `0.0` when nothing was pledged.
    pub total_amount: f64,
}

impl SessionAggregate {
    /// Build an aggregate, computing the pledged total.
    pub fn new(session: Session, contributions: Vec<ContributionRecord>) -> Self {
        let total_amount = contributions
            .iter()
            .filter_map(|c| c.amount)
            .filter(|a| a.is_finite())
            .sum();
        Self {
            session,
            contributions,
            total_amount,
        }
    }
}

/// Result of a create-if-absent session insert.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCreation {
    /// A new session was inserted.
    Created(Session),
    /// The group already had an active session; nothing was inserted.
    Existing(Session),
}

impl SessionCreation {
    pub fn session(&self) -> &Session {
        match self {
            SessionCreation::Created(s) | SessionCreation::Existing(s) => s,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            SessionCreation::Created(s) | SessionCreation::Existing(s) => s,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, SessionCreation::Created(_))
    }
}
