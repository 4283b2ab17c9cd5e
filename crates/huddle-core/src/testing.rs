//! In-memory test doubles shared by the coordinator and sweeper tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use huddle_types::error::{NotifyError, RepositoryError, SummarizeError};
use huddle_types::intent::Language;
use huddle_types::session::{
    ContributionRecord, Participant, Session, SessionAggregate, SessionCreation, SessionStatus,
    retention_window,
};
use uuid::Uuid;

use crate::code::generate_code;
use crate::notify::NotificationSink;
use crate::repository::session::SessionRepository;
use crate::summarize::Summarizer;

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    sessions: Vec<Session>,
    participants: Vec<Participant>,
    contributions: Vec<ContributionRecord>,
}

pub struct InMemoryRepository {
    state: Mutex<State>,
    expiry: Duration,
    fail_queries: AtomicBool,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
            expiry: Duration::days(3),
            fail_queries: AtomicBool::new(false),
        }
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a query error.
    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.state.lock().unwrap().sessions.clone()
    }

    pub fn contributions(&self) -> Vec<ContributionRecord> {
        self.state.lock().unwrap().contributions.clone()
    }

    /// Shift a session's timestamps back by `by`.
    pub fn age_session(&self, session_id: &Uuid, by: Duration) {
        let mut state = self.state.lock().unwrap();
        if let Some(s) = state.sessions.iter_mut().find(|s| s.id == *session_id) {
            s.created_at -= by;
            s.expires_at -= by;
            if let Some(closed_at) = s.closed_at.as_mut() {
                *closed_at -= by;
            }
        }
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("database is locked".to_string()));
        }
        Ok(())
    }

    fn active_for_user(state: &State, user_id: &str) -> Option<Session> {
        state
            .participants
            .iter()
            .filter(|p| p.user_id == user_id)
            .filter_map(|p| {
                state
                    .sessions
                    .iter()
                    .find(|s| s.id == p.session_id && s.is_active())
            })
            .max_by_key(|s| s.created_at)
            .cloned()
    }

    fn insert_participant(
        state: &mut State,
        session_id: &Uuid,
        user_id: &str,
        user_name: Option<&str>,
    ) -> Option<Participant> {
        if state
            .participants
            .iter()
            .any(|p| p.session_id == *session_id && p.user_id == user_id)
        {
            return None;
        }
        let participant = Participant {
            session_id: *session_id,
            user_id: user_id.to_string(),
            user_name: user_name.map(str::to_string),
            joined_at: Utc::now(),
        };
        state.participants.push(participant.clone());
        Some(participant)
    }
}

impl SessionRepository for InMemoryRepository {
    async fn create_session(
        &self,
        group_id: &str,
        language: Language,
        creator_id: Option<&str>,
        creator_name: Option<&str>,
    ) -> Result<SessionCreation, RepositoryError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .sessions
            .iter()
            .find(|s| s.group_id == group_id && s.is_active())
        {
            return Ok(SessionCreation::Existing(existing.clone()));
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::now_v7(),
            session_code: generate_code(),
            group_id: group_id.to_string(),
            creator_id: creator_id.map(str::to_string),
            language,
            status: SessionStatus::Active,
            created_at: now,
            expires_at: now + self.expiry,
            closed_at: None,
            summary: None,
        };
        state.sessions.push(session.clone());
        if let Some(creator_id) = creator_id {
            Self::insert_participant(&mut state, &session.id, creator_id, creator_name);
        }
        Ok(SessionCreation::Created(session))
    }

    async fn get_active_session_by_group(
        &self,
        group_id: &str,
    ) -> Result<Option<Session>, RepositoryError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .iter()
            .find(|s| s.group_id == group_id && s.is_active())
            .cloned())
    }

    async fn get_session_by_code(&self, code: &str) -> Result<Option<Session>, RepositoryError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .iter()
            .find(|s| s.session_code.eq_ignore_ascii_case(code) && s.is_active())
            .cloned())
    }

    async fn get_active_session_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<Session>, RepositoryError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(Self::active_for_user(&state, user_id))
    }

    async fn add_participant(
        &self,
        session_id: &Uuid,
        user_id: &str,
        user_name: Option<&str>,
    ) -> Result<Option<Participant>, RepositoryError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        Ok(Self::insert_participant(&mut state, session_id, user_id, user_name))
    }

    async fn remove_participant(
        &self,
        session_id: &Uuid,
        user_id: &str,
    ) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.participants.len();
        state
            .participants
            .retain(|p| !(p.session_id == *session_id && p.user_id == user_id));
        Ok(state.participants.len() < before)
    }

    async fn list_participants(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<Participant>, RepositoryError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .participants
            .iter()
            .filter(|p| p.session_id == *session_id)
            .cloned()
            .collect())
    }

    async fn record_contribution(
        &self,
        session_id: &Uuid,
        user_id: &str,
        user_name: Option<&str>,
        amount: Option<f64>,
        commitment_text: Option<&str>,
    ) -> Result<ContributionRecord, RepositoryError> {
        self.check()?;
        let record = ContributionRecord {
            id: Uuid::now_v7(),
            session_id: *session_id,
            user_id: user_id.to_string(),
            user_name: user_name.map(str::to_string),
            amount,
            commitment_text: commitment_text.map(str::to_string),
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .contributions
            .push(record.clone());
        Ok(record)
    }

    async fn count_contributions(&self, session_id: &Uuid) -> Result<u64, RepositoryError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .contributions
            .iter()
            .filter(|c| c.session_id == *session_id)
            .count() as u64)
    }

    async fn get_session_with_contributions(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<SessionAggregate>, RepositoryError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let Some(session) = state.sessions.iter().find(|s| s.id == *session_id) else {
            return Ok(None);
        };
        let contributions = state
            .contributions
            .iter()
            .filter(|c| c.session_id == *session_id)
            .cloned()
            .collect();
        Ok(Some(SessionAggregate::new(session.clone(), contributions)))
    }

    async fn close_session(
        &self,
        group_id: &str,
        summary: Option<&str>,
    ) -> Result<Option<Session>, RepositoryError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let Some(session) = state
            .sessions
            .iter_mut()
            .find(|s| s.group_id == group_id && s.is_active())
        else {
            return Ok(None);
        };
        session.status = SessionStatus::Closed;
        session.closed_at = Some(Utc::now());
        session.summary = summary.map(str::to_string);
        Ok(Some(session.clone()))
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let mut expired = 0;
        for session in state
            .sessions
            .iter_mut()
            .filter(|s| s.is_active() && s.expires_at < now)
        {
            session.status = SessionStatus::Expired;
            expired += 1;
        }
        Ok(expired)
    }

    async fn purge_old(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        self.check()?;
        let cutoff = now - retention_window();
        let mut state = self.state.lock().unwrap();
        let doomed: HashSet<Uuid> = state
            .sessions
            .iter()
            .filter(|s| match s.status {
                SessionStatus::Closed => s.closed_at.is_some_and(|t| t < cutoff),
                SessionStatus::Expired => s.expires_at < cutoff,
                SessionStatus::Active => false,
            })
            .map(|s| s.id)
            .collect();
        state.sessions.retain(|s| !doomed.contains(&s.id));
        state
            .participants
            .retain(|p| !doomed.contains(&p.session_id));
        state
            .contributions
            .retain(|c| !doomed.contains(&c.session_id));
        Ok(doomed.len() as u64)
    }

    async fn health_check(&self) -> bool {
        !self.fail_queries.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Notification sink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
    unreachable: Mutex<HashSet<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_unreachable(&self, recipient: &str) {
        self.unreachable
            .lock()
            .unwrap()
            .insert(recipient.to_string());
    }

    /// Every delivered `(recipient, text)` pair, in order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts delivered to one recipient.
    pub fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(r, _)| r == recipient)
            .map(|(_, text)| text)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingSink {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        if self.unreachable.lock().unwrap().contains(recipient) {
            return Err(NotifyError::Delivery {
                recipient: recipient.to_string(),
                message: "recipient unreachable".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Summarizers
// ---------------------------------------------------------------------------

pub struct StaticSummarizer(pub &'static str);

impl Summarizer for StaticSummarizer {
    async fn summarize(
        &self,
        _aggregate: &SessionAggregate,
        _language: Language,
    ) -> Result<String, SummarizeError> {
        Ok(self.0.to_string())
    }
}

pub struct FailingSummarizer;

impl Summarizer for FailingSummarizer {
    async fn summarize(
        &self,
        _aggregate: &SessionAggregate,
        _language: Language,
    ) -> Result<String, SummarizeError> {
        Err(SummarizeError::Provider("HTTP 503".to_string()))
    }
}
