//! SessionRepository trait definition.
//!
//! The session store exclusively owns persistence and transactional
//! integrity for sessions, participants, and contribution records. All
//! race safety lives here: create-if-absent relies on the store's
//! uniqueness constraint over active sessions per group, and close/expire
//! are conditional updates guarded by `status = 'active'`.

use chrono::{DateTime, Utc};
use huddle_types::error::RepositoryError;
use huddle_types::intent::Language;
use huddle_types::session::{
    ContributionRecord, Participant, Session, SessionAggregate, SessionCreation,
};
use uuid::Uuid;

/// Repository trait for session persistence.
///
/// Implementations live in huddle-infra (e.g., `SqliteSessionRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait SessionRepository: Send + Sync {
    /// Create an active session for `group_id` unless one already exists.
    ///
    /// On a uniqueness conflict against the group's active session nothing
    /// is inserted and the existing session is returned as
    /// [`SessionCreation::Existing`]. When `creator_id` is given it is
    /// registered as the first participant.
    fn create_session(
        &self,
        group_id: &str,
        language: Language,
        creator_id: Option<&str>,
        creator_name: Option<&str>,
    ) -> impl std::future::Future<Output = Result<SessionCreation, RepositoryError>> + Send;

    /// The active session for a group, if any.
    fn get_active_session_by_group(
        &self,
        group_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// Look up an active session by code. Case-insensitive.
    fn get_session_by_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// The active session `user_id` participates in, if any.
    fn get_active_session_by_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// Register a participant. Returns `None` when the pair already exists.
    fn add_participant(
        &self,
        session_id: &Uuid,
        user_id: &str,
        user_name: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Option<Participant>, RepositoryError>> + Send;

    /// Remove a participant. Returns whether a row was removed.
    fn remove_participant(
        &self,
        session_id: &Uuid,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Participants of a session, ordered by join time.
    fn list_participants(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Participant>, RepositoryError>> + Send;

    /// Append a contribution record.
    fn record_contribution(
        &self,
        session_id: &Uuid,
        user_id: &str,
        user_name: Option<&str>,
        amount: Option<f64>,
        commitment_text: Option<&str>,
    ) -> impl std::future::Future<Output = Result<ContributionRecord, RepositoryError>> + Send;

    /// Number of contribution records in a session.
    fn count_contributions(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// A session together with its contributions and pledged total.
    fn get_session_with_contributions(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<SessionAggregate>, RepositoryError>> + Send;

    /// Close the group's active session. Exactly one concurrent caller
    /// observes `Some`; the rest observe `None`.
    fn close_session(
        &self,
        group_id: &str,
        summary: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// Transition every active session whose `expires_at` is before `now`
    /// to expired. Returns the number of sessions transitioned.
    fn expire_stale(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Delete closed/expired sessions older than the retention window,
    /// cascading to participants and contributions. Returns sessions deleted.
    fn purge_old(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Cheap connectivity probe.
    fn health_check(&self) -> impl std::future::Future<Output = bool> + Send;
}
