//! SQLite session store.
//!
//! Implements `SessionRepository` from `huddle-core`. Integrity rests on
//! the schema: partial unique indexes over active sessions (one per group,
//! unique codes) and conditional `UPDATE ... WHERE status = 'active'`
//! transitions, so exactly one racing caller wins each transition.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use huddle_core::code::generate_code;
use huddle_core::repository::session::SessionRepository;
use huddle_types::error::RepositoryError;
use huddle_types::intent::Language;
use huddle_types::session::{
    ContributionRecord, Participant, Session, SessionAggregate, SessionCreation, SessionStatus,
    retention_window,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::pool::DatabasePool;

/// Insert attempts before a run of code collisions is reported as a conflict.
const MAX_CODE_ATTEMPTS: usize = 5;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
    lifetime: Duration,
}

impl SqliteSessionRepository {
    /// Create a repository whose sessions live for three days.
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            lifetime: Duration::days(3),
        }
    }

    /// Override how long new sessions stay active.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    id: String,
    session_code: String,
    group_id: String,
    creator_id: Option<String>,
    language: String,
    status: String,
    created_at: String,
    expires_at: String,
    closed_at: Option<String>,
    summary: Option<String>,
}

impl SessionRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_code: row.try_get("session_code")?,
            group_id: row.try_get("group_id")?,
            creator_id: row.try_get("creator_id")?,
            language: row.try_get("language")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
            closed_at: row.try_get("closed_at")?,
            summary: row.try_get("summary")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        Ok(Session {
            id: parse_uuid(&self.id, "session id")?,
            session_code: self.session_code,
            group_id: self.group_id,
            creator_id: self.creator_id,
            language: self
                .language
                .parse()
                .map_err(|e: String| RepositoryError::Query(e))?,
            status: self
                .status
                .parse()
                .map_err(|e: String| RepositoryError::Query(e))?,
            created_at: parse_datetime(&self.created_at)?,
            expires_at: parse_datetime(&self.expires_at)?,
            closed_at: self.closed_at.as_deref().map(parse_datetime).transpose()?,
            summary: self.summary,
        })
    }
}

struct ParticipantRow {
    session_id: String,
    user_id: String,
    user_name: Option<String>,
    joined_at: String,
}

impl ParticipantRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            user_id: row.try_get("user_id")?,
            user_name: row.try_get("user_name")?,
            joined_at: row.try_get("joined_at")?,
        })
    }

    fn into_participant(self) -> Result<Participant, RepositoryError> {
        Ok(Participant {
            session_id: parse_uuid(&self.session_id, "session_id")?,
            user_id: self.user_id,
            user_name: self.user_name,
            joined_at: parse_datetime(&self.joined_at)?,
        })
    }
}

struct ContributionRow {
    id: String,
    session_id: String,
    user_id: String,
    user_name: Option<String>,
    amount: Option<f64>,
    commitment_text: Option<String>,
    created_at: String,
}

impl ContributionRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            user_id: row.try_get("user_id")?,
            user_name: row.try_get("user_name")?,
            amount: row.try_get("amount")?,
            commitment_text: row.try_get("commitment_text")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_record(self) -> Result<ContributionRecord, RepositoryError> {
        Ok(ContributionRecord {
            id: parse_uuid(&self.id, "contribution id")?,
            session_id: parse_uuid(&self.session_id, "session_id")?,
            user_id: self.user_id,
            user_name: self.user_name,
            amount: self.amount,
            commitment_text: self.commitment_text,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width so that SQL string comparison is chronological.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn map_session(row: Option<SqliteRow>) -> Result<Option<Session>, RepositoryError> {
    row.map(|row| SessionRow::from_row(&row).map_err(query_err)?.into_session())
        .transpose()
}

// ---------------------------------------------------------------------------
// SessionRepository implementation
// ---------------------------------------------------------------------------

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(
        &self,
        group_id: &str,
        language: Language,
        creator_id: Option<&str>,
        creator_name: Option<&str>,
    ) -> Result<SessionCreation, RepositoryError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let now = Utc::now();
            let expires_at = now.checked_add_signed(self.lifetime).ok_or_else(|| {
                RepositoryError::Query(format!("session lifetime {} out of range", self.lifetime))
            })?;
            let session = Session {
                id: Uuid::now_v7(),
                session_code: generate_code(),
                group_id: group_id.to_string(),
                creator_id: creator_id.map(str::to_string),
                language,
                status: SessionStatus::Active,
                created_at: now,
                expires_at,
                closed_at: None,
                summary: None,
            };

            let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

            let inserted = sqlx::query(
                r#"INSERT INTO sessions (id, session_code, group_id, creator_id, language, status, created_at, expires_at)
                   VALUES (?, ?, ?, ?, ?, 'active', ?, ?)
                   ON CONFLICT DO NOTHING"#,
            )
            .bind(session.id.to_string())
            .bind(&session.session_code)
            .bind(&session.group_id)
            .bind(&session.creator_id)
            .bind(session.language.as_str())
            .bind(format_datetime(&session.created_at))
            .bind(format_datetime(&session.expires_at))
            .execute(&mut *tx)
            .await
            .map_err(query_err)?
            .rows_affected();

            if inserted == 1 {
                if let Some(creator_id) = creator_id {
                    sqlx::query(
                        r#"INSERT INTO participants (session_id, user_id, user_name, joined_at)
                           VALUES (?, ?, ?, ?)
                           ON CONFLICT(session_id, user_id) DO NOTHING"#,
                    )
                    .bind(session.id.to_string())
                    .bind(creator_id)
                    .bind(creator_name)
                    .bind(format_datetime(&now))
                    .execute(&mut *tx)
                    .await
                    .map_err(query_err)?;
                }
                tx.commit().await.map_err(query_err)?;

                info!(
                    session_id = %session.id,
                    code = %session.session_code,
                    group_id,
                    "session created"
                );
                return Ok(SessionCreation::Created(session));
            }

            tx.rollback().await.map_err(query_err)?;

            if let Some(existing) = self.get_active_session_by_group(group_id).await? {
                debug!(session_id = %existing.id, group_id, "active session already exists");
                return Ok(SessionCreation::Existing(existing));
            }

            warn!(attempt, code = %session.session_code, "session code collision, retrying");
        }

        Err(RepositoryError::Conflict(format!(
            "no free session code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    async fn get_active_session_by_group(
        &self,
        group_id: &str,
    ) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE group_id = ? AND status = 'active'")
            .bind(group_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        map_session(row)
    }

    async fn get_session_by_code(&self, code: &str) -> Result<Option<Session>, RepositoryError> {
        let row =
            sqlx::query("SELECT * FROM sessions WHERE session_code = ? AND status = 'active'")
                .bind(code.trim().to_ascii_uppercase())
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(query_err)?;

        map_session(row)
    }

    async fn get_active_session_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT s.* FROM sessions s
               JOIN participants p ON p.session_id = s.id
               WHERE p.user_id = ? AND s.status = 'active'
               ORDER BY s.created_at DESC
               LIMIT 1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        map_session(row)
    }

    async fn add_participant(
        &self,
        session_id: &Uuid,
        user_id: &str,
        user_name: Option<&str>,
    ) -> Result<Option<Participant>, RepositoryError> {
        let participant = Participant {
            session_id: *session_id,
            user_id: user_id.to_string(),
            user_name: user_name.map(str::to_string),
            joined_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"INSERT INTO participants (session_id, user_id, user_name, joined_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(session_id, user_id) DO NOTHING"#,
        )
        .bind(session_id.to_string())
        .bind(user_id)
        .bind(user_name)
        .bind(format_datetime(&participant.joined_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok((result.rows_affected() == 1).then_some(participant))
    }

    async fn remove_participant(
        &self,
        session_id: &Uuid,
        user_id: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM participants WHERE session_id = ? AND user_id = ?")
            .bind(session_id.to_string())
            .bind(user_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_participants(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<Participant>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM participants WHERE session_id = ? ORDER BY joined_at ASC, rowid ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut participants = Vec::with_capacity(rows.len());
        for row in &rows {
            let participant_row = ParticipantRow::from_row(row).map_err(query_err)?;
            participants.push(participant_row.into_participant()?);
        }

        Ok(participants)
    }

    async fn record_contribution(
        &self,
        session_id: &Uuid,
        user_id: &str,
        user_name: Option<&str>,
        amount: Option<f64>,
        commitment_text: Option<&str>,
    ) -> Result<ContributionRecord, RepositoryError> {
        let record = ContributionRecord {
            id: Uuid::now_v7(),
            session_id: *session_id,
            user_id: user_id.to_string(),
            user_name: user_name.map(str::to_string),
            amount,
            commitment_text: commitment_text.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO contributions (id, session_id, user_id, user_name, amount, commitment_text, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(session_id.to_string())
        .bind(&record.user_id)
        .bind(&record.user_name)
        .bind(record.amount)
        .bind(&record.commitment_text)
        .bind(format_datetime(&record.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(record)
    }

    async fn count_contributions(&self, session_id: &Uuid) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM contributions WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let count: i64 = row.try_get("count").map_err(query_err)?;
        Ok(count as u64)
    }

    async fn get_session_with_contributions(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<SessionAggregate>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        let Some(session) = map_session(row)? else {
            return Ok(None);
        };

        let rows = sqlx::query(
            "SELECT * FROM contributions WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut contributions = Vec::with_capacity(rows.len());
        for row in &rows {
            let contribution_row = ContributionRow::from_row(row).map_err(query_err)?;
            contributions.push(contribution_row.into_record()?);
        }

        Ok(Some(SessionAggregate::new(session, contributions)))
    }

    async fn close_session(
        &self,
        group_id: &str,
        summary: Option<&str>,
    ) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query(
            r#"UPDATE sessions
               SET status = 'closed', closed_at = ?, summary = ?
               WHERE group_id = ? AND status = 'active'
               RETURNING *"#,
        )
        .bind(format_datetime(&Utc::now()))
        .bind(summary)
        .bind(group_id)
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_err)?;

        map_session(row)
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE sessions SET status = 'expired' WHERE status = 'active' AND expires_at < ?",
        )
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        let expired = result.rows_affected();
        if expired > 0 {
            info!(count = expired, "sessions expired");
        }
        Ok(expired)
    }

    async fn purge_old(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let cutoff = format_datetime(&(now - retention_window()));
        let result = sqlx::query(
            r#"DELETE FROM sessions
               WHERE status IN ('closed', 'expired')
                 AND ((closed_at IS NOT NULL AND closed_at < ?) OR expires_at < ?)"#,
        )
        .bind(&cutoff)
        .bind(&cutoff)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        let purged = result.rows_affected();
        if purged > 0 {
            info!(count = purged, "old sessions purged");
        }
        Ok(purged)
    }

    async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool.reader).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "database health check failed");
                false
            }
        }
    }
}
