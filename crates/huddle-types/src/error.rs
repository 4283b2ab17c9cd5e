use thiserror::Error;

/// Errors from repository operations (used by trait definitions in huddle-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from delivering a message through the notification sink.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification sink not configured: {0}")]
    NotConfigured(String),

    #[error("delivery to '{recipient}' failed: {message}")]
    Delivery { recipient: String, message: String },
}

/// Errors from the summarization collaborator.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarizer not configured")]
    NotConfigured,

    #[error("summarizer request failed: {0}")]
    Provider(String),

    #[error("summarizer returned an empty response")]
    EmptyResponse,
}

/// Errors surfacing from the coordinator while handling one message.
///
/// Collaborator failures are degraded inside the coordinator, so only
/// store failures reach this type.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
