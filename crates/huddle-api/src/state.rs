//! Application state wiring the coordinator to its concrete collaborators.
//!
//! The coordinator is generic over its ports; `AppState` pins it to the
//! SQLite store, the WhatsApp client and the OpenAI-compatible summarizer.

use std::sync::Arc;

use chrono::Duration;

use huddle_core::coordinator::Coordinator;
use huddle_core::sweeper::Sweeper;
use huddle_infra::sqlite::pool::DatabasePool;
use huddle_infra::sqlite::session::SqliteSessionRepository;
use huddle_infra::summarizer::OpenAiSummarizer;
use huddle_infra::whatsapp::WhatsAppClient;
use huddle_types::config::HuddleConfig;
use secrecy::{ExposeSecret, SecretString};

pub type ConcreteCoordinator =
    Coordinator<SqliteSessionRepository, WhatsAppClient, OpenAiSummarizer>;

pub type ConcreteSweeper = Sweeper<SqliteSessionRepository>;

/// Shared state for the webhook server and CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ConcreteCoordinator>,
    pub db_pool: DatabasePool,
    /// Token expected in the `GET /webhook` handshake.
    pub verify_token: Option<Arc<SecretString>>,
    /// Key for `X-Hub-Signature-256`; unsigned deliveries are accepted
    /// when unset.
    pub app_secret: Option<Arc<SecretString>>,
    session_lifetime: Duration,
}

impl AppState {
    /// Wire the coordinator over an open pool.
    pub fn new(db_pool: DatabasePool, config: &HuddleConfig) -> anyhow::Result<Self> {
        let session_lifetime = Duration::days(i64::from(config.session.lifetime_days()));

        let repo = SqliteSessionRepository::new(db_pool.clone()).with_lifetime(session_lifetime);
        let sink = WhatsAppClient::from_config(&config.whatsapp)?;
        let summarizer = OpenAiSummarizer::from_config(&config.summarizer)?;

        Ok(Self {
            coordinator: Arc::new(Coordinator::new(repo, sink, summarizer)),
            db_pool,
            verify_token: copy_secret(config.whatsapp.verify_token.as_ref()),
            app_secret: copy_secret(config.whatsapp.app_secret.as_ref()),
            session_lifetime,
        })
    }

    /// A sweeper over its own repository handle on the shared pool.
    pub fn sweeper(&self) -> ConcreteSweeper {
        Sweeper::new(
            SqliteSessionRepository::new(self.db_pool.clone()).with_lifetime(self.session_lifetime),
        )
    }
}

fn copy_secret(secret: Option<&SecretString>) -> Option<Arc<SecretString>> {
    secret.map(|s| Arc::new(SecretString::from(s.expose_secret().to_string())))
}
