//! Configuration types for Huddle.
//!
//! `HuddleConfig` represents the `config.toml` in the data directory. Every
//! field has a sensible default, so an empty file (or no file) is valid;
//! secrets are usually supplied through environment variables instead.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Top-level configuration for the Huddle service.
#[derive(Debug, Default, Deserialize)]
pub struct HuddleConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl HuddleConfig {
    /// Names of required settings that are still unset.
    ///
    /// The service starts without them, but the corresponding collaborator
    /// (message delivery, summarization) will not work.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.whatsapp.verify_token.is_none() {
            missing.push("WHATSAPP_VERIFY_TOKEN");
        }
        if self.whatsapp.access_token.is_none() {
            missing.push("WHATSAPP_ACCESS_TOKEN");
        }
        if self.whatsapp.phone_number_id.is_none() {
            missing.push("WHATSAPP_PHONE_NUMBER_ID");
        }
        if self.summarizer.api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        missing
    }
}

/// HTTP listener settings.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database location. `None` means `{data_dir}/huddle.db`.
#[derive(Debug, Default, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

/// WhatsApp Cloud API credentials.
#[derive(Debug, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub verify_token: Option<SecretString>,

    #[serde(default, deserialize_with = "deserialize_secret")]
    pub access_token: Option<SecretString>,

    pub phone_number_id: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// App secret used to verify `X-Hub-Signature-256` on webhook deliveries.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub app_secret: Option<SecretString>,
}

fn default_api_version() -> String {
    "v24.0".to_string()
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: None,
            access_token: None,
            phone_number_id: None,
            api_version: default_api_version(),
            app_secret: None,
        }
    }
}

/// OpenAI-compatible summarization endpoint.
#[derive(Debug, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Session lifetime and cleanup cadence.
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Days until an active session expires.
    #[serde(default = "default_expiry_days")]
    pub expiry_days: u32,

    /// Cron expression (or "every N hours" style) for the expiry sweeper.
    #[serde(default = "default_cleanup_schedule")]
    pub cleanup_schedule: String,
}

fn default_expiry_days() -> u32 {
    3
}

/// Upper bound on `expiry_days`.
pub const MAX_EXPIRY_DAYS: u32 = 365;

impl SessionConfig {
    /// `expiry_days` clamped to `1..=MAX_EXPIRY_DAYS`.
    pub fn lifetime_days(&self) -> u32 {
        self.expiry_days.clamp(1, MAX_EXPIRY_DAYS)
    }
}

fn default_cleanup_schedule() -> String {
    "0 */6 * * *".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry_days: default_expiry_days(),
            cleanup_schedule: default_cleanup_schedule(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !v.is_empty())
        .map(SecretString::from))
}
