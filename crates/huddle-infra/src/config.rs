//! Configuration loader for Huddle.
//!
//! Reads `config.toml` from the data directory (`~/.huddle/` by default) and
//! deserializes it into [`HuddleConfig`], falling back to defaults when the
//! file is missing or malformed. Environment variables then override
//! individual settings; secrets normally arrive that way.

use std::path::{Path, PathBuf};

use huddle_types::config::{HuddleConfig, MAX_EXPIRY_DAYS};
use secrecy::SecretString;

use crate::sqlite::pool::default_database_url;

/// Resolve the data directory: `HUDDLE_DATA_DIR`, else `~/.huddle`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HUDDLE_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".huddle")
}

/// Load `{data_dir}/config.toml` and apply environment overrides.
pub async fn load_config(data_dir: &Path) -> HuddleConfig {
    let mut config = load_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Load `{data_dir}/config.toml` without consulting the environment.
pub async fn load_config_file(data_dir: &Path) -> HuddleConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return HuddleConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return HuddleConfig::default();
        }
    };

    match toml::from_str::<HuddleConfig>(&content) {
        Ok(mut config) => {
            clamp_session_lifetime(&mut config);
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            HuddleConfig::default()
        }
    }
}

/// Apply environment overrides read through `lookup`.
///
/// Empty values are ignored. Unparseable numbers are logged and ignored.
pub fn apply_env_overrides(config: &mut HuddleConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let secret = |key: &str| get(key).map(SecretString::from);

    if let Some(port) = get("PORT") {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!(value = %port, "ignoring invalid PORT"),
        }
    }
    if let Some(url) = get("DATABASE_URL") {
        config.database.url = Some(url);
    }

    if let Some(token) = secret("WHATSAPP_VERIFY_TOKEN") {
        config.whatsapp.verify_token = Some(token);
    }
    if let Some(token) = secret("WHATSAPP_ACCESS_TOKEN") {
        config.whatsapp.access_token = Some(token);
    }
    if let Some(app_secret) = secret("WHATSAPP_APP_SECRET") {
        config.whatsapp.app_secret = Some(app_secret);
    }
    if let Some(id) = get("WHATSAPP_PHONE_NUMBER_ID") {
        config.whatsapp.phone_number_id = Some(id);
    }
    if let Some(version) = get("WHATSAPP_API_VERSION") {
        config.whatsapp.api_version = version;
    }

    if let Some(key) = secret("OPENAI_API_KEY") {
        config.summarizer.api_key = Some(key);
    }
    if let Some(model) = get("OPENAI_MODEL") {
        config.summarizer.model = model;
    }

    if let Some(days) = get("SESSION_EXPIRY_DAYS") {
        match days.trim().parse::<u32>() {
            Ok(days) if (1..=MAX_EXPIRY_DAYS).contains(&days) => config.session.expiry_days = days,
            _ => tracing::warn!(value = %days, "ignoring invalid SESSION_EXPIRY_DAYS"),
        }
    }
    if let Some(schedule) = get("CLEANUP_CRON") {
        config.session.cleanup_schedule = schedule;
    }
}

/// Pull `session.expiry_days` into `1..=MAX_EXPIRY_DAYS`.
fn clamp_session_lifetime(config: &mut HuddleConfig) {
    let days = config.session.lifetime_days();
    if days != config.session.expiry_days {
        tracing::warn!(
            configured = config.session.expiry_days,
            using = days,
            "session.expiry_days out of range"
        );
        config.session.expiry_days = days;
    }
}

/// The configured database URL, or the default file in `data_dir`.
pub fn database_url(config: &HuddleConfig, data_dir: &Path) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}
