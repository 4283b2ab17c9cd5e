//! WhatsApp Cloud API webhook.
//!
//! `GET /webhook` answers the subscription handshake. `POST /webhook`
//! verifies the delivery signature (when an app secret is configured),
//! acknowledges immediately, and hands the message to the coordinator on a
//! background task so slow collaborators never delay the acknowledgement.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use huddle_infra::whatsapp::{SIGNATURE_HEADER, SignatureError, parse_webhook_payload, verify_signature};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::http::error::AppError;
use crate::state::AppState;

/// Query parameters of the subscription handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// GET /webhook - Echo `hub.challenge` when the verify token matches.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, AppError> {
    let token_matches = match (&state.verify_token, &params.verify_token) {
        (Some(expected), Some(given)) => expected.expose_secret() == given,
        _ => false,
    };

    if params.mode.as_deref() == Some("subscribe") && token_matches {
        tracing::info!("webhook verified");
        Ok(params.challenge.unwrap_or_default())
    } else {
        tracing::warn!(mode = ?params.mode, "webhook verification rejected");
        Err(AppError::Forbidden)
    }
}

/// POST /webhook - Receive a message delivery.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if let Some(secret) = &state.app_secret {
        let verified = match headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
            Some(sig) => verify_signature(secret.expose_secret().as_bytes(), &body, sig),
            None => Err(SignatureError::Missing),
        };
        if let Err(e) = verified {
            tracing::warn!(error = %e, "rejected webhook delivery");
            return Err(AppError::Unauthorized(e.to_string()));
        }
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?;

    let Some(message) = parse_webhook_payload(&payload) else {
        tracing::debug!("webhook delivery without a message");
        return Ok(StatusCode::OK);
    };

    let coordinator = Arc::clone(&state.coordinator);
    tokio::spawn(async move {
        let outcome = coordinator.handle(&message).await;
        tracing::debug!(
            message_id = %message.message_id,
            intent = ?outcome.intent,
            delivered = outcome.delivered,
            failed = outcome.failed,
            "message handled"
        );
    });

    Ok(StatusCode::OK)
}
