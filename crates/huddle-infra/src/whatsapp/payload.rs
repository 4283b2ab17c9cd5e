//! WhatsApp Cloud API webhook payloads.
//!
//! Only the first message of the first change of the first entry is
//! considered; status callbacks and other deliveries without messages
//! yield `None`.

use huddle_types::message::InboundMessage;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    value: ChangeValue,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<WaMessage>,
    #[serde(default)]
    contacts: Vec<Contact>,
}

#[derive(Debug, Deserialize)]
struct WaMessage {
    id: String,
    from: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    text: Option<TextBody>,
    group_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct Contact {
    profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    name: Option<String>,
}

/// Extract the inbound message from a webhook delivery.
///
/// Non-text messages produce an empty `text`, which the coordinator ignores.
pub fn parse_webhook_payload(body: &serde_json::Value) -> Option<InboundMessage> {
    let payload = match WebhookPayload::deserialize(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "unrecognized webhook payload");
            return None;
        }
    };

    let value = payload
        .entry
        .into_iter()
        .next()?
        .changes
        .into_iter()
        .next()?
        .value;
    let sender_name = value
        .contacts
        .into_iter()
        .next()
        .and_then(|c| c.profile)
        .and_then(|p| p.name)
        .filter(|n| !n.trim().is_empty());
    let message = value.messages.into_iter().next()?;

    if message.kind.as_deref().is_some_and(|k| k != "text") {
        tracing::debug!(kind = ?message.kind, message_id = %message.id, "non-text message");
    }

    Some(InboundMessage {
        message_id: message.id,
        sender_id: message.from,
        text: message.text.map(|t| t.body).unwrap_or_default(),
        sender_name,
        is_group: message.group_id.is_some(),
        group_id: message.group_id,
    })
}
