//! Normalized inbound message record.

use serde::{Deserialize, Serialize};

/// One message received from the messaging channel, already normalized by
/// the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel-assigned message id, used to correlate log lines.
    pub message_id: String,
    pub sender_id: String,
    pub text: String,
    pub sender_name: Option<String>,
    pub is_group: bool,
    pub group_id: Option<String>,
}

impl InboundMessage {
    /// The chat this message belongs to: the group when there is one,
    /// otherwise the sender's direct chat.
    pub fn chat_id(&self) -> &str {
        match (&self.group_id, self.is_group) {
            (Some(group_id), true) => group_id,
            _ => &self.sender_id,
        }
    }

    /// Live display name of the sender, falling back to the sender id.
    pub fn display_name(&self) -> &str {
        self.sender_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.sender_id)
    }
}
