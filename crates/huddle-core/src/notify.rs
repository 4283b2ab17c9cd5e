//! Outbound notification port and participant fan-out.

use huddle_types::error::NotifyError;
use huddle_types::session::Participant;
use tracing::warn;

/// Delivers text to a recipient on the messaging channel.
///
/// Implementations live in huddle-infra (e.g., `WhatsAppClient`).
pub trait NotificationSink: Send + Sync {
    /// Send `text` to `recipient`.
    fn send(
        &self,
        recipient: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// Best-effort broadcast to every participant except `exclude`.
///
/// Delivery is sequential. A failure for one participant is logged and does
/// not stop the rest. Returns the number of successful deliveries.
pub async fn fan_out<N: NotificationSink>(
    sink: &N,
    participants: &[Participant],
    exclude: Option<&str>,
    text: &str,
) -> usize {
    let mut delivered = 0;
    for participant in participants {
        if exclude == Some(participant.user_id.as_str()) {
            continue;
        }
        match sink.send(&participant.user_id, text).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(
                    session_id = %participant.session_id,
                    recipient = %participant.user_id,
                    error = %e,
                    "fan-out delivery failed"
                );
            }
        }
    }
    delivered
}
