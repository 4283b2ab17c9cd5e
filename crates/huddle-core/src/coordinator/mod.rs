//! Session coordinator: the state machine driving a huddle.
//!
//! `Coordinator` turns one classified inbound message into store operations
//! and outbound replies. Replies go to the chat the message came from; fan-out
//! notices go to each participant individually and are best-effort.
//!
//! Generic over the session store, notification sink, and summarizer so that
//! huddle-core never depends on huddle-infra.

pub mod templates;

use huddle_types::error::CoordinatorError;
use huddle_types::intent::{Intent, Language};
use huddle_types::message::InboundMessage;
use huddle_types::session::{Session, SessionCreation};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::classifier::{classify, detect_language};
use crate::notify::{NotificationSink, fan_out};
use crate::repository::session::SessionRepository;
use crate::summarize::Summarizer;

pub use templates::{Reply, render};

/// What handling one inbound message amounted to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    /// Name of the classified intent, `None` for unclassified messages.
    pub intent: Option<&'static str>,
    /// Successful outbound deliveries (replies plus fan-out notices).
    pub delivered: usize,
    /// Whether handling failed and the generic error reply was sent.
    pub failed: bool,
}

/// The session an actor is acting on.
struct ActorSession {
    session: Session,
    /// Whether the actor is a registered participant, as opposed to merely
    /// writing in a group that has an active session.
    member: bool,
}

/// Orchestrates the session lifecycle for inbound messages.
pub struct Coordinator<R: SessionRepository, N: NotificationSink, S: Summarizer> {
    repo: R,
    sink: N,
    summarizer: S,
}

impl<R: SessionRepository, N: NotificationSink, S: Summarizer> Coordinator<R, N, S> {
    pub fn new(repo: R, sink: N, summarizer: S) -> Self {
        Self {
            repo,
            sink,
            summarizer,
        }
    }

    /// Access the session repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Access the notification sink.
    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Handle one inbound message.
    ///
    /// Never fails: store errors are logged with the message context and
    /// answered with the generic error reply.
    pub async fn handle(&self, msg: &InboundMessage) -> Outcome {
        let span = info_span!(
            "handle_message",
            message_id = %msg.message_id,
            sender = %msg.sender_id,
            chat = %msg.chat_id(),
        );

        async move {
            if msg.text.trim().is_empty() {
                debug!("ignoring empty message");
                return Outcome::default();
            }

            let intent = classify(&msg.text);
            let name = intent.as_ref().map(Intent::name);
            let detected = detect_language(&msg.text);

            match self.dispatch(msg, intent, detected).await {
                Ok(delivered) => Outcome {
                    intent: name,
                    delivered,
                    failed: false,
                },
                Err(e) => {
                    error!(intent = name.unwrap_or("none"), error = %e, "failed to handle message");
                    let delivered = self
                        .reply(msg.chat_id(), render(detected, &Reply::Error))
                        .await;
                    Outcome {
                        intent: name,
                        delivered,
                        failed: true,
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        msg: &InboundMessage,
        intent: Option<Intent>,
        detected: Language,
    ) -> Result<usize, CoordinatorError> {
        let Some(intent) = intent else {
            return self.handle_unclassified(msg, detected).await;
        };
        info!(intent = intent.name(), language = %detected, "processing trigger");

        match intent {
            Intent::Start => self.handle_start(msg, detected).await,
            Intent::Join { code } => self.handle_join(msg, &code, detected).await,
            Intent::Contribute { amount, .. } => {
                self.handle_contribution(msg, Some(amount), None, detected)
                    .await
            }
            Intent::Commit { text } => {
                self.handle_contribution(msg, None, Some(text.as_str()), detected)
                    .await
            }
            Intent::Summarize => self.handle_summarize(msg, detected).await,
            Intent::Close => self.handle_close(msg, detected).await,
            Intent::MySession => self.handle_my_session(msg, detected).await,
            Intent::Leave => self.handle_leave(msg, detected).await,
        }
    }

    // -----------------------------------------------------------------------
    // Intent handlers
    // -----------------------------------------------------------------------

    async fn handle_start(
        &self,
        msg: &InboundMessage,
        detected: Language,
    ) -> Result<usize, CoordinatorError> {
        let chat = msg.chat_id();

        if let Some(actor) = self.actor_session(msg).await? {
            let lang = reply_language(detected, Some(&actor.session));
            let reply = Reply::SessionExists {
                code: &actor.session.session_code,
            };
            return Ok(self.reply(chat, render(lang, &reply)).await);
        }

        let creation = self
            .repo
            .create_session(
                chat,
                detected,
                Some(msg.sender_id.as_str()),
                Some(msg.display_name()),
            )
            .await?;

        let text = match &creation {
            SessionCreation::Created(session) => {
                info!(
                    session_id = %session.id,
                    code = %session.session_code,
                    language = %session.language,
                    "session started"
                );
                render(
                    session.language,
                    &Reply::SessionStarted {
                        code: &session.session_code,
                    },
                )
            }
            SessionCreation::Existing(session) => {
                debug!(session_id = %session.id, "lost create race, session already active");
                render(
                    reply_language(detected, Some(session)),
                    &Reply::SessionExists {
                        code: &session.session_code,
                    },
                )
            }
        };

        Ok(self.reply(chat, text).await)
    }

    async fn handle_join(
        &self,
        msg: &InboundMessage,
        code: &str,
        detected: Language,
    ) -> Result<usize, CoordinatorError> {
        let chat = msg.chat_id();

        if let Some(current) = self.repo.get_active_session_by_user(&msg.sender_id).await? {
            let lang = reply_language(detected, Some(&current));
            let reply = Reply::AlreadyJoined {
                code: &current.session_code,
            };
            return Ok(self.reply(chat, render(lang, &reply)).await);
        }

        let Some(session) = self.repo.get_session_by_code(code).await? else {
            debug!(code, "join with unknown code");
            return Ok(self
                .reply(chat, render(detected, &Reply::InvalidCode { code }))
                .await);
        };

        self.repo
            .add_participant(&session.id, &msg.sender_id, Some(msg.display_name()))
            .await?;
        let participants = self.repo.list_participants(&session.id).await?;
        info!(
            session_id = %session.id,
            participants = participants.len(),
            "participant joined"
        );

        let lang = reply_language(detected, Some(&session));
        let reply = Reply::Joined {
            code: &session.session_code,
            participants: participants.len(),
        };
        let mut delivered = self.reply(chat, render(lang, &reply)).await;

        let notice = render(
            session.language,
            &Reply::JoinNotice {
                name: msg.display_name(),
                participants: participants.len(),
            },
        );
        delivered += fan_out(&self.sink, &participants, Some(&msg.sender_id), &notice).await;

        Ok(delivered)
    }

    async fn handle_contribution(
        &self,
        msg: &InboundMessage,
        amount: Option<f64>,
        commitment: Option<&str>,
        detected: Language,
    ) -> Result<usize, CoordinatorError> {
        let chat = msg.chat_id();

        let Some(actor) = self.actor_session(msg).await? else {
            return Ok(self.reply(chat, render(detected, &Reply::NoSession)).await);
        };
        let session = actor.session;

        if !actor.member {
            self.repo
                .add_participant(&session.id, &msg.sender_id, Some(msg.display_name()))
                .await?;
        }

        let record = self
            .repo
            .record_contribution(
                &session.id,
                &msg.sender_id,
                Some(msg.display_name()),
                amount,
                commitment,
            )
            .await?;
        info!(
            session_id = %session.id,
            record_id = %record.id,
            pledge = record.amount.is_some(),
            "contribution recorded"
        );

        let name = msg.display_name();
        let reply = match (amount, commitment) {
            (Some(amount), _) => Reply::ContributionLogged { name, amount },
            (None, text) => Reply::TaskLogged {
                name,
                text: text.unwrap_or_default(),
            },
        };

        let lang = reply_language(detected, Some(&session));
        let mut delivered = self.reply(chat, render(lang, &reply)).await;

        let participants = self.repo.list_participants(&session.id).await?;
        let notice = render(session.language, &reply);
        delivered += fan_out(&self.sink, &participants, Some(&msg.sender_id), &notice).await;

        Ok(delivered)
    }

    async fn handle_summarize(
        &self,
        msg: &InboundMessage,
        detected: Language,
    ) -> Result<usize, CoordinatorError> {
        let chat = msg.chat_id();

        let Some(actor) = self.actor_session(msg).await? else {
            return Ok(self.reply(chat, render(detected, &Reply::NoSession)).await);
        };
        let Some(aggregate) = self
            .repo
            .get_session_with_contributions(&actor.session.id)
            .await?
        else {
            return Ok(self.reply(chat, render(detected, &Reply::NoSession)).await);
        };

        let lang = reply_language(detected, Some(&actor.session));
        let text = match self.summarizer.summarize(&aggregate, lang).await {
            Ok(summary) if !summary.trim().is_empty() => {
                render(lang, &Reply::Summary { text: summary.trim() })
            }
            Ok(_) => {
                warn!(session_id = %actor.session.id, "summarizer returned empty text");
                render(lang, &Reply::SummaryUnavailable)
            }
            Err(e) => {
                warn!(session_id = %actor.session.id, error = %e, "summary unavailable");
                render(lang, &Reply::SummaryUnavailable)
            }
        };

        Ok(self.reply(chat, text).await)
    }

    async fn handle_close(
        &self,
        msg: &InboundMessage,
        detected: Language,
    ) -> Result<usize, CoordinatorError> {
        let chat = msg.chat_id();

        let Some(actor) = self.actor_session(msg).await? else {
            return Ok(self.reply(chat, render(detected, &Reply::NoSession)).await);
        };
        let session = actor.session;

        // Read everything needed for the broadcast before the close; the
        // session stops being active the moment the update lands.
        let participants = self.repo.list_participants(&session.id).await?;
        let summary = match self.repo.get_session_with_contributions(&session.id).await? {
            Some(aggregate) => match self.summarizer.summarize(&aggregate, session.language).await
            {
                Ok(summary) if !summary.trim().is_empty() => Some(summary.trim().to_string()),
                Ok(_) => None,
                Err(e) => {
                    warn!(session_id = %session.id, error = %e, "closing without final summary");
                    None
                }
            },
            None => None,
        };

        let Some(closed) = self
            .repo
            .close_session(&session.group_id, summary.as_deref())
            .await?
        else {
            debug!(session_id = %session.id, "session already closed");
            return Ok(self.reply(chat, render(detected, &Reply::NoSession)).await);
        };
        info!(
            session_id = %closed.id,
            participants = participants.len(),
            summarized = summary.is_some(),
            "session closed"
        );

        let text = render(
            closed.language,
            &Reply::SessionClosed {
                summary: summary.as_deref(),
            },
        );
        let mut delivered = fan_out(&self.sink, &participants, None, &text).await;
        if !participants.iter().any(|p| p.user_id == chat) {
            delivered += self.reply(chat, text).await;
        }

        Ok(delivered)
    }

    async fn handle_my_session(
        &self,
        msg: &InboundMessage,
        detected: Language,
    ) -> Result<usize, CoordinatorError> {
        let chat = msg.chat_id();

        let Some(actor) = self.actor_session(msg).await? else {
            return Ok(self.reply(chat, render(detected, &Reply::NotInSession)).await);
        };
        let session = actor.session;
        let participants = self.repo.list_participants(&session.id).await?;
        let contributions = self.repo.count_contributions(&session.id).await?;

        let reply = Reply::Status {
            code: &session.session_code,
            participants: participants.len(),
            contributions,
        };
        let lang = reply_language(detected, Some(&session));
        Ok(self.reply(chat, render(lang, &reply)).await)
    }

    async fn handle_leave(
        &self,
        msg: &InboundMessage,
        detected: Language,
    ) -> Result<usize, CoordinatorError> {
        let chat = msg.chat_id();

        let Some(session) = self.repo.get_active_session_by_user(&msg.sender_id).await? else {
            return Ok(self.reply(chat, render(detected, &Reply::NotInSession)).await);
        };
        if !self
            .repo
            .remove_participant(&session.id, &msg.sender_id)
            .await?
        {
            return Ok(self.reply(chat, render(detected, &Reply::NotInSession)).await);
        }
        info!(session_id = %session.id, "participant left");

        let lang = reply_language(detected, Some(&session));
        let reply = Reply::Left {
            code: &session.session_code,
        };
        Ok(self.reply(chat, render(lang, &reply)).await)
    }

    async fn handle_unclassified(
        &self,
        msg: &InboundMessage,
        detected: Language,
    ) -> Result<usize, CoordinatorError> {
        if self.actor_session(msg).await?.is_some() {
            debug!("unclassified chatter inside a session");
            return Ok(0);
        }
        Ok(self
            .reply(msg.chat_id(), render(detected, &Reply::Intro))
            .await)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Resolve the session the sender acts on: their own membership first,
    /// then the active session of the group they are writing in.
    async fn actor_session(
        &self,
        msg: &InboundMessage,
    ) -> Result<Option<ActorSession>, CoordinatorError> {
        if let Some(session) = self.repo.get_active_session_by_user(&msg.sender_id).await? {
            return Ok(Some(ActorSession {
                session,
                member: true,
            }));
        }

        if let (true, Some(group_id)) = (msg.is_group, msg.group_id.as_deref()) {
            if let Some(session) = self.repo.get_active_session_by_group(group_id).await? {
                return Ok(Some(ActorSession {
                    session,
                    member: false,
                }));
            }
        }

        Ok(None)
    }

    /// Send a direct reply. Returns 1 on delivery, 0 on failure.
    async fn reply(&self, recipient: &str, text: String) -> usize {
        match self.sink.send(recipient, &text).await {
            Ok(()) => 1,
            Err(e) => {
                warn!(recipient, error = %e, "reply delivery failed");
                0
            }
        }
    }
}

/// Swahili input always gets a Swahili reply; otherwise the session's
/// language wins over the detected one.
fn reply_language(detected: Language, session: Option<&Session>) -> Language {
    match (detected, session) {
        (Language::Sw, _) => Language::Sw,
        (_, Some(session)) => session.language,
        (detected, None) => detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSummarizer, InMemoryRepository, RecordingSink, StaticSummarizer};
    use huddle_types::session::SessionStatus;
    use std::sync::Arc;

    const GROUP: &str = "120363000000000001@g.us";

    fn group_msg(sender: &str, name: &str, text: &str) -> InboundMessage {
        InboundMessage {
            message_id: format!("wamid.{sender}.{}", text.len()),
            sender_id: sender.to_string(),
            text: text.to_string(),
            sender_name: Some(name.to_string()),
            is_group: true,
            group_id: Some(GROUP.to_string()),
        }
    }

    fn direct_msg(sender: &str, name: &str, text: &str) -> InboundMessage {
        InboundMessage {
            message_id: format!("wamid.{sender}.{}", text.len()),
            sender_id: sender.to_string(),
            text: text.to_string(),
            sender_name: Some(name.to_string()),
            is_group: false,
            group_id: None,
        }
    }

    fn coordinator() -> Coordinator<InMemoryRepository, RecordingSink, StaticSummarizer> {
        Coordinator::new(
            InMemoryRepository::new(),
            RecordingSink::new(),
            StaticSummarizer("Amina pledged 5000 TZS."),
        )
    }

    fn active_code<N: NotificationSink, S: Summarizer>(
        c: &Coordinator<InMemoryRepository, N, S>,
    ) -> String {
        c.repo()
            .sessions()
            .into_iter()
            .find(|s| s.is_active())
            .map(|s| s.session_code)
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_then_contribute_then_close_in_group() {
        let c = coordinator();

        let outcome = c.handle(&group_msg("A", "Amina", "start huddle")).await;
        assert_eq!(outcome.intent, Some("start"));
        assert_eq!(outcome.delivered, 1);
        let code = active_code(&c);
        let started = c.sink().sent_to(GROUP);
        assert_eq!(started.len(), 1);
        assert!(started[0].contains(&code));

        c.handle(&group_msg("A", "Amina", "5000 TZS")).await;
        let contributions = c.repo().contributions();
        assert_eq!(contributions.len(), 1);
        assert_eq!(contributions[0].amount, Some(5000.0));
        assert_eq!(contributions[0].user_name.as_deref(), Some("Amina"));
        assert!(c.sink().sent_to(GROUP).contains(&"✅ Amina: 5000 TZS logged.".to_string()));

        c.sink().clear();
        let outcome = c.handle(&group_msg("A", "Amina", "close")).await;
        assert_eq!(outcome.intent, Some("close"));
        assert!(!outcome.failed);

        let sessions = c.repo().sessions();
        assert_eq!(sessions[0].status, SessionStatus::Closed);
        assert_eq!(
            sessions[0].summary.as_deref(),
            Some("Amina pledged 5000 TZS.")
        );

        // Amina is a participant, and the group chat is not, so both get it.
        let to_amina = c.sink().sent_to("A");
        assert_eq!(to_amina.len(), 1);
        assert!(to_amina[0].contains("Amina pledged 5000 TZS."));
        assert!(to_amina[0].contains("🔴 Huddle closed."));
        assert_eq!(c.sink().sent_to(GROUP), to_amina);
    }

    #[tokio::test]
    async fn test_second_start_reports_existing_session() {
        let c = coordinator();
        c.handle(&group_msg("A", "Amina", "start huddle")).await;
        let code = active_code(&c);

        c.handle(&group_msg("B", "Baraka", "start huddle")).await;

        assert_eq!(c.repo().sessions().len(), 1);
        let replies = c.sink().sent_to(GROUP);
        assert_eq!(replies.len(), 2);
        assert!(replies[1].starts_with("⚡"));
        assert!(replies[1].contains(&code));
    }

    #[tokio::test]
    async fn test_concurrent_starts_create_one_session() {
        let c = Arc::new(coordinator());

        let handles: Vec<_> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|sender| {
                let c = Arc::clone(&c);
                tokio::spawn(async move {
                    c.handle(&group_msg(sender, sender, "start huddle")).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(c.repo().sessions().len(), 1);
        let replies = c.sink().sent_to(GROUP);
        assert_eq!(replies.len(), 4);
        assert_eq!(replies.iter().filter(|r| r.starts_with("🟢")).count(), 1);
        assert_eq!(replies.iter().filter(|r| r.starts_with("⚡")).count(), 3);
    }

    #[tokio::test]
    async fn test_swahili_trigger_gets_swahili_reply_and_session_language() {
        let c = coordinator();

        c.handle(&group_msg("A", "Amina", "anza huddle")).await;

        let session = &c.repo().sessions()[0];
        assert_eq!(session.language, Language::Sw);
        let replies = c.sink().sent_to(GROUP);
        assert!(replies[0].starts_with("🟢 Huddle imeanza!"));
    }

    #[tokio::test]
    async fn test_close_without_session_replies_no_session() {
        let c = coordinator();

        let outcome = c.handle(&group_msg("A", "Amina", "close")).await;

        assert_eq!(outcome.intent, Some("close"));
        let replies = c.sink().sent_to(GROUP);
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("❌ No active Huddle."));
        assert!(c.repo().sessions().is_empty());
    }

    #[tokio::test]
    async fn test_close_with_failing_summarizer_still_closes() {
        let c = Coordinator::new(
            InMemoryRepository::new(),
            RecordingSink::new(),
            FailingSummarizer,
        );
        c.handle(&group_msg("A", "Amina", "start huddle")).await;
        c.handle(&group_msg("A", "Amina", "I will bring chairs")).await;
        c.sink().clear();

        let outcome = c.handle(&group_msg("A", "Amina", "close")).await;

        assert!(!outcome.failed);
        let session = &c.repo().sessions()[0];
        assert_eq!(session.status, SessionStatus::Closed);
        assert_eq!(session.summary, None);
        let to_amina = c.sink().sent_to("A");
        assert_eq!(to_amina.len(), 1);
        assert!(to_amina[0].starts_with("🔴 Huddle closed."));
    }

    #[tokio::test]
    async fn test_second_close_observes_no_session() {
        let c = coordinator();
        c.handle(&group_msg("A", "Amina", "start huddle")).await;
        c.handle(&group_msg("A", "Amina", "close")).await;
        c.sink().clear();

        c.handle(&group_msg("B", "Baraka", "close")).await;

        assert!(c.sink().sent_to("A").is_empty());
        let replies = c.sink().sent_to(GROUP);
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("❌"));
    }

    #[tokio::test]
    async fn test_join_by_code_and_fan_out() {
        let c = coordinator();
        c.handle(&direct_msg("A", "Amina", "start huddle")).await;
        let code = active_code(&c);
        c.sink().clear();

        let outcome = c
            .handle(&direct_msg("B", "Baraka", &format!("join {code}")))
            .await;

        assert_eq!(outcome.intent, Some("join"));
        assert_eq!(outcome.delivered, 2);
        let to_baraka = c.sink().sent_to("B");
        assert_eq!(to_baraka.len(), 1);
        assert!(to_baraka[0].contains("2 participants"));
        let to_amina = c.sink().sent_to("A");
        assert_eq!(to_amina, vec!["👋 Baraka joined the Huddle. 2 participants now."]);

        c.sink().clear();
        c.handle(&direct_msg("B", "Baraka", "5k")).await;
        assert_eq!(c.sink().sent_to("A"), vec!["✅ Baraka: 5000 TZS logged."]);
        assert_eq!(c.sink().sent_to("B"), vec!["✅ Baraka: 5000 TZS logged."]);
    }

    #[tokio::test]
    async fn test_join_with_unknown_code() {
        let c = coordinator();

        c.handle(&direct_msg("B", "Baraka", "join HUD-ZZZZZZ")).await;

        let replies = c.sink().sent_to("B");
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("HUD-ZZZZZZ"));
        assert!(replies[0].starts_with("❌"));
    }

    #[tokio::test]
    async fn test_join_while_already_in_session() {
        let c = coordinator();
        c.handle(&direct_msg("A", "Amina", "start huddle")).await;
        let first = active_code(&c);
        c.handle(&direct_msg("B", "Baraka", "start huddle")).await;
        let second = c
            .repo()
            .sessions()
            .into_iter()
            .find(|s| s.group_id == "B")
            .map(|s| s.session_code)
            .unwrap();
        c.sink().clear();

        c.handle(&direct_msg("A", "Amina", &format!("join {second}")))
            .await;

        let replies = c.sink().sent_to("A");
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains(&first));
        assert!(c.sink().sent_to("B").is_empty());
    }

    #[tokio::test]
    async fn test_contribution_without_session() {
        let c = coordinator();

        let outcome = c.handle(&direct_msg("A", "Amina", "5000 TZS")).await;

        assert_eq!(outcome.intent, Some("contribute"));
        assert!(c.repo().contributions().is_empty());
        assert!(c.sink().sent_to("A")[0].starts_with("❌ No active Huddle."));
    }

    #[tokio::test]
    async fn test_group_member_contributing_is_added_as_participant() {
        let c = coordinator();
        c.handle(&group_msg("A", "Amina", "start huddle")).await;

        c.handle(&group_msg("B", "Baraka", "I will bring water")).await;
        c.handle(&group_msg("B", "Baraka", "2000")).await;

        let session = &c.repo().sessions()[0];
        let participants = c.repo().list_participants(&session.id).await.unwrap();
        assert_eq!(participants.len(), 2);
        assert_eq!(c.repo().contributions().len(), 2);
        assert!(
            c.sink()
                .sent_to("A")
                .contains(&"📌 Baraka committed: \"I will bring water\"".to_string())
        );
    }

    #[tokio::test]
    async fn test_summary_reply_and_unavailable_fallback() {
        let c = coordinator();
        c.handle(&group_msg("A", "Amina", "start huddle")).await;
        c.sink().clear();

        c.handle(&group_msg("A", "Amina", "summary")).await;
        assert_eq!(
            c.sink().sent_to(GROUP),
            vec!["📊 *Huddle Summary*\n\nAmina pledged 5000 TZS."]
        );

        let failing = Coordinator::new(
            InMemoryRepository::new(),
            RecordingSink::new(),
            FailingSummarizer,
        );
        failing.handle(&group_msg("A", "Amina", "start huddle")).await;
        failing.sink().clear();
        failing.handle(&group_msg("A", "Amina", "summary")).await;
        let replies = failing.sink().sent_to(GROUP);
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("isn't available"));
        assert_eq!(failing.repo().sessions()[0].status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_my_session_and_leave() {
        let c = coordinator();
        c.handle(&direct_msg("A", "Amina", "start huddle")).await;
        let code = active_code(&c);
        c.handle(&direct_msg("A", "Amina", "300")).await;
        c.sink().clear();

        c.handle(&direct_msg("A", "Amina", "my huddle")).await;
        let status = c.sink().sent_to("A");
        assert_eq!(
            status,
            vec![format!(
                "📋 Huddle *{code}*: 1 participants, 1 contributions logged."
            )]
        );

        c.sink().clear();
        c.handle(&direct_msg("A", "Amina", "leave huddle")).await;
        assert_eq!(c.sink().sent_to("A"), vec![format!("👋 You left Huddle *{code}*.")]);

        c.sink().clear();
        c.handle(&direct_msg("A", "Amina", "leave huddle")).await;
        assert_eq!(c.sink().sent_to("A"), vec!["❌ You're not in any Huddle."]);
    }

    #[tokio::test]
    async fn test_unclassified_message_handling() {
        let c = coordinator();

        c.handle(&direct_msg("A", "Amina", "hello there")).await;
        let intro = c.sink().sent_to("A");
        assert_eq!(intro.len(), 1);
        assert!(intro[0].contains("start huddle"));

        c.handle(&direct_msg("A", "Amina", "start huddle")).await;
        c.sink().clear();
        let outcome = c.handle(&direct_msg("A", "Amina", "hello again")).await;
        assert_eq!(outcome, Outcome::default());
        assert!(c.sink().sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_is_ignored() {
        let c = coordinator();

        let outcome = c.handle(&direct_msg("A", "Amina", "   ")).await;

        assert_eq!(outcome, Outcome::default());
        assert!(c.sink().sent().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_sends_generic_error() {
        let c = coordinator();
        c.repo().fail_queries();

        let outcome = c.handle(&direct_msg("A", "Amina", "start huddle")).await;

        assert!(outcome.failed);
        assert_eq!(outcome.intent, Some("start"));
        assert_eq!(
            c.sink().sent_to("A"),
            vec!["⚠️ Something went wrong. Please try again."]
        );
    }

    #[tokio::test]
    async fn test_fan_out_failure_does_not_abort_contribution() {
        let c = coordinator();
        c.handle(&direct_msg("A", "Amina", "start huddle")).await;
        let code = active_code(&c);
        c.handle(&direct_msg("B", "Baraka", &format!("join {code}")))
            .await;
        c.handle(&direct_msg("C", "Chausiku", &format!("join {code}")))
            .await;
        c.sink().make_unreachable("B");
        c.sink().clear();

        let outcome = c.handle(&direct_msg("A", "Amina", "1000")).await;

        assert!(!outcome.failed);
        assert_eq!(outcome.delivered, 2);
        assert_eq!(c.repo().contributions().len(), 1);
        assert_eq!(c.sink().sent_to("C").len(), 1);
    }

    #[test]
    fn test_reply_language_rules() {
        let mut session = Session {
            id: uuid::Uuid::now_v7(),
            session_code: "HUD-ABC234".to_string(),
            group_id: GROUP.to_string(),
            creator_id: None,
            language: Language::Sw,
            status: SessionStatus::Active,
            created_at: chrono::Utc::now(),
            expires_at: chrono::Utc::now(),
            closed_at: None,
            summary: None,
        };
        assert_eq!(reply_language(Language::En, Some(&session)), Language::Sw);
        assert_eq!(reply_language(Language::En, None), Language::En);
        session.language = Language::En;
        assert_eq!(reply_language(Language::Sw, Some(&session)), Language::Sw);
    }
}
