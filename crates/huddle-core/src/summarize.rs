//! Summarization port and prompt construction.
//!
//! The summarization call itself is an external collaborator; this module
//! only defines the trait and the pure prompt text handed to it.

use std::fmt::Write as _;

use huddle_types::error::SummarizeError;
use huddle_types::intent::Language;
use huddle_types::session::SessionAggregate;

/// System prompt for the summarization model.
pub const SYSTEM_PROMPT: &str = "You are Huddle, a concise group coordination assistant.
Rules:
- Keep responses under 3 sentences
- Support both English and Swahili
- Reply in the same language as the input
- Focus on actionable summaries
- Never store or repeat personal data beyond the session";

/// Produces a natural-language summary of a session.
///
/// Implementations live in huddle-infra (e.g., `OpenAiSummarizer`).
/// Failures are never fatal: callers treat them as "no summary available".
pub trait Summarizer: Send + Sync {
    fn summarize(
        &self,
        aggregate: &SessionAggregate,
        language: Language,
    ) -> impl std::future::Future<Output = Result<String, SummarizeError>> + Send;
}

/// Build the user prompt describing a session aggregate.
pub fn build_summary_prompt(aggregate: &SessionAggregate, language: Language) -> String {
    let instruction = match language {
        Language::Sw => "Respond in Swahili.",
        Language::En => "Respond in English.",
    };

    let mut prompt = format!(
        "{instruction}\nSummarize this group coordination session concisely:\n\n\
         Session Status: {}\nContributors: {}\nTotal Pledged: {}\nCommitments:\n",
        aggregate.session.status,
        aggregate.contributions.len(),
        aggregate.total_amount,
    );

    for c in &aggregate.contributions {
        let amount = c.amount.map(|a| format!("{a} TZS")).unwrap_or_default();
        let text = c.commitment_text.as_deref().unwrap_or_default();
        let _ = writeln!(prompt, "- {}: {amount} {text}", c.display_name());
    }

    prompt
}
