//! Context budget management
//!
//! When the provider reports that the conversation is nearing the model's
//! context window, older turns are replaced by a model-written summary.

use tracing::{debug, info};

use crate::agent::conversation::Conversation;
use crate::core::{Result, Role, TandemError, Turn};
use crate::llm::{ChatRequest, GenerateOptions, LLMProvider, ProviderSession};

/// Instructions for the summarization call
pub const SUMMARY_INSTRUCTION: &str = "You are compacting the history of a conversation between a user and a coding assistant so the work can continue in a fresh context. \
Write a summary that keeps the user's goals and constraints, decisions made, files and commands involved, results of tool calls that still matter, and what remains to be done. \
Be concise and factual. Wrap the summary in <summary></summary> tags.";

/// Fraction of the context window that triggers summarization
const SUMMARY_THRESHOLD_RATIO: f64 = 0.8;

/// Turns kept verbatim at the end of the conversation
const KEEP_RECENT_TURNS: usize = 2;

/// Tool text is clipped to this many chars in the transcript
const TRANSCRIPT_BLOCK_CHARS: usize = 4000;

/// Sampling temperature for the summarization call
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Whether the context counters have crossed the summarization threshold
pub fn should_summarize(session: &ProviderSession) -> bool {
    session.input_tokens as f64 > SUMMARY_THRESHOLD_RATIO * session.context_window as f64
}

/// Compact the conversation through one extra inference call.
///
/// Returns `Ok(false)` without touching anything when there is nothing
/// old enough to compact. On success the context counters are reset.
pub async fn summarize(
    backend: &dyn LLMProvider,
    conversation: &mut Conversation,
    session: &mut ProviderSession,
) -> Result<bool> {
    let turns = conversation.turns();
    let body_start = usize::from(conversation.system_turn().is_some());

    let mut tail_start = turns.len().saturating_sub(KEEP_RECENT_TURNS);
    // A kept tool turn needs the assistant turn that issued its calls
    while tail_start > body_start && turns[tail_start].role == Role::Tool {
        tail_start -= 1;
    }

    if tail_start <= body_start {
        debug!(turns = turns.len(), "nothing to summarize");
        return Ok(false);
    }

    let transcript = turns[body_start..tail_start]
        .iter()
        .map(|t| t.render_transcript(TRANSCRIPT_BLOCK_CHARS))
        .collect::<Vec<_>>()
        .join("\n\n");

    let request_turns = [
        Turn::system(SUMMARY_INSTRUCTION),
        Turn::user(format!(
            "Summarize this conversation history:\n\n{}",
            transcript
        )),
    ];
    let options = GenerateOptions {
        temperature: Some(SUMMARY_TEMPERATURE),
        max_tokens: None,
    };

    let response = backend
        .chat(ChatRequest {
            turns: &request_turns,
            tools: &[],
            options: &options,
        })
        .await?;

    let summary = extract_summary(&response.content).ok_or(TandemError::EmptySummary)?;

    let compacted = tail_start - body_start;
    let keep = turns.len() - tail_start;
    conversation.replace_with_summary(summary, keep);

    // The summary call's own usage only affects cost
    if let Some(usage) = response.usage {
        session.record(usage);
    }
    session.reset_context_counters();

    info!(compacted, kept = keep, "conversation summarized");
    Ok(true)
}

/// Pull the summary out of the model's reply.
///
/// Prefers `<summary>` tags, then a fenced code block, then the whole text.
pub fn extract_summary(text: &str) -> Option<String> {
    let summary = tagged(text)
        .or_else(|| fenced(text))
        .unwrap_or(text)
        .trim();

    if summary.is_empty() {
        None
    } else {
        Some(summary.to_string())
    }
}

fn tagged(text: &str) -> Option<&str> {
    let start = text.find("<summary>")? + "<summary>".len();
    let end = text[start..].find("</summary>")?;
    Some(&text[start..start + end])
}

fn fenced(text: &str) -> Option<&str> {
    let open = text.find("```")? + 3;
    // Skip the optional language tag
    let body_start = open + text[open..].find('\n')? + 1;
    let end = text[body_start..].find("```")?;
    Some(&text[body_start..body_start + end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        let mut session = ProviderSession::new("m", 1000, 0.0, 0.0);
        session.input_tokens = 800;
        assert!(!should_summarize(&session));
        session.input_tokens = 801;
        assert!(should_summarize(&session));
        // No side effects
        assert!(should_summarize(&session));
        assert_eq!(session.input_tokens, 801);
    }

    #[test]
    fn test_extract_tagged() {
        let text = "Here you go:\n<summary>\nUser wants X.\n</summary>\nThanks";
        assert_eq!(extract_summary(text).unwrap(), "User wants X.");
    }

    #[test]
    fn test_extract_fenced() {
        let text = "Summary below\n```markdown\n- goal: fix tests\n```";
        assert_eq!(extract_summary(text).unwrap(), "- goal: fix tests");

        let text = "```\nplain fence\n```";
        assert_eq!(extract_summary(text).unwrap(), "plain fence");
    }

    #[test]
    fn test_extract_raw_and_empty() {
        assert_eq!(extract_summary("  just text \n").unwrap(), "just text");
        assert!(extract_summary("   ").is_none());
        assert!(extract_summary("<summary>  </summary>").is_none());
    }

    #[test]
    fn test_unterminated_tag_falls_back() {
        assert_eq!(
            extract_summary("<summary>never closed").unwrap(),
            "<summary>never closed"
        );
    }
}
