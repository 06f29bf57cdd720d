//! Provider adapter integration tests
//!
//! Covers token accounting, summarization, and the rate-limit retry.

mod common;

use std::sync::Arc;

use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use common::*;
use tandem::agent::summarizer::{self, SUMMARY_INSTRUCTION};
use tandem::agent::{Conversation, ProviderAdapter};
use tandem::core::{Role, TandemError, Turn};
use tandem::llm::ProviderSession;

fn long_conversation() -> Conversation {
    let mut conversation = Conversation::with_system_prompt("system rules");
    conversation.add_user("q1");
    conversation.add_assistant("a1");
    conversation.add_user("q2");
    conversation.add_assistant("a2");
    conversation.add_user("q3");
    conversation
}

fn adapter(provider: &Arc<ScriptedProvider>, conversation: Conversation) -> ProviderAdapter {
    ProviderAdapter::new(
        provider.clone(),
        ProviderSession::new("scripted-model", 1000, 3.0, 15.0),
        conversation,
        Vec::new(),
    )
}

#[tokio::test]
async fn test_usage_is_accumulated() {
    let provider = ScriptedProvider::replies(vec![text("one", 100), text("two", 150)]);
    let mut adapter = adapter(&provider, Conversation::with_system_prompt("s"));
    let cancel = CancellationToken::new();

    adapter.add_message(Turn::user("hi")).unwrap();
    assert_ok!(adapter.infer(&cancel).await);
    assert_ok!(adapter.infer(&cancel).await);

    let session = adapter.session();
    assert_eq!(session.input_tokens, 250);
    assert_eq!(session.output_tokens, 20);
    assert!(adapter.calculate_price() > 0.0);
}

#[tokio::test]
async fn test_tool_use_turn_is_appended() {
    let provider = ScriptedProvider::replies(vec![tool_calls(
        "Looking.",
        &[("t1", "Bash", r#"{"command":"ls"}"#)],
    )]);
    let mut adapter = adapter(&provider, Conversation::with_system_prompt("s"));

    let result = assert_ok!(adapter.infer(&CancellationToken::new()).await);
    assert_eq!(result.text, "Looking.");
    assert_eq!(result.tool_calls.len(), 1);

    let last = adapter.conversation().turns().last().unwrap().clone();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.text(), "Looking.");
    assert_eq!(last.tool_use_ids(), vec!["t1"]);
}

#[tokio::test]
async fn test_text_reply_is_not_appended_by_adapter() {
    let provider = ScriptedProvider::replies(vec![text("final", 10)]);
    let mut adapter = adapter(&provider, long_conversation());

    assert_ok!(adapter.infer(&CancellationToken::new()).await);
    assert_eq!(adapter.conversation().len(), 6);
}

#[tokio::test]
async fn test_two_rate_limits_summarize_once_then_fail() {
    let provider = ScriptedProvider::replies(vec![
        rate_limited(),
        text("<summary>User asked three questions.</summary>", 40),
        rate_limited(),
        text("unused", 1),
    ]);
    let mut adapter = adapter(&provider, long_conversation());

    let err = assert_err!(adapter.infer(&CancellationToken::new()).await);
    assert!(matches!(err, TandemError::RateLimited(_)));

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(provider.remaining(), 1);

    // The middle call is the summarization request
    assert_eq!(requests[1].turns[0], Turn::system(SUMMARY_INSTRUCTION));
    assert_eq!(requests[1].temperature, Some(0.2));
    assert!(requests[1].tool_names.is_empty());

    // The retry was rebuilt from the summarized conversation
    let expected = vec![
        Turn::system("system rules"),
        Turn::assistant("User asked three questions."),
        Turn::assistant("a2"),
        Turn::user("q3"),
    ];
    assert_eq!(requests[2].turns, expected);
    assert_eq!(adapter.conversation().turns(), expected.as_slice());
}

#[tokio::test]
async fn test_rate_limit_by_status_recovers_on_retry() {
    let provider = ScriptedProvider::replies(vec![
        Err(TandemError::api(429, "slow down")),
        text("<summary>short</summary>", 5),
        text("answer", 30),
    ]);
    let mut adapter = adapter(&provider, long_conversation());

    let result = assert_ok!(adapter.infer(&CancellationToken::new()).await);
    assert_eq!(result.text, "answer");
    assert_eq!(provider.requests().len(), 3);
}

#[tokio::test]
async fn test_rate_limit_retries_even_when_nothing_to_summarize() {
    let provider = ScriptedProvider::replies(vec![
        Err(TandemError::api(400, "Too Many Requests, please retry")),
        text("answer", 30),
    ]);
    let mut conversation = Conversation::with_system_prompt("s");
    conversation.add_user("only question");
    let mut adapter = adapter(&provider, conversation);

    let result = assert_ok!(adapter.infer(&CancellationToken::new()).await);
    assert_eq!(result.text, "answer");
    // No summarization call was needed
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let provider = ScriptedProvider::replies(vec![
        Err(TandemError::malformed("no choices")),
        text("unused", 1),
    ]);
    let mut adapter = adapter(&provider, long_conversation());

    let err = assert_err!(adapter.infer(&CancellationToken::new()).await);
    assert!(matches!(err, TandemError::MalformedResponse(_)));
    assert_eq!(provider.requests().len(), 1);
    assert_eq!(adapter.conversation().len(), 6);
}

#[tokio::test]
async fn test_auto_summarize_over_budget() {
    let provider = ScriptedProvider::replies(vec![
        text("a-big", 900),
        text("<summary>compacted history</summary>", 0),
        text("after", 50),
    ]);
    let mut adapter = adapter(&provider, long_conversation());
    let cancel = CancellationToken::new();

    assert_ok!(adapter.infer(&cancel).await);
    assert!(summarizer::should_summarize(adapter.session()));

    adapter.add_message(Turn::assistant("a-big")).unwrap();
    adapter.add_message(Turn::user("q4")).unwrap();
    let result = assert_ok!(adapter.infer(&cancel).await);
    assert_eq!(result.text, "after");

    // Counters restarted at the summarization boundary
    let session = adapter.session();
    assert_eq!(session.input_tokens, 50);
    assert_eq!(session.billed_input_tokens, 950);
    assert!(!summarizer::should_summarize(session));

    let turns = adapter.conversation().turns();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[1], Turn::assistant("compacted history"));
    assert_eq!(turns[3], Turn::user("q4"));
}

#[tokio::test]
async fn test_auto_summarize_can_be_disabled() {
    let provider = ScriptedProvider::replies(vec![text("a", 900), text("b", 900)]);
    let mut adapter = adapter(&provider, long_conversation()).with_auto_summarize(false);
    let cancel = CancellationToken::new();

    assert_ok!(adapter.infer(&cancel).await);
    assert_ok!(adapter.infer(&cancel).await);
    assert_eq!(provider.requests().len(), 2);
    assert_eq!(adapter.conversation().len(), 6);
}

#[tokio::test]
async fn test_failed_summary_proceeds_uncompacted() {
    let provider = ScriptedProvider::replies(vec![
        text("big", 900),
        text("   ", 0),
        text("still fine", 10),
    ]);
    let mut adapter = adapter(&provider, long_conversation());
    let cancel = CancellationToken::new();

    assert_ok!(adapter.infer(&cancel).await);
    let result = assert_ok!(adapter.infer(&cancel).await);
    assert_eq!(result.text, "still fine");

    assert_eq!(adapter.conversation().len(), 6);
    // No reset without a summary
    assert_eq!(adapter.session().input_tokens, 910);
}

#[tokio::test]
async fn test_summarize_short_conversation_is_noop() {
    let provider = ScriptedProvider::replies(vec![]);
    let mut conversation = Conversation::with_system_prompt("s");
    conversation.add_user("q");
    conversation.add_assistant("a");
    let before = conversation.clone();

    let mut session = ProviderSession::new("m", 1000, 0.0, 0.0);
    session.input_tokens = 999;

    let compacted = assert_ok!(
        summarizer::summarize(provider.as_ref(), &mut conversation, &mut session).await
    );
    assert!(!compacted);
    assert_eq!(conversation.turns(), before.turns());
    assert_eq!(session.input_tokens, 999);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_summary_keeps_tool_turn_with_its_call() {
    let provider = ScriptedProvider::replies(vec![text("<summary>s</summary>", 0)]);
    let mut conversation = long_conversation();
    conversation.add_assistant_tool_uses("", &[tandem::core::ToolCallRequest::new("t1", "Bash", "{}")]);
    conversation.add_tool_result("t1", "out").unwrap();
    let mut session = ProviderSession::new("m", 1000, 0.0, 0.0);

    assert_ok!(summarizer::summarize(provider.as_ref(), &mut conversation, &mut session).await);

    let turns = conversation.turns();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[2].tool_use_ids(), vec!["t1"]);
    assert_eq!(turns[3].tool_result_ids(), vec!["t1"]);

    // The compacted turns went out as one transcript message
    let request = &provider.requests()[0];
    assert_eq!(request.turns.len(), 2);
    assert!(request.turns[1].text().contains("[user]\nq1"));
}

#[tokio::test]
async fn test_clear_resets_to_seeded_state() {
    let provider = ScriptedProvider::replies(vec![text("x", 500)]);
    let mut adapter = adapter(&provider, Conversation::with_system_prompt("s"));

    adapter.add_message(Turn::user("hello")).unwrap();
    assert_ok!(adapter.infer(&CancellationToken::new()).await);
    adapter.clear();

    assert_eq!(adapter.conversation().len(), 1);
    assert_eq!(adapter.session().input_tokens, 0);
    assert_eq!(adapter.session().billed_input_tokens, 500);
}
