//! Tests for the turn loop.

use ccore::{
    FunctionCall, Message, ProviderKind, Role, Strategy, StreamChunk, ToolCall, ToolChoice,
    testing::Scripted,
};
use common::{label, records, registry, request};
use scout_runtime::{Frame, Limits, Turn, TurnError, channel};
use std::{sync::Arc, time::Duration};

mod common;

async fn run(
    model: &Scripted,
    request: ccore::ChatRequest,
    limits: Limits,
) -> (Result<(), TurnError>, Vec<Frame>) {
    let turn = Turn::new(
        model.clone(),
        Arc::new(registry()),
        Message::system("You are scout."),
        request,
    )
    .with_limits(limits);
    let (channel, mut rx) = channel();
    let result = turn.run(channel).await;

    let mut frames = Vec::new();
    while let Some(frame) = rx.recv().await {
        frames.push(frame);
    }
    (result, frames)
}

fn labels(frames: &[Frame]) -> Vec<String> {
    frames.iter().map(label).collect()
}

#[tokio::test]
async fn plain_answer_streams_text() {
    let model = Scripted::new().round(vec![
        StreamChunk::text("Hel"),
        StreamChunk::text("lo"),
        StreamChunk::stop(),
    ]);
    let (result, frames) = run(
        &model,
        request(ProviderKind::OpenAI, true, &["getIssue"]),
        Limits::default(),
    )
    .await;

    result.unwrap();
    assert_eq!(
        labels(&frames),
        vec!["message:2", "text:Hel", "text:lo", "completion:Hello"]
    );
    assert_eq!(model.requests().len(), 1);
}

#[tokio::test]
async fn concurrent_calls_fold_into_conversation() {
    let model = Scripted::new()
        .round(vec![StreamChunk::tool(&[
            ToolCall::function(0, "call_1", "getIssue", r#"{"number":7}"#),
            ToolCall::function(1, "call_2", "codeSearch", r#"{"query":"panic"}"#),
        ])])
        .answer("Issue 7 is a crash.");
    let (result, frames) = run(
        &model,
        request(ProviderKind::OpenAI, true, &["getIssue", "codeSearch"]),
        Limits::default(),
    )
    .await;
    result.unwrap();

    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.strategy == Strategy::Concurrent));
    assert_eq!(requests[0].tools.len(), 2);

    let messages = &requests[1].messages;
    assert_eq!(messages.len(), 5);
    // earlier messages are untouched and keep their order
    assert_eq!(messages[..2], requests[0].messages[..]);
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].tool_calls.len(), 2);
    assert_eq!(messages[2].tool_calls[1].id, "call_2");
    assert_eq!(messages[3].role, Role::Tool);
    assert_eq!(messages[3].tool_call_id, "call_1");
    assert!(messages[3].content.contains("crash on start"));
    assert_eq!(messages[4].tool_call_id, "call_2");
    assert_eq!(messages[4].content, "rate limited");

    let records = records(&frames);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.strategy == Strategy::Concurrent));
    let failed = records.iter().find(|r| !r.success).expect("failed record");
    assert_eq!(failed.signature, "codeSearch(query=panic)");
    assert!(frames.iter().any(|f| matches!(f, Frame::Text(t) if t == "Issue 7 is a crash.")));
}

#[tokio::test]
async fn snapshots_precede_their_records() {
    let model = Scripted::new()
        .round(vec![StreamChunk::tool(&[ToolCall::function(
            0,
            "call_1",
            "getIssue",
            r#"{"number":1}"#,
        )])])
        .answer("done");
    let (result, frames) = run(
        &model,
        request(ProviderKind::OpenAI, true, &["getIssue"]),
        Limits::default(),
    )
    .await;
    result.unwrap();

    assert_eq!(
        labels(&frames),
        vec![
            "message:2",
            "completion:",
            "function:getIssue(number=1)",
            "message:4",
            "text:done",
            "completion:done",
        ]
    );
}

#[tokio::test]
async fn concurrent_barrier_waits_for_every_call() {
    let model = Scripted::new()
        .round(vec![StreamChunk::tool(&[
            ToolCall::function(0, "slow", "slowSearch", ""),
            ToolCall::function(1, "fast", "getIssue", r#"{"number":2}"#),
        ])])
        .answer("ok");
    let (result, frames) = run(
        &model,
        request(ProviderKind::OpenAI, true, &["slowSearch", "getIssue"]),
        Limits::default(),
    )
    .await;
    result.unwrap();

    let labels = labels(&frames);
    let second_snapshot = labels
        .iter()
        .rposition(|l| l.starts_with("message:"))
        .expect("snapshot");
    let records: Vec<_> = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| l.starts_with("function:"))
        .collect();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|(i, _)| *i < second_snapshot));
    // records are written in settle order
    assert_eq!(records[0].1, "function:getIssue(number=2)");
    assert_eq!(records[1].1, "function:slowSearch()");

    // tool results keep request order
    let messages = &model.requests()[1].messages;
    assert_eq!(messages[3].tool_call_id, "slow");
    assert_eq!(messages[4].tool_call_id, "fast");
}

#[tokio::test]
async fn azure_is_always_serial() {
    let model = Scripted::new()
        .round(vec![StreamChunk::function(FunctionCall::new(
            "getIssue",
            r#"{"number":3}"#,
        ))])
        .answer("found it");
    let (result, frames) = run(
        &model,
        request(ProviderKind::Azure, true, &["getIssue"]),
        Limits::default(),
    )
    .await;
    result.unwrap();

    let requests = model.requests();
    assert!(requests.iter().all(|r| r.strategy == Strategy::Serial));
    let messages = &requests[1].messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[..2], requests[0].messages[..]);
    assert_eq!(messages[2].role, Role::Function);
    assert_eq!(messages[2].name, "getIssue");

    let records = records(&frames);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].strategy, Strategy::Serial);
    assert!(records[0].id.is_none());
}

#[tokio::test]
async fn serial_turn_executes_single_call() {
    let model = Scripted::new()
        .round(vec![StreamChunk::tool(&[
            ToolCall::function(0, "a", "getIssue", r#"{"number":1}"#),
            ToolCall::function(1, "b", "getIssue", r#"{"number":2}"#),
        ])])
        .answer("one");
    let (result, frames) = run(
        &model,
        request(ProviderKind::OpenAI, false, &["getIssue"]),
        Limits::default(),
    )
    .await;
    result.unwrap();

    let records = records(&frames);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].signature, "getIssue(number=1)");
    assert_eq!(model.requests()[1].messages.len(), 3);
}

#[tokio::test]
async fn image_forces_analysis_first() {
    let mut chat = request(ProviderKind::OpenAI, true, &["getIssue"]);
    chat.data.image_url = Some("https://img.example/cat.png".into());
    chat.messages = vec![Message::user("")];

    let model = Scripted::new()
        .round(vec![StreamChunk::function(FunctionCall::new(
            "analyzeImage",
            "{}",
        ))])
        .answer("A cat.");
    let (result, frames) = run(&model, chat, Limits::default()).await;
    result.unwrap();

    let requests = model.requests();
    assert_eq!(requests[0].strategy, Strategy::Serial);
    assert_eq!(
        requests[0].tool_choice,
        ToolChoice::Function("analyzeImage".into())
    );
    assert!(requests[0].tools.iter().any(|t| t.name == "analyzeImage"));
    assert_eq!(requests[1].tool_choice, ToolChoice::Auto);

    let records = records(&frames);
    assert_eq!(records[0].args["prompt"], "What is this image?");
    assert_eq!(records[0].args["imageUrl"], "https://img.example/cat.png");
    assert!(records[0].success);
}

#[tokio::test]
async fn image_prompt_defaults_to_last_user_message() {
    let mut chat = request(ProviderKind::OpenAI, false, &[]);
    chat.data.image_url = Some("https://img.example/dog.png".into());
    chat.messages = vec![Message::user("is this a dog?")];

    let model = Scripted::new()
        .round(vec![StreamChunk::function(FunctionCall::new(
            "analyzeImage",
            "",
        ))])
        .answer("Yes.");
    let (result, frames) = run(&model, chat, Limits::default()).await;
    result.unwrap();

    let records = records(&frames);
    assert_eq!(records[0].args["prompt"], "is this a dog?");
}

#[tokio::test]
async fn failing_function_does_not_end_turn() {
    let model = Scripted::new()
        .round(vec![StreamChunk::function(FunctionCall::new(
            "codeSearch",
            r#"{"query":"unwrap"}"#,
        ))])
        .answer("Search is unavailable.");
    let (result, frames) = run(
        &model,
        request(ProviderKind::OpenAI, false, &["codeSearch"]),
        Limits::default(),
    )
    .await;
    result.unwrap();

    let records = records(&frames);
    assert!(!records[0].success);
    assert_eq!(records[0].result, "rate limited");
    assert_eq!(model.requests()[1].messages[2].content, "rate limited");
    assert_eq!(labels(&frames).last().unwrap(), "completion:Search is unavailable.");
}

#[tokio::test]
async fn model_error_writes_error_frame() {
    let model = Scripted::new().fail("upstream 500");
    let (result, frames) = run(
        &model,
        request(ProviderKind::OpenAI, true, &[]),
        Limits::default(),
    )
    .await;

    assert!(matches!(result, Err(TurnError::Model(_))));
    let labels = labels(&frames);
    assert_eq!(labels[0], "message:2");
    assert!(labels.last().unwrap().starts_with("error:"));
    assert!(labels.last().unwrap().contains("upstream 500"));
}

#[tokio::test]
async fn round_limit_disables_function_calling() {
    let call = || {
        vec![StreamChunk::tool(&[ToolCall::function(
            0,
            "c",
            "getIssue",
            r#"{"number":1}"#,
        )])]
    };
    let limits = Limits {
        max_rounds: 1,
        ..Limits::default()
    };

    let answered = Scripted::new().round(call()).answer("final");
    let (result, _) = run(
        &answered,
        request(ProviderKind::OpenAI, true, &["getIssue"]),
        limits,
    )
    .await;
    result.unwrap();
    assert_eq!(answered.requests()[1].tool_choice, ToolChoice::None);

    let stubborn = Scripted::new().round(call()).round(call());
    let (result, frames) = run(
        &stubborn,
        request(ProviderKind::OpenAI, true, &["getIssue"]),
        limits,
    )
    .await;
    assert!(matches!(result, Err(TurnError::RoundLimit(1))));
    assert!(matches!(frames.last(), Some(Frame::Error(_))));
}

#[tokio::test]
async fn disconnected_caller_abandons_turn() {
    let model = Scripted::new().answer("never read");
    let turn = Turn::new(
        model.clone(),
        Arc::new(registry()),
        Message::system("sys"),
        request(ProviderKind::OpenAI, true, &[]),
    );
    let (channel, rx) = channel();
    drop(rx);

    let result = turn.run(channel).await;
    assert!(matches!(result, Err(TurnError::Disconnected(_))));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn disconnect_during_dispatch_drops_calls() {
    let model = Scripted::new()
        .round(vec![StreamChunk::tool(&[ToolCall::function(
            0,
            "slow",
            "slowSearch",
            "",
        )])])
        .answer("unreachable");
    let turn = Turn::new(
        model.clone(),
        Arc::new(registry()),
        Message::system("sys"),
        request(ProviderKind::OpenAI, true, &["slowSearch"]),
    );
    let (channel, mut rx) = channel();
    let handle = tokio::spawn(turn.run(channel));

    // snapshot, then the completion of the call round
    rx.recv().await.expect("snapshot");
    rx.recv().await.expect("completion");
    drop(rx);

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("turn settles")
        .expect("join");
    assert!(matches!(result, Err(TurnError::Disconnected(_))));
    assert_eq!(model.requests().len(), 1);
}

#[tokio::test]
async fn spawn_delivers_every_frame() {
    let model = Scripted::new()
        .delay(Duration::from_millis(1))
        .answer("hi");
    let turn = Turn::new(
        model,
        Arc::new(registry()),
        Message::system("sys"),
        request(ProviderKind::OpenAI, true, &[]),
    );
    let mut rx = turn.spawn();
    let mut frames = Vec::new();
    while let Some(frame) = rx.recv().await {
        frames.push(label(&frame));
    }
    assert_eq!(frames, vec!["message:2", "text:hi", "completion:hi"]);
}
