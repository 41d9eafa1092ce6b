//! Tests for the dispatcher.

use ccore::{CallRequest, Strategy};
use common::registry;
use futures_util::StreamExt;
use scout_runtime::Dispatcher;
use std::{sync::Arc, time::Duration};

mod common;

fn dispatcher(strategy: Strategy, functions: &[&str]) -> Dispatcher {
    Dispatcher::new(Arc::new(registry()), strategy)
        .with_functions(functions.iter().map(|f| (*f).into()).collect())
}

fn call(id: &str, name: &str, arguments: &str) -> CallRequest {
    CallRequest {
        id: Some(id.into()),
        name: name.into(),
        arguments: arguments.into(),
    }
}

#[tokio::test]
async fn execute_orders_results_by_position() {
    let results = dispatcher(Strategy::Concurrent, &["slowSearch", "getIssue"])
        .execute(vec![
            call("a", "slowSearch", ""),
            call("b", "getIssue", r#"{"number":9}"#),
        ])
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id.as_deref(), Some("a"));
    assert_eq!(results[1].value["number"], 9);
    assert!(results.iter().all(|r| r.success));
}

#[tokio::test]
async fn settle_yields_in_completion_order() {
    let dispatcher = dispatcher(Strategy::Concurrent, &["slowSearch", "getIssue"]);
    let settled: Vec<_> = dispatcher
        .settle(vec![
            call("a", "slowSearch", ""),
            call("b", "getIssue", r#"{"number":1}"#),
        ])
        .map(|result| result.position)
        .collect()
        .await;
    assert_eq!(settled, vec![1, 0]);
}

#[tokio::test]
async fn concurrent_calls_run_together() {
    let dispatcher = dispatcher(Strategy::Concurrent, &["slowSearch"]);
    let started = std::time::Instant::now();
    let results = dispatcher
        .execute((0..4).map(|i| call(&i.to_string(), "slowSearch", "")).collect())
        .await;
    assert_eq!(results.len(), 4);
    assert!(started.elapsed() < Duration::from_millis(180));
}

#[tokio::test]
async fn serial_keeps_first_request() {
    let results = dispatcher(Strategy::Serial, &["getIssue"])
        .execute(vec![
            CallRequest::serial("getIssue", r#"{"number":1}"#),
            CallRequest::serial("getIssue", r#"{"number":2}"#),
        ])
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value["number"], 1);
    assert_eq!(results[0].strategy, Strategy::Serial);
    assert!(results[0].id.is_none());
}

#[tokio::test]
async fn invalid_arguments_become_error_result() {
    let results = dispatcher(Strategy::Concurrent, &["getIssue"])
        .execute(vec![call("a", "getIssue", "{not json")])
        .await;
    let result = &results[0];
    assert!(!result.success);
    assert!(result.arguments.is_null());
    assert!(result.content().starts_with("invalid arguments for getIssue"));
    assert_eq!(result.signature, "getIssue()");
}

#[tokio::test]
async fn executor_failure_keeps_siblings() {
    let results = dispatcher(Strategy::Concurrent, &["codeSearch", "getIssue"])
        .execute(vec![
            call("a", "codeSearch", r#"{"query":"x"}"#),
            call("b", "getIssue", r#"{"number":4}"#),
        ])
        .await;
    assert!(!results[0].success);
    assert_eq!(results[0].content(), "rate limited");
    assert!(results[0].schema.is_some());
    assert!(results[1].success);
}

#[tokio::test]
async fn unknown_function_is_not_available() {
    let results = dispatcher(Strategy::Concurrent, &["getIssue"])
        .execute(vec![call("a", "deleteRepo", "{}")])
        .await;
    assert!(!results[0].success);
    assert_eq!(results[0].content(), "function deleteRepo not available");
    assert!(results[0].schema.is_none());
}

#[tokio::test]
async fn disabled_function_is_not_available() {
    let results = dispatcher(Strategy::Concurrent, &["getIssue"])
        .execute(vec![call("a", "codeSearch", "{}")])
        .await;
    assert_eq!(results[0].content(), "function codeSearch not available");
}

#[tokio::test]
async fn slow_call_times_out() {
    let results = dispatcher(Strategy::Concurrent, &["slowSearch", "getIssue"])
        .with_timeout(Duration::from_millis(5))
        .execute(vec![
            call("a", "slowSearch", ""),
            call("b", "getIssue", r#"{"number":1}"#),
        ])
        .await;
    assert!(!results[0].success);
    assert!(results[0].content().contains("timed out"));
    assert!(results[1].success);
}

#[tokio::test]
async fn image_call_receives_attachment() {
    let results = dispatcher(Strategy::Serial, &["analyzeImage"])
        .with_image("https://img.example/a.png", "What is this image?")
        .execute(vec![CallRequest::serial("analyzeImage", "")])
        .await;
    let value = &results[0].value;
    assert_eq!(value["imageUrl"], "https://img.example/a.png");
    assert_eq!(value["prompt"], "What is this image?");
    assert!(results[0].signature.starts_with("analyzeImage("));
}

#[tokio::test]
async fn image_is_not_injected_into_other_calls() {
    let results = dispatcher(Strategy::Serial, &["getIssue"])
        .with_image("https://img.example/a.png", "prompt")
        .execute(vec![CallRequest::serial("getIssue", r#"{"number":5}"#)])
        .await;
    assert!(results[0].arguments.get("imageUrl").is_none());
}
