//! Shared fixtures for the runtime tests.

#![allow(dead_code)]

use ccore::{ChatData, ChatRequest, DebugEvent, Message, ProviderKind, Registry, Settings, Tool};
use scout_runtime::Frame;
use serde_json::{Value, json};
use std::time::Duration;

async fn get_issue(args: Value) -> anyhow::Result<Value> {
    Ok(json!({ "title": "crash on start", "number": args["number"] }))
}

async fn code_search(_: Value) -> anyhow::Result<Value> {
    anyhow::bail!("rate limited")
}

async fn slow_search(_: Value) -> anyhow::Result<Value> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(json!("slow"))
}

async fn list_issues(args: Value) -> anyhow::Result<Value> {
    let repo = args["repo"].as_str().unwrap_or_default().to_owned();
    Ok(json!([
        { "value": format!("{repo}#1 crash on start"), "number": 1 },
        { "value": format!("{repo}#2 slow build"), "number": 2 },
    ]))
}

async fn analyze_image(args: Value) -> anyhow::Result<Value> {
    Ok(args)
}

/// A registry with the functions the tests call.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(
        Tool::new::<Value>("getIssue", "Get a GitHub issue"),
        get_issue,
    );
    registry.register(
        Tool::new::<Value>("codeSearch", "Search code on GitHub"),
        code_search,
    );
    registry.register(Tool::new::<Value>("slowSearch", "Search slowly"), slow_search);
    registry.register(
        Tool::new::<Value>("listIssues", "List issues of a repository"),
        list_issues,
    );
    registry.register(
        Tool::new::<Value>("analyzeImage", "Describe an image"),
        analyze_image,
    );
    registry
}

/// A chat request with one user message.
pub fn request(provider: ProviderKind, parallelize: bool, tools: &[&str]) -> ChatRequest {
    ChatRequest {
        messages: vec![Message::user("what broke?")],
        data: ChatData {
            image_url: None,
            settings: Settings {
                provider,
                model: "gpt-4".into(),
                tools: tools.iter().map(|t| (*t).into()).collect(),
                parallelize,
                custom_instructions: String::new(),
            },
        },
    }
}

/// A compact label per frame, for order assertions.
pub fn label(frame: &Frame) -> String {
    match frame {
        Frame::Text(text) => format!("text:{text}"),
        Frame::Event(DebugEvent::Message { messages }) => format!("message:{}", messages.len()),
        Frame::Event(DebugEvent::Function(record)) => format!("function:{}", record.signature),
        Frame::Event(DebugEvent::Completion { completion }) => format!("completion:{completion}"),
        Frame::Error(error) => format!("error:{error}"),
    }
}

/// The function records among the frames.
pub fn records(frames: &[Frame]) -> Vec<ccore::FunctionRecord> {
    frames
        .iter()
        .filter_map(|frame| match frame {
            Frame::Event(DebugEvent::Function(record)) => Some(record.clone()),
            _ => None,
        })
        .collect()
}
