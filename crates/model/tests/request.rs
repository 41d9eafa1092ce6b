//! Tests for the chat completions request body.

use ccore::{Message, Request, Strategy, Tool, ToolChoice};
use scout_model::Body;
use serde_json::json;

fn search() -> Tool {
    Tool {
        name: "codeSearch".into(),
        description: "search code".into(),
        parameters: schemars::schema_for!(String),
        strict: false,
    }
}

fn request(strategy: Strategy) -> Request {
    Request::new("gpt-4")
        .with_messages(vec![Message::user("find it")])
        .with_tools(vec![search()])
        .with_strategy(strategy)
}

#[test]
fn concurrent_offers_tools() {
    let body = Body::from(&request(Strategy::Concurrent));
    let tools = body.tools.expect("tools");
    assert_eq!(tools[0]["type"], "function");
    assert_eq!(tools[0]["function"]["name"], "codeSearch");
    assert_eq!(body.tool_choice.expect("tool_choice"), json!("auto"));
    assert!(body.functions.is_none());
    assert!(body.function_call.is_none());
}

#[test]
fn concurrent_forced_function() {
    let req = request(Strategy::Concurrent)
        .with_tool_choice(ToolChoice::Function("analyzeImage".into()));
    let body = Body::from(&req);
    assert_eq!(
        body.tool_choice.expect("tool_choice"),
        json!({ "type": "function", "function": { "name": "analyzeImage" } })
    );
}

#[test]
fn serial_offers_functions() {
    let body = Body::from(&request(Strategy::Serial));
    let functions = body.functions.expect("functions");
    assert_eq!(functions[0]["name"], "codeSearch");
    assert_eq!(functions[0]["description"], "search code");
    assert!(body.function_call.is_none());
    assert!(body.tools.is_none());
    assert!(body.tool_choice.is_none());
}

#[test]
fn serial_choice_none_and_forced() {
    let none = Body::from(&request(Strategy::Serial).with_tool_choice(ToolChoice::None));
    assert_eq!(none.function_call.expect("function_call"), json!("none"));

    let forced = Body::from(&request(Strategy::Serial).with_tool_choice(ToolChoice::Function("codeSearch".into())));
    assert_eq!(
        forced.function_call.expect("function_call"),
        json!({ "name": "codeSearch" })
    );
}

#[test]
fn empty_tools_omit_function_fields() {
    let req = Request::new("gpt-4").with_strategy(Strategy::Concurrent);
    let value = serde_json::to_value(Body::from(&req)).expect("serialize");
    let object = value.as_object().expect("object");
    for key in ["tools", "tool_choice", "functions", "function_call", "stream"] {
        assert!(!object.contains_key(key), "{key} should be omitted");
    }
}

#[test]
fn stream_sets_flag_only() {
    let value = serde_json::to_value(Body::from(&request(Strategy::Serial)).stream())
        .expect("serialize");
    assert_eq!(value["stream"], true);
    assert!(value.get("stream_options").is_none());
}

#[test]
fn messages_serialize_without_empty_fields() {
    let value = serde_json::to_value(Body::from(&request(Strategy::Serial))).expect("serialize");
    assert_eq!(value["model"], "gpt-4");
    assert_eq!(
        value["messages"][0],
        json!({ "role": "user", "content": "find it" })
    );
}
