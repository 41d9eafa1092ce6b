//! Call requests and their settled results.

use crate::{Message, Strategy, Tool, ToolCall};
use compact_str::CompactString;
use serde_json::Value;
use std::{fmt::Write, time::Duration};

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    /// Correlation id, only present under the concurrent protocol.
    pub id: Option<CompactString>,
    /// Name of the registry function.
    pub name: CompactString,
    /// Raw argument payload, expected to be JSON.
    pub arguments: String,
}

impl CallRequest {
    /// Create a serial request, which carries no correlation id.
    pub fn serial(name: impl Into<CompactString>, arguments: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Convert back into the tool call the assistant message carries.
    pub fn to_tool_call(&self, index: u32) -> ToolCall {
        ToolCall::function(
            index,
            self.id.clone().unwrap_or_default(),
            self.name.clone(),
            self.arguments.clone(),
        )
    }
}

impl From<&ToolCall> for CallRequest {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: Some(call.id.clone()),
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        }
    }
}

/// The settled outcome of one call. Immutable once created.
#[derive(Debug, Clone)]
pub struct CallResult {
    /// Correlation id of the request (concurrent protocol).
    pub id: Option<CompactString>,
    /// Ordinal position of the request within its batch.
    pub position: usize,
    /// Name of the called function.
    pub name: CompactString,
    /// Rendered call signature, `name(k=v, ...)`.
    pub signature: String,
    /// Parsed arguments, `Null` when they failed to parse.
    pub arguments: Value,
    /// Produced value, or a diagnostic string on error.
    pub value: Value,
    /// Schema of the function, when it is registered.
    pub schema: Option<Tool>,
    /// Whether the call succeeded.
    pub success: bool,
    /// Wall-clock time from dispatch to settle.
    pub elapsed: Duration,
    /// Protocol the call was made under.
    pub strategy: Strategy,
}

impl CallResult {
    /// Text handed back to the model.
    pub fn content(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            value => value.to_string(),
        }
    }

    /// The tool-result message folded back into the conversation.
    pub fn to_message(&self) -> Message {
        match &self.id {
            Some(id) => Message::tool(self.content(), id.clone()),
            None => Message::function(self.name.clone(), self.content()),
        }
    }
}

/// Render a call signature such as `getIssue(repo=a/b, number=3)`.
pub fn signature(name: &str, arguments: &Value) -> String {
    let mut out = String::from(name);
    out.push('(');
    if let Value::Object(map) = arguments {
        for (i, (key, value)) in map.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = match value {
                Value::String(s) => write!(out, "{key}={s}"),
                value => write!(out, "{key}={value}"),
            };
        }
    }
    out.push(')');
    out
}
