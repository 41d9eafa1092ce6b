//! Chat messages

use crate::{FunctionCall, StreamChunk, ToolCall};
use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A message in the chat
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct Message {
    /// The role of the message
    pub role: Role,

    /// The content of the message
    #[serde(default, deserialize_with = "nullable")]
    pub content: String,

    /// The function name, set on serial-protocol function results
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub name: CompactString,

    /// The tool call id, set on concurrent-protocol tool results
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub tool_call_id: CompactString,

    /// The tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// The function call requested by the assistant (serial protocol)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            ..Default::default()
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            ..Default::default()
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            ..Default::default()
        }
    }

    /// Create a new tool result message
    pub fn tool(content: impl Into<String>, call: impl Into<CompactString>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: call.into(),
            ..Default::default()
        }
    }

    /// Create a new function result message
    pub fn function(name: impl Into<CompactString>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            content: content.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a new message builder
    pub fn builder(role: Role) -> MessageBuilder {
        MessageBuilder::new(role)
    }
}

/// Clients may send `null` content for assistant messages.
fn nullable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accumulates streamed deltas into a single message
pub struct MessageBuilder {
    /// The message
    message: Message,
    /// The tool calls, keyed by stream index
    calls: BTreeMap<u32, ToolCall>,
    /// The serial function call
    function: Option<FunctionCall>,
}

impl MessageBuilder {
    /// Create a new message builder
    pub fn new(role: Role) -> Self {
        Self {
            message: Message {
                role,
                ..Default::default()
            },
            calls: BTreeMap::new(),
            function: None,
        }
    }

    /// Accept a chunk from the stream, returns the text it carried
    pub fn accept<'c>(&mut self, chunk: &'c StreamChunk) -> Option<&'c str> {
        if let Some(calls) = chunk.tool_calls() {
            for call in calls {
                self.calls.entry(call.index).or_default().merge(call);
            }
        }

        if let Some(call) = chunk.function_call() {
            self.function.get_or_insert_with(Default::default).merge(call);
        }

        let content = chunk.content()?;
        self.message.content.push_str(content);
        Some(content)
    }

    /// Text accumulated so far
    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// Build the message
    pub fn build(mut self) -> Message {
        self.message.tool_calls = self.calls.into_values().collect();
        self.message.function_call = self.function;
        self.message
    }
}

/// The role of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user role
    #[default]
    User,
    /// The assistant role
    Assistant,
    /// The system role
    System,
    /// A tool result (concurrent protocol)
    Tool,
    /// A function result (serial protocol)
    Function,
}
