//! Chat response abstractions

use crate::{FunctionCall, Message, Role, tool::ToolCall};
use serde::Deserialize;

/// Common metadata shared between streaming and non-streaming completions
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CompletionMeta {
    /// A unique identifier for the chat completion
    pub id: String,

    /// The object type
    pub object: String,

    /// Unix timestamp (in seconds) of when the response was created
    pub created: u64,

    /// The model used for the completion
    pub model: String,
}

/// Message content in a completion response
///
/// Used for both streaming deltas and non-streaming response messages.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Delta {
    /// The role of the message author
    pub role: Option<Role>,

    /// The content of the message
    pub content: Option<String>,

    /// Tool calls made by the model
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Function call made by the model (serial protocol)
    pub function_call: Option<FunctionCall>,
}

/// A completion choice
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Choice {
    /// The index of this choice in the list
    #[serde(default)]
    pub index: u32,

    /// The message, `delta` when streaming and `message` otherwise
    #[serde(default, alias = "message")]
    pub delta: Delta,

    /// The reason the model stopped generating
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// The reason the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model finished its answer
    Stop,
    /// The token limit was reached
    Length,
    /// The model requested tool calls
    ToolCalls,
    /// The model requested a function call
    FunctionCall,
    /// The provider filtered the output
    ContentFilter,
    /// Any reason this client does not know
    #[serde(other)]
    Other,
}

/// Token usage statistics
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

/// A non-streaming chat completion response
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Response {
    /// Completion metadata
    #[serde(flatten)]
    pub meta: CompletionMeta,

    /// The list of completion choices
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage statistics
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl Response {
    /// Get the text of the first choice
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }

    /// The assistant message of the first choice, with any calls it made
    pub fn message(&self) -> Message {
        let Some(choice) = self.choices.first() else {
            return Message::assistant("", Vec::new());
        };
        let delta = &choice.delta;
        Message {
            content: delta.content.clone().unwrap_or_default(),
            tool_calls: delta.tool_calls.clone().unwrap_or_default(),
            function_call: delta.function_call.clone(),
            ..Message::assistant("", Vec::new())
        }
    }
}
