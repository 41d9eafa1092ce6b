//! Streaming response abstractions

use crate::{
    FinishReason, FunctionCall,
    response::{Choice, CompletionMeta, Delta},
    tool::ToolCall,
};
use serde::Deserialize;

/// A streaming chat completion chunk
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StreamChunk {
    /// Completion metadata
    #[serde(flatten)]
    pub meta: CompletionMeta,

    /// The list of completion choices (with delta content)
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage statistics (only in final chunk)
    #[serde(default)]
    pub usage: Option<crate::Usage>,
}

impl StreamChunk {
    fn delta(delta: Delta, finish_reason: Option<FinishReason>) -> Self {
        Self {
            choices: vec![Choice {
                delta,
                finish_reason,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Create a text chunk
    pub fn text(content: impl Into<String>) -> Self {
        Self::delta(
            Delta {
                content: Some(content.into()),
                ..Default::default()
            },
            None,
        )
    }

    /// Create a tool chunk
    pub fn tool(calls: &[ToolCall]) -> Self {
        Self::delta(
            Delta {
                tool_calls: Some(calls.to_vec()),
                ..Default::default()
            },
            Some(FinishReason::ToolCalls),
        )
    }

    /// Create a serial function call chunk
    pub fn function(call: FunctionCall) -> Self {
        Self::delta(
            Delta {
                function_call: Some(call),
                ..Default::default()
            },
            Some(FinishReason::FunctionCall),
        )
    }

    /// Create the terminal chunk of a plain answer
    pub fn stop() -> Self {
        Self::delta(Delta::default(), Some(FinishReason::Stop))
    }

    /// Get the content of the first choice
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Get the tool calls of the first choice
    pub fn tool_calls(&self) -> Option<&[ToolCall]> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.tool_calls.as_deref())
    }

    /// Get the function call of the first choice
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.function_call.as_ref())
    }

    /// Get the reason the model stopped generating
    pub fn reason(&self) -> Option<&FinishReason> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_ref())
    }
}
