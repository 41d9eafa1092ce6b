//! Chat request type.

use crate::{Message, Strategy, Tool, ToolChoice};
use compact_str::CompactString;

/// A chat completion request.
///
/// Contains everything needed to make one model invocation. Provider
/// implementations convert this to their wire format; the `strategy`
/// decides whether the functions are offered as concurrent tools or as
/// serial functions.
#[derive(Debug, Clone)]
pub struct Request {
    /// The model to use.
    pub model: CompactString,

    /// The conversation messages.
    pub messages: Vec<Message>,

    /// The functions available for this request.
    pub tools: Vec<Tool>,

    /// Controls which function is called by the model.
    pub tool_choice: ToolChoice,

    /// The calling protocol the functions are offered under.
    pub strategy: Strategy,
}

impl Request {
    /// Create a new request for the given model.
    pub fn new(model: impl Into<CompactString>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
            strategy: Strategy::Serial,
        }
    }

    /// Set the messages for this request.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Set the functions for this request.
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the tool choice for this request.
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }

    /// Set the calling protocol for this request.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}
