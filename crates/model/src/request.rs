//! Chat completions request body.

use ccore::{Message, Request, Strategy, Tool, ToolChoice};
use compact_str::CompactString;
use serde::Serialize;
use serde_json::{Value, json};

/// The request body of the chat completions API.
///
/// The same registry schemas are offered either as `tools` (concurrent
/// protocol) or as legacy `functions` (serial protocol); the two pairs of
/// fields are never set together.
#[derive(Debug, Clone, Serialize)]
pub struct Body {
    /// The model to use, ignored by Azure deployments
    pub model: CompactString,

    /// The messages to send to the API
    pub messages: Vec<Message>,

    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Tools the model may call (concurrent protocol)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,

    /// Controls which tool is called (concurrent protocol)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,

    /// Functions the model may call (serial protocol)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Value>,

    /// Controls which function is called (serial protocol)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,
}

impl Body {
    /// Enable streaming for the request
    pub fn stream(mut self) -> Self {
        self.stream = Some(true);
        self
    }
}

impl From<&Request> for Body {
    fn from(request: &Request) -> Self {
        let mut body = Self {
            model: request.model.clone(),
            messages: request.messages.clone(),
            stream: None,
            tools: None,
            tool_choice: None,
            functions: None,
            function_call: None,
        };

        if request.tools.is_empty() {
            return body;
        }

        match request.strategy {
            Strategy::Concurrent => {
                body.tools = Some(tools(&request.tools));
                body.tool_choice = Some(match &request.tool_choice {
                    ToolChoice::None => json!("none"),
                    ToolChoice::Auto => json!("auto"),
                    ToolChoice::Function(name) => {
                        json!({ "type": "function", "function": { "name": name } })
                    }
                });
            }
            Strategy::Serial => {
                body.functions = Some(json!(request.tools));
                body.function_call = match &request.tool_choice {
                    ToolChoice::None => Some(json!("none")),
                    ToolChoice::Auto => None,
                    ToolChoice::Function(name) => Some(json!({ "name": name })),
                };
            }
        }
        body
    }
}

/// Wrap function schemas as tools
fn tools(tools: &[Tool]) -> Value {
    tools
        .iter()
        .map(|tool| json!({ "type": "function", "function": tool }))
        .collect()
}
