//! Tool and function call definitions

use compact_str::CompactString;
use schemars::{JsonSchema, Schema};
use serde::{Deserialize, Serialize};

/// An invocable function offered to the model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tool {
    /// The name of the function
    pub name: CompactString,

    /// The description of the function
    pub description: String,

    /// The parameters of the function
    pub parameters: Schema,

    /// Whether to strictly validate the parameters
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strict: bool,
}

impl Tool {
    /// Create a tool whose parameters are the JSON schema of `T`
    pub fn new<T: JsonSchema>(
        name: impl Into<CompactString>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: schemars::schema_for!(T),
            strict: false,
        }
    }
}

/// A tool call made by the model
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ToolCall {
    /// The ID of the tool call
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub id: CompactString,

    /// The index of the tool call (used in streaming)
    #[serde(default, skip_serializing)]
    pub index: u32,

    /// The type of tool (currently only "function")
    #[serde(default, rename = "type")]
    pub call_type: CompactString,

    /// The function to call
    #[serde(default)]
    pub function: FunctionCall,
}

impl ToolCall {
    /// Create a complete function tool call
    pub fn function(
        index: u32,
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            index,
            call_type: "function".into(),
            function: FunctionCall::new(name, arguments),
        }
    }

    /// Merge a streamed fragment into this call
    pub fn merge(&mut self, call: &Self) {
        if !call.id.is_empty() {
            self.id = call.id.clone();
        }
        if !call.call_type.is_empty() {
            self.call_type = call.call_type.clone();
        }
        self.function.merge(&call.function);
    }
}

/// A function call, either inside a tool call or on its own (serial protocol)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FunctionCall {
    /// The name of the function to call
    #[serde(default)]
    pub name: CompactString,

    /// The arguments to pass to the function (JSON string)
    #[serde(default)]
    pub arguments: String,
}

impl FunctionCall {
    /// Create a new function call
    pub fn new(name: impl Into<CompactString>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Merge a streamed fragment into this call
    pub fn merge(&mut self, call: &Self) {
        if !call.name.is_empty() {
            self.name = call.name.clone();
        }
        self.arguments.push_str(&call.arguments);
    }
}

/// Controls which function is called by the model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolChoice {
    /// Model will not call any function
    None,

    /// Model can pick between generating a message or calling functions
    #[default]
    Auto,

    /// Model must call the named function
    Function(CompactString),
}
