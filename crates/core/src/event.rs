//! Debug events carried on the side channel.

use crate::{CallResult, Message, Strategy, Tool};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured event written alongside the model text.
///
/// Events form an append-only log for the observer; they are emitted once
/// and never revised.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "debugType", rename_all = "lowercase")]
pub enum DebugEvent {
    /// The conversation as it is about to be sent to the model.
    Message {
        /// Messages, system message first.
        messages: Vec<Message>,
    },
    /// A settled function call.
    Function(FunctionRecord),
    /// The text of one model invocation, written when its stream ends.
    Completion {
        /// Generated text.
        completion: String,
    },
}

impl DebugEvent {
    /// Snapshot of the messages about to be sent.
    pub fn message(messages: &[Message]) -> Self {
        Self::Message {
            messages: messages.to_vec(),
        }
    }

    /// Snapshot of a finished completion.
    pub fn completion(completion: impl Into<String>) -> Self {
        Self::Completion {
            completion: completion.into(),
        }
    }
}

impl From<&CallResult> for DebugEvent {
    fn from(result: &CallResult) -> Self {
        Self::Function(FunctionRecord::from(result))
    }
}

/// Observability record of one settled call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRecord {
    /// Correlation id (concurrent protocol).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CompactString>,
    /// Elapsed wall-clock time, e.g. `"42ms"`.
    pub elapsed_time: String,
    /// Parsed arguments.
    pub args: Value,
    /// Protocol the call ran under.
    pub strategy: Strategy,
    /// Rendered call signature.
    pub signature: String,
    /// Produced value or diagnostic.
    pub result: Value,
    /// Function schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Tool>,
    /// Whether the call succeeded.
    pub success: bool,
}

impl From<&CallResult> for FunctionRecord {
    fn from(result: &CallResult) -> Self {
        Self {
            id: result.id.clone(),
            elapsed_time: format!("{}ms", result.elapsed.as_millis()),
            args: result.arguments.clone(),
            strategy: result.strategy,
            signature: result.signature.clone(),
            result: result.value.clone(),
            schema: result.schema.clone(),
            success: result.success,
        }
    }
}
