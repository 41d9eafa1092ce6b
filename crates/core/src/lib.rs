//! Core types and traits for the Scout function-calling runtime.
//!
//! This crate holds everything the orchestration loop shares with its
//! collaborators: the chat data model (`Message`, `Request`,
//! `StreamChunk`), the [`Model`] provider trait, the static function
//! [`Registry`], the per-turn [`Settings`] and the [`Strategy`] selector,
//! the [`DebugEvent`]s written to the side channel, and the [`Grid`]
//! request types.

pub use call::{CallRequest, CallResult, signature};
pub use conversation::Conversation;
pub use event::{DebugEvent, FunctionRecord};
pub use grid::{Cell, CellRequest, ColumnRequest, Grid, PrimaryCell};
pub use message::{Message, MessageBuilder, Role};
pub use model::{Model, ModelFactory};
pub use registry::{Handler, Registry};
pub use request::Request;
pub use response::{Choice, CompletionMeta, Delta, FinishReason, Response, Usage};
pub use settings::{ChatData, ChatRequest, ProviderKind, Settings};
pub use strategy::Strategy;
pub use stream::StreamChunk;
pub use tool::{FunctionCall, Tool, ToolCall, ToolChoice};

mod call;
mod conversation;
mod event;
mod grid;
mod message;
mod model;
mod registry;
mod request;
mod response;
mod settings;
mod strategy;
mod stream;
#[cfg(feature = "testing")]
pub mod testing;
mod tool;

/// Name of the image-analysis function.
///
/// When a turn carries an image attachment this function is forced as the
/// first call, and the dispatcher fills in its prompt and image URL.
pub const IMAGE_FUNCTION: &str = "analyzeImage";

/// Prompt used for image analysis when the user gave no text.
pub const DEFAULT_IMAGE_PROMPT: &str = "What is this image?";
