//! Per-turn settings and the inbound turn request.

use crate::Message;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Supported completion providers.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions API.
    #[default]
    OpenAI,
    /// Azure OpenAI deployment.
    Azure,
}

impl ProviderKind {
    /// Whether the provider speaks the concurrent-tool protocol.
    ///
    /// Azure deployments only accept the legacy `functions` flow.
    pub fn supports_tools(&self) -> bool {
        match self {
            Self::OpenAI => true,
            Self::Azure => false,
        }
    }

    /// Provider name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Azure => "azure",
        }
    }
}

/// Settings supplied once per turn, read-only for its duration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Completion provider.
    pub provider: ProviderKind,
    /// Model identifier (ignored by Azure deployments).
    pub model: CompactString,
    /// Enabled function names, in the order offered to the model.
    pub tools: Vec<CompactString>,
    /// Whether concurrent calls are allowed.
    pub parallelize: bool,
    /// Free-text instructions appended to the system prompt.
    pub custom_instructions: String,
}

/// Inbound body of a chat turn.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatRequest {
    /// Conversation history, without the system message.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Attachment and settings.
    #[serde(default)]
    pub data: ChatData,
}

/// Attachment and settings of a chat turn.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatData {
    /// Optional image attachment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Turn settings.
    pub settings: Settings,
}

impl ChatRequest {
    /// The image attachment, if any non-empty one was supplied.
    pub fn image_url(&self) -> Option<&str> {
        self.data.image_url.as_deref().filter(|url| !url.is_empty())
    }
}
