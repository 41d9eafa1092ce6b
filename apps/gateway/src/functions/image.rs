//! Image analysis through a vision-capable completion model.

use crate::config::VisionConfig;
use anyhow::{Context, Result};
use model::HttpProvider;
use serde_json::json;

/// Describes images with a vision model.
#[derive(Clone)]
pub struct Vision {
    provider: HttpProvider,
    model: String,
    max_tokens: u32,
}

impl Vision {
    /// Create an analyzer on top of an OpenAI provider client.
    pub fn new(provider: HttpProvider, config: &VisionConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    /// Answer `prompt` about the image at `image_url`.
    pub async fn analyze(&self, prompt: &str, image_url: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": image_url } },
                ],
            }],
        });

        let response = self.provider.post(&body).await?;
        response
            .content()
            .map(ToOwned::to_owned)
            .context("vision model returned no content")
    }
}
