//! Shared HTTP transport for OpenAI-compatible providers.
//!
//! `HttpProvider` wraps a `reqwest::Client` with pre-configured headers and
//! endpoint URL. Provides `post()` for non-streaming and `stream_sse()` for
//! Server-Sent Events streaming, and implements [`Model`] on top of them.

use crate::{Body, sse};
use anyhow::{Result, bail};
use async_stream::try_stream;
use ccore::{Model, Request, Response, StreamChunk};
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{
    Client, Method,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use serde::Serialize;

/// Default OpenAI chat completions endpoint.
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Azure subscription headers, both carry the API key.
const AZURE_KEY_HEADERS: [&str; 2] = ["api-key", "ocp-apim-subscription-key"];

/// Shared HTTP transport for OpenAI-compatible providers.
///
/// Holds a `reqwest::Client`, pre-built headers (auth + content-type),
/// and the target endpoint URL.
#[derive(Clone)]
pub struct HttpProvider {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
}

impl HttpProvider {
    /// Create a provider with Bearer token authentication.
    pub fn bearer(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        let mut headers = json_headers();
        headers.insert(header::AUTHORIZATION, format!("Bearer {key}").parse()?);
        Ok(Self {
            client,
            headers,
            endpoint: endpoint.to_owned(),
        })
    }

    /// Create a provider for an Azure OpenAI deployment.
    ///
    /// Azure authenticates with the key in its own headers; the bearer
    /// token is kept for gateways that proxy to OpenAI proper.
    pub fn azure(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        let mut provider = Self::bearer(client, key, endpoint)?;
        for name in AZURE_KEY_HEADERS {
            provider
                .headers
                .insert(name.parse::<HeaderName>()?, key.parse::<HeaderValue>()?);
        }
        Ok(provider)
    }

    /// Send a non-streaming request and deserialize the response as JSON.
    pub async fn post(&self, body: &impl Serialize) -> Result<Response> {
        tracing::trace!("request: {}", serde_json::to_string(body)?);
        let response = self
            .client
            .request(Method::POST, &self.endpoint)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            bail!("provider responded with {status}: {text}");
        }
        serde_json::from_str(&text).map_err(Into::into)
    }

    /// Stream an SSE response (OpenAI-compatible format).
    pub fn stream_sse<B: Serialize>(
        &self,
        body: &B,
    ) -> impl Stream<Item = Result<StreamChunk>> + Send + use<B> {
        if let Ok(body) = serde_json::to_string(body) {
            tracing::trace!("request: {}", body);
        }
        let request = self
            .client
            .request(Method::POST, &self.endpoint)
            .headers(self.headers.clone())
            .json(body);

        try_stream! {
            let response = request.send().await?;
            let status = response.status();
            tracing::debug!("provider responded with status: {status}");
            if status.is_success() {
                let chunks = sse::decode(response.bytes_stream());
                futures_util::pin_mut!(chunks);
                while let Some(chunk) = chunks.next().await {
                    yield chunk?;
                }
            } else {
                let text = response.text().await.unwrap_or_default();
                Err(anyhow::anyhow!("provider responded with {status}: {text}"))?;
            }
        }
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl Model for HttpProvider {
    async fn send(&self, request: &Request) -> Result<Response> {
        self.post(&Body::from(request)).await
    }

    fn stream(&self, request: Request) -> impl Stream<Item = Result<StreamChunk>> + Send {
        self.stream_sse(&Body::from(&request).stream())
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}
