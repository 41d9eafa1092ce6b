//! Server-sent events decoding for streamed completions.

use anyhow::Result;
use async_stream::try_stream;
use ccore::StreamChunk;
use eventsource_stream::Eventsource;
use futures_core::Stream;
use futures_util::StreamExt;
use std::fmt::Display;

/// Sentinel the API sends after the last chunk.
const DONE: &str = "[DONE]";

/// Decode a raw SSE byte stream into completion chunks.
///
/// Events may be split across network reads; the decoder buffers until a
/// whole event arrived. Undecodable events are logged and skipped, the
/// `[DONE]` sentinel ends the stream.
pub fn decode<S, B, E>(bytes: S) -> impl Stream<Item = Result<StreamChunk>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    try_stream! {
        let events = bytes.eventsource();
        futures_util::pin_mut!(events);
        let mut count = 0usize;
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| anyhow::anyhow!("event stream error: {e}"))?;
            let data = event.data.trim();
            if data == DONE {
                tracing::debug!("received [DONE] after {count} chunks");
                break;
            }
            if data.is_empty() {
                continue;
            }
            match serde_json::from_str::<StreamChunk>(data) {
                Ok(chunk) => {
                    count += 1;
                    yield chunk;
                }
                Err(e) => tracing::warn!("failed to parse chunk: {e}, data: {data}"),
            }
        }
    }
}
