//! Model provider traits.

use crate::{ProviderKind, Request, Response, StreamChunk};
use anyhow::Result;
use futures_core::Stream;

/// A chat completion provider.
///
/// Implementations are cheap to clone and shared across turns. Constructors
/// are inherent methods on each provider, never called polymorphically.
pub trait Model: Clone + Send + Sync + 'static {
    /// Send a chat completion request.
    fn send(&self, request: &Request) -> impl Future<Output = Result<Response>> + Send;

    /// Stream a chat completion response.
    fn stream(&self, request: Request) -> impl Stream<Item = Result<StreamChunk>> + Send;
}

/// Hands out a provider client for a turn.
///
/// Injected once at startup; each turn selects its client from the
/// provider named in its settings.
pub trait ModelFactory: Send + Sync + 'static {
    /// The provider client type.
    type Model: Model;

    /// Select the client for a provider.
    fn select(&self, kind: ProviderKind) -> Result<Self::Model>;
}
