//! OpenAI-compatible providers for the Scout runtime.
//!
//! [`HttpProvider`] speaks the chat completions wire format over HTTP and
//! implements [`ccore::Model`]. [`Providers`] is the factory the gateway
//! injects into each turn, keyed by [`ccore::ProviderKind`].

pub use http::{HttpProvider, OPENAI_ENDPOINT};
pub use provider::{ProviderConfig, Providers};
pub use request::Body;
pub use reqwest::{self, Client};
pub use sse::decode;

mod http;
mod provider;
mod request;
mod sse;
