//! Scout runtime: the function-calling orchestration loop.
//!
//! The [`Runtime`] is the entry point. It holds the provider factory, the
//! function registry and the turn limits, and builds one [`Turn`] per
//! inbound chat request, or a [`GridAction`] for the non-streaming grid
//! requests.
//!
//! # Example
//!
//! ```rust,ignore
//! use scout_runtime::Runtime;
//! use scout_model::Providers;
//!
//! let runtime = Runtime::new(Providers::from_configs(&configs)?, registry);
//! let turn = runtime.turn(Message::system("You are helpful."), request)?;
//! let mut frames = turn.spawn();
//! while let Some(frame) = frames.recv().await {
//!     print!("{}", frame.encode()?);
//! }
//! ```

pub use channel::{Disconnected, Frame, SideChannel, channel};
pub use dispatch::{CallError, DEFAULT_CALL_TIMEOUT, Dispatcher};
pub use gateway::{Output, invoke};
pub use grid::{Column, FALLBACK_ANSWER, GRID_MODEL, GridAction};
pub use turn::{Limits, MAX_ROUNDS, Turn, TurnError};

use anyhow::Result;
use ccore::{ChatRequest, Message, ModelFactory, Registry, Settings};
use std::sync::Arc;

mod channel;
mod dispatch;
pub mod gateway;
mod grid;
mod turn;

/// The scout runtime: builds turns from a shared registry and provider
/// factory.
pub struct Runtime<F: ModelFactory> {
    factory: F,
    registry: Arc<Registry>,
    limits: Limits,
}

impl<F: ModelFactory> Runtime<F> {
    /// Create a runtime with default limits.
    pub fn new(factory: F, registry: Registry) -> Self {
        Self {
            factory,
            registry: Arc::new(registry),
            limits: Limits::default(),
        }
    }

    /// Override the turn limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The function registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The turn limits.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Build a turn for a chat request.
    ///
    /// The provider client is selected once, from the request settings.
    pub fn turn(&self, system: Message, request: ChatRequest) -> Result<Turn<F::Model>> {
        let model = self.factory.select(request.data.settings.provider)?;
        Ok(Turn::new(model, self.registry.clone(), system, request).with_limits(self.limits))
    }

    /// Bind grid actions to the provider named in `settings`.
    pub fn grid(&self, settings: &Settings) -> Result<GridAction<F::Model>> {
        let model = self.factory.select(settings.provider)?;
        Ok(GridAction::new(model, self.registry.clone(), settings).with_limits(self.limits))
    }
}
