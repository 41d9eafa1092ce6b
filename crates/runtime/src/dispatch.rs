//! Function dispatch.
//!
//! The [`Dispatcher`] executes the call requests of one model invocation
//! against the registry. Every call is timed and bounded by a timeout, and
//! every failure becomes an error result instead of aborting the turn.

use ccore::{CallRequest, CallResult, IMAGE_FUNCTION, Registry, Strategy, signature};
use compact_str::CompactString;
use futures_core::Stream;
use futures_util::{StreamExt, stream::FuturesUnordered};
use serde_json::{Map, Value};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Default bound on a single call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Why a call produced an error result.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The raw arguments were not valid JSON.
    #[error("invalid arguments for {name}: {source}")]
    Arguments {
        name: CompactString,
        source: serde_json::Error,
    },
    /// The executor failed.
    #[error("{0:#}")]
    Execution(anyhow::Error),
    /// The executor did not settle in time.
    #[error("function {name} timed out after {}s", .after.as_secs())]
    Timeout { name: CompactString, after: Duration },
    /// The function is unknown or was not offered this turn.
    #[error("function {0} not available")]
    Unavailable(CompactString),
}

/// Image attachment of the turn.
#[derive(Debug, Clone)]
struct Image {
    url: String,
    prompt: String,
}

/// Executes call requests against the registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    strategy: Strategy,
    functions: Vec<CompactString>,
    image: Option<Image>,
    timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher for one turn.
    ///
    /// No function is callable until it is enabled with
    /// [`Dispatcher::with_functions`].
    pub fn new(registry: Arc<Registry>, strategy: Strategy) -> Self {
        Self {
            registry,
            strategy,
            functions: Vec::new(),
            image: None,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Set the functions offered to the model this turn.
    pub fn with_functions(mut self, functions: Vec<CompactString>) -> Self {
        self.functions = functions;
        self
    }

    /// Attach an image for the image-analysis function.
    ///
    /// `prompt` is used when the model gave no prompt of its own.
    pub fn with_image(mut self, url: impl Into<String>, prompt: impl Into<String>) -> Self {
        self.image = Some(Image {
            url: url.into(),
            prompt: prompt.into(),
        });
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The protocol calls are dispatched under.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Start every request and yield the results in settle order.
    ///
    /// Requests run concurrently and a failing call never affects its
    /// siblings. The stream ends once all of them settled. Under the serial
    /// protocol only the first request is executed.
    pub fn settle(
        &self,
        mut requests: Vec<CallRequest>,
    ) -> impl Stream<Item = CallResult> + Send + '_ {
        if self.strategy == Strategy::Serial && requests.len() > 1 {
            tracing::warn!("dropping {} extra serial calls", requests.len() - 1);
            requests.truncate(1);
        }

        requests
            .into_iter()
            .enumerate()
            .map(|(position, request)| self.call(position, request))
            .collect::<FuturesUnordered<_>>()
    }

    /// Execute every request and wait for all of them.
    ///
    /// Results are ordered by request position.
    pub async fn execute(&self, requests: Vec<CallRequest>) -> Vec<CallResult> {
        let mut results: Vec<_> = self.settle(requests).collect().await;
        results.sort_by_key(|result| result.position);
        results
    }

    async fn call(&self, position: usize, request: CallRequest) -> CallResult {
        let started = Instant::now();
        let arguments = self.arguments(&request);
        let signature = match &arguments {
            Ok(arguments) => signature(&request.name, arguments),
            Err(_) => signature(&request.name, &Value::Null),
        };
        tracing::debug!("calling {signature}");

        let (arguments, outcome) = match arguments {
            Ok(arguments) => {
                let outcome = self.run(&request.name, arguments.clone()).await;
                (arguments, outcome)
            }
            Err(e) => (Value::Null, Err(e)),
        };

        let elapsed = started.elapsed();
        let (value, success) = match outcome {
            Ok(value) => {
                tracing::debug!("{signature} settled in {}ms", elapsed.as_millis());
                (value, true)
            }
            Err(e) => {
                tracing::warn!("{signature} failed: {e}");
                (Value::String(e.to_string()), false)
            }
        };

        CallResult {
            id: request.id,
            position,
            schema: self.registry.schema(&request.name).cloned(),
            name: request.name,
            signature,
            arguments,
            value,
            success,
            elapsed,
            strategy: self.strategy,
        }
    }

    /// Parse the raw arguments, filling in the image attachment.
    fn arguments(&self, request: &CallRequest) -> Result<Value, CallError> {
        let raw = request.arguments.trim();
        let mut arguments = if raw.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(raw).map_err(|source| CallError::Arguments {
                name: request.name.clone(),
                source,
            })?
        };

        if request.name == IMAGE_FUNCTION
            && let Some(image) = &self.image
        {
            image.fill(&mut arguments);
        }
        Ok(arguments)
    }

    async fn run(&self, name: &str, arguments: Value) -> Result<Value, CallError> {
        let handler = match self.registry.get(name) {
            Some((_, handler)) if self.functions.iter().any(|f| f == name) => handler.clone(),
            _ => return Err(CallError::Unavailable(name.into())),
        };

        match tokio::time::timeout(self.timeout, handler(arguments)).await {
            Ok(result) => result.map_err(CallError::Execution),
            Err(_) => Err(CallError::Timeout {
                name: name.into(),
                after: self.timeout,
            }),
        }
    }
}

impl Image {
    /// Set the image URL and, when the model gave none, the prompt.
    fn fill(&self, arguments: &mut Value) {
        if !arguments.is_object() {
            *arguments = Value::Object(Map::new());
        }
        let Some(object) = arguments.as_object_mut() else {
            return;
        };

        object.insert("imageUrl".into(), Value::String(self.url.clone()));
        let explicit = object
            .get("prompt")
            .and_then(Value::as_str)
            .is_some_and(|prompt| !prompt.trim().is_empty());
        if !explicit {
            object.insert("prompt".into(), Value::String(self.prompt.clone()));
        }
    }
}
