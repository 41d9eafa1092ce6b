//! The static function registry.
//!
//! Maps a function name to its schema and executor. Populated once at
//! startup, then shared read-only by every turn.

use crate::Tool;
use anyhow::Result;
use compact_str::CompactString;
use serde_json::Value;
use std::{collections::BTreeMap, fmt, pin::Pin, sync::Arc};

/// A type-erased async function executor.
///
/// Receives the parsed arguments and resolves to the produced value, or an
/// error which the dispatcher turns into an error result.
pub type Handler =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send>> + Send + Sync>;

/// Registered functions, keyed by name.
#[derive(Clone, Default)]
pub struct Registry {
    functions: BTreeMap<CompactString, (Tool, Handler)>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function with its executor, replacing any previous one
    /// with the same name.
    pub fn register<F, Fut>(&mut self, tool: Tool, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let name = tool.name.clone();
        let handler: Handler = Arc::new(move |args| Box::pin(handler(args)));
        self.functions.insert(name, (tool, handler));
    }

    /// Look up a function by name.
    pub fn get(&self, name: &str) -> Option<(&Tool, &Handler)> {
        self.functions.get(name).map(|(tool, handler)| (tool, handler))
    }

    /// Schema of a function by name.
    pub fn schema(&self, name: &str) -> Option<&Tool> {
        self.functions.get(name).map(|(tool, _)| tool)
    }

    /// Resolve schemas for the given names, in the given order.
    ///
    /// Unknown and duplicate names are skipped.
    pub fn resolve(&self, names: &[CompactString]) -> Vec<Tool> {
        let mut tools: Vec<Tool> = Vec::with_capacity(names.len());
        for name in names {
            if tools.iter().any(|t| &t.name == name) {
                continue;
            }
            match self.schema(name) {
                Some(tool) => tools.push(tool.clone()),
                None => tracing::warn!("function {name} is not registered, skipping"),
            }
        }
        tools
    }

    /// All registered schemas, ordered by name.
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.functions.values().map(|(tool, _)| tool)
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no function is registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.functions.keys()).finish()
    }
}
