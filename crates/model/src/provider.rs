//! Provider configuration and the per-turn provider factory.

use crate::{HttpProvider, http::OPENAI_ENDPOINT};
use anyhow::{Result, bail};
use ccore::{ModelFactory, ProviderKind};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Connection settings of one provider.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// API key (supports `${ENV_VAR}` expansion in the config file).
    #[serde(default)]
    pub api_key: String,
    /// Base URL; `/chat/completions` is appended. Required for Azure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Resolve the chat completions endpoint for a provider kind.
    pub fn endpoint(&self, kind: ProviderKind) -> Result<String> {
        match (&self.base_url, kind) {
            (Some(base), _) => Ok(format!("{}/chat/completions", base.trim_end_matches('/'))),
            (None, ProviderKind::OpenAI) => Ok(OPENAI_ENDPOINT.to_owned()),
            (None, ProviderKind::Azure) => bail!("azure provider requires a base_url"),
        }
    }
}

/// Provider clients keyed by kind.
///
/// Built once at startup and shared by all turns; each turn clones the
/// client named in its settings.
#[derive(Clone, Default)]
pub struct Providers {
    providers: BTreeMap<ProviderKind, HttpProvider>,
}

impl Providers {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client from its config.
    pub fn build(
        kind: ProviderKind,
        config: &ProviderConfig,
        client: Client,
    ) -> Result<HttpProvider> {
        let endpoint = config.endpoint(kind)?;
        match kind {
            ProviderKind::OpenAI => HttpProvider::bearer(client, &config.api_key, &endpoint),
            ProviderKind::Azure => HttpProvider::azure(client, &config.api_key, &endpoint),
        }
    }

    /// Build clients for every configured provider, sharing one HTTP client.
    pub fn from_configs(configs: &BTreeMap<ProviderKind, ProviderConfig>) -> Result<Self> {
        let client = Client::new();
        let mut providers = Self::new();
        for (kind, config) in configs {
            providers.insert(*kind, Self::build(*kind, config, client.clone())?);
            tracing::info!("provider {} configured", kind.as_str());
        }
        Ok(providers)
    }

    /// Add or replace a client.
    pub fn insert(&mut self, kind: ProviderKind, provider: HttpProvider) {
        self.providers.insert(kind, provider);
    }

    /// Get a client by kind.
    pub fn get(&self, kind: ProviderKind) -> Option<&HttpProvider> {
        self.providers.get(&kind)
    }

    /// Configured provider kinds.
    pub fn kinds(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.providers.keys().copied()
    }
}

impl ModelFactory for Providers {
    type Model = HttpProvider;

    fn select(&self, kind: ProviderKind) -> Result<HttpProvider> {
        match self.providers.get(&kind) {
            Some(provider) => Ok(provider.clone()),
            None => bail!("provider '{}' is not configured", kind.as_str()),
        }
    }
}
