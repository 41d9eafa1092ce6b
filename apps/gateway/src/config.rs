//! Gateway configuration loaded from TOML.

use anyhow::{Context, Result};
use ccore::ProviderKind;
use model::ProviderConfig;
use runtime::{Limits, MAX_ROUNDS};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

/// Config directory name under the platform config dir.
pub const CONFIG_DIR: &str = "scout";
/// Config file name.
pub const CONFIG_FILE: &str = "gateway.toml";
/// Default GitHub API root.
pub const GITHUB_API: &str = "https://api.github.com";

/// Resolve the global configuration directory (`~/.config/scout/` on unix).
pub fn global_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR))
        .context("no platform config directory")
}

/// Top-level gateway configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// System prompt configuration.
    #[serde(default)]
    pub prompt: PromptConfig,
    /// Turn limits.
    #[serde(default)]
    pub turn: TurnConfig,
    /// Completion providers.
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// GitHub API access for the retrieval functions.
    #[serde(default)]
    pub github: GithubConfig,
    /// Image analysis.
    #[serde(default)]
    pub vision: VisionConfig,
}

/// Server configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        }
    }
}

/// System prompt configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Base system prompt, the built-in one when empty.
    pub system: String,
}

/// Turn limits.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Dispatch rounds before function calling is disabled.
    pub max_rounds: usize,
    /// Timeout of a single function call, in seconds.
    pub call_timeout_secs: u64,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_rounds: MAX_ROUNDS,
            call_timeout_secs: runtime::DEFAULT_CALL_TIMEOUT.as_secs(),
        }
    }
}

/// Completion providers, each optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenAI API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderConfig>,
    /// Azure OpenAI deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<ProviderConfig>,
}

impl ProvidersConfig {
    /// The configured providers keyed by kind.
    pub fn configs(&self) -> BTreeMap<ProviderKind, ProviderConfig> {
        [
            (ProviderKind::OpenAI, &self.openai),
            (ProviderKind::Azure, &self.azure),
        ]
        .into_iter()
        .filter_map(|(kind, config)| Some((kind, config.clone()?)))
        .collect()
    }
}

/// GitHub API access.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Access token (supports `${ENV_VAR}` expansion), anonymous when empty.
    pub token: String,
    /// API root.
    pub base_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: GITHUB_API.to_owned(),
        }
    }
}

/// Image analysis configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Vision-capable model, served by the OpenAI provider.
    pub model: String,
    /// Completion token cap of one analysis.
    pub max_tokens: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_owned(),
            max_tokens: 300,
        }
    }
}

impl GatewayConfig {
    /// Parse a TOML string, expanding `${ENV_VAR}` patterns first.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let expanded = crate::utils::expand_env_vars(toml_str);
        let config: Self = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// The `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Turn limits for the runtime.
    pub fn limits(&self) -> Limits {
        Limits {
            max_rounds: self.turn.max_rounds,
            call_timeout: Duration::from_secs(self.turn.call_timeout_secs),
        }
    }

    /// The configuration written by `scout init`.
    pub fn scaffold() -> Self {
        Self {
            providers: ProvidersConfig {
                openai: Some(ProviderConfig {
                    api_key: "${OPENAI_API_KEY}".to_owned(),
                    base_url: None,
                }),
                azure: None,
            },
            github: GithubConfig {
                token: "${GITHUB_TOKEN}".to_owned(),
                ..GithubConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Write the default configuration file into `config_dir`.
///
/// An existing file is kept unless `force` is set. Returns the file path.
pub fn scaffold_config(config_dir: &Path, force: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("failed to create {}", config_dir.display()))?;

    let path = config_dir.join(CONFIG_FILE);
    if path.exists() && !force {
        tracing::info!("keeping existing {}", path.display());
        return Ok(path);
    }

    let contents = toml::to_string_pretty(&GatewayConfig::scaffold())
        .context("failed to serialize default config")?;
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
