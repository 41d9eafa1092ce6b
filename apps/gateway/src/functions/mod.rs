//! The default function pack.
//!
//! GitHub retrieval functions plus image analysis. Each executor parses
//! its arguments from the JSON the dispatcher hands it and returns JSON.

use crate::config::GatewayConfig;
use anyhow::Result;
use ccore::{IMAGE_FUNCTION, ProviderKind, Registry, Tool};
use model::{Client, Providers};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

pub use github::GitHub;
pub use image::Vision;

mod github;
mod image;

/// Arguments of `codeSearch`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CodeSearch {
    /// The query to search for, in GitHub code search syntax.
    pub query: String,
    /// Result page, starting at 1.
    #[serde(default)]
    pub page: Option<u32>,
}

/// Arguments of `getIssue`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetIssue {
    /// Repository as `owner/name`.
    pub repo: String,
    /// Issue or pull request number.
    pub number: u64,
}

/// Arguments of `listIssues`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListIssues {
    /// Repository as `owner/name`.
    pub repo: String,
    /// Filter by state.
    #[serde(default)]
    pub state: Option<IssueState>,
}

/// Issue state filter.
#[derive(Debug, Default, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// Open issues.
    #[default]
    Open,
    /// Closed issues.
    Closed,
    /// Both.
    All,
}

impl IssueState {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Arguments of `analyzeImage`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImage {
    /// What to find out about the image.
    pub prompt: String,
    /// URL of the image.
    pub image_url: String,
}

/// Register the GitHub retrieval functions.
pub fn register_github(registry: &mut Registry, github: GitHub) {
    let search = github.clone();
    registry.register(
        Tool::new::<CodeSearch>(
            "codeSearch",
            "Retrieves a paginated list of code snippets or files in repositories.",
        ),
        move |args| {
            let github = search.clone();
            async move {
                let args: CodeSearch = serde_json::from_value(args)?;
                github.search_code(&args.query, args.page.unwrap_or(1)).await
            }
        },
    );

    let issue = github.clone();
    registry.register(
        Tool::new::<GetIssue>(
            "getIssue",
            "Retrieves an issue or pull request with its description.",
        ),
        move |args| {
            let github = issue.clone();
            async move {
                let args: GetIssue = serde_json::from_value(args)?;
                github.issue(&args.repo, args.number).await
            }
        },
    );

    registry.register(
        Tool::new::<ListIssues>("listIssues", "Lists the latest issues of a repository."),
        move |args| {
            let github = github.clone();
            async move {
                let args: ListIssues = serde_json::from_value(args)?;
                let state = args.state.unwrap_or_default();
                github.issues(&args.repo, state.as_str()).await
            }
        },
    );
}

/// Register the image analysis function.
pub fn register_vision(registry: &mut Registry, vision: Vision) {
    registry.register(
        Tool::new::<AnalyzeImage>(
            IMAGE_FUNCTION,
            "Answers a question about the image the user attached.",
        ),
        move |args| {
            let vision = vision.clone();
            async move {
                let args: AnalyzeImage = serde_json::from_value(args)?;
                let answer = vision.analyze(&args.prompt, &args.image_url).await?;
                Ok::<Value, anyhow::Error>(json!(answer))
            }
        },
    );
}

/// Build the registry of the default function pack.
///
/// Image analysis needs the OpenAI provider and is left out without it.
pub fn registry(config: &GatewayConfig, providers: &Providers) -> Result<Registry> {
    let mut registry = Registry::new();
    register_github(&mut registry, GitHub::new(Client::new(), &config.github)?);
    match providers.get(ProviderKind::OpenAI) {
        Some(provider) => {
            register_vision(&mut registry, Vision::new(provider.clone(), &config.vision))
        }
        None => tracing::warn!("openai provider not configured, {IMAGE_FUNCTION} disabled"),
    }
    Ok(registry)
}
