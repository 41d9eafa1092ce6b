//! GitHub REST client used by the retrieval functions.

use crate::config::GithubConfig;
use anyhow::{Result, bail};
use reqwest::{
    Client,
    header::{self, HeaderMap, HeaderValue},
};
use serde::Serialize;
use serde_json::{Value, json};

/// Results per page of a listing.
const PER_PAGE: u32 = 10;

/// A cheap-to-clone GitHub API client.
#[derive(Clone)]
pub struct GitHub {
    client: Client,
    headers: HeaderMap,
    base_url: String,
}

impl GitHub {
    /// Create a client from its config; anonymous when no token is set.
    pub fn new(client: Client, config: &GithubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(header::USER_AGENT, HeaderValue::from_static("scout"));
        if !config.token.is_empty() {
            headers.insert(
                header::AUTHORIZATION,
                format!("Bearer {}", config.token).parse()?,
            );
        }

        Ok(Self {
            client,
            headers,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// The API root requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search code across repositories.
    pub async fn search_code(&self, query: &str, page: u32) -> Result<Value> {
        let found = self
            .get(
                "/search/code",
                &[
                    ("q", query.to_owned()),
                    ("page", page.to_string()),
                    ("per_page", PER_PAGE.to_string()),
                ],
            )
            .await?;

        let items = found["items"].as_array().cloned().unwrap_or_default();
        Ok(json!({
            "total": found["total_count"],
            "page": page,
            "items": items
                .iter()
                .map(|item| {
                    json!({
                        "repository": item["repository"]["full_name"],
                        "path": item["path"],
                        "url": item["html_url"],
                    })
                })
                .collect::<Vec<_>>(),
        }))
    }

    /// Fetch an issue or pull request.
    pub async fn issue(&self, repo: &str, number: u64) -> Result<Value> {
        let issue = self
            .get(&format!("/repos/{repo}/issues/{number}"), &[] as &[(&str, &str)])
            .await?;
        Ok(summary(&issue, true))
    }

    /// List the issues of a repository.
    pub async fn issues(&self, repo: &str, state: &str) -> Result<Value> {
        let issues = self
            .get(
                &format!("/repos/{repo}/issues"),
                &[
                    ("state", state.to_owned()),
                    ("per_page", PER_PAGE.to_string()),
                ],
            )
            .await?;

        let issues = issues.as_array().cloned().unwrap_or_default();
        Ok(Value::Array(
            issues.iter().map(|issue| summary(issue, false)).collect(),
        ))
    }

    async fn get<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!("github request: {url}");
        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("github responded with {status}: {text}");
        }
        Ok(response.json().await?)
    }
}

/// The fields of an issue worth handing to the model.
fn summary(issue: &Value, body: bool) -> Value {
    let mut out = json!({
        "number": issue["number"],
        "title": issue["title"],
        "state": issue["state"],
        "author": issue["user"]["login"],
        "comments": issue["comments"],
        "pullRequest": issue.get("pull_request").is_some(),
        "url": issue["html_url"],
    });
    if body {
        out["body"] = issue["body"].clone();
    }
    out
}
