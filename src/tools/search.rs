//! Web search tool backed by the Tavily search API
//!
//! Results are rendered as markdown blocks so agents can quote the source link
//! of every claim verbatim.

use crate::tools::registry::{required_str, Tool};
use crate::types::{AppError, Result, RunContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One record returned by the search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub url: String,
}

/// External web-search service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Render provider records as citation-ready blocks, in provider order
pub fn format_search_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "\n### {}\n{}\n##### [Source]({})\n---\n",
                r.title, r.content, r.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Search(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| AppError::Search(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Search(format!(
                "Tavily request failed ({}): {}",
                status, text
            )));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse response: {}", e)))?;

        debug!(query, results = body.results.len(), "Search completed");
        Ok(body.results)
    }
}

/// `web_search` tool
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web using Tavily."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, _ctx: &RunContext, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?;
        let results = self.provider.search(query).await?;
        Ok(Value::String(format_search_results(&results)))
    }
}
