use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{LangStatsError, Result};
use crate::languages::RepositorySummary;

/// Source of repository listings and per-repository language byte counts.
#[async_trait]
pub trait RepoDataProvider: Send + Sync {
    /// Repositories owned by `account`, forks included.
    async fn list_repos(&self, account: &str) -> Result<Vec<RepositorySummary>>;

    /// Raw body of a repository's `languages_url`.
    async fn languages(&self, url: &str) -> Result<Value>;
}

#[derive(Clone)]
pub struct GithubClient {
    http: Arc<Client>,
    api_base: Arc<String>,
    max_attempts: usize,
}

/// What to do after a non-success response.
#[derive(Debug, PartialEq, Eq)]
enum Retry {
    After(Duration),
    GiveUp,
}

impl GithubClient {
    /// Create a REST client from the resolved configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let agent = config.user_agent();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(agent)
                .map_err(|e| LangStatsError::Config(format!("invalid user agent {agent:?}: {e}")))?,
        );

        if let Some(token) = config.github_token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|e| LangStatsError::Config(format!("invalid github token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LangStatsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http: Arc::new(http),
            api_base: Arc::new(config.api_base.trim_end_matches('/').to_string()),
            max_attempts: config.max_attempts,
        })
    }

    pub fn repos_url(&self, account: &str) -> String {
        format!("{}/users/{account}/repos?per_page=100", self.api_base)
    }

    /// GET `url` and decode the JSON body, retrying rate limits and server
    /// errors a bounded number of times.
    async fn get_json(&self, url: &str) -> Result<Value> {
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let resp = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| LangStatsError::fetch(url, e))?;

            let status = resp.status();
            if status.is_success() {
                return resp
                    .json::<Value>()
                    .await
                    .map_err(|e| LangStatsError::fetch(url, format!("invalid JSON body: {e}")));
            }

            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());

            match retry_decision(status, retry_after, attempt, self.max_attempts) {
                Retry::After(wait) => {
                    warn!(
                        url,
                        status = status.as_u16(),
                        attempt,
                        "retrying in {}ms",
                        wait.as_millis()
                    );
                    sleep(wait).await;
                }
                Retry::GiveUp => {
                    return Err(LangStatsError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
            }
        }
    }
}

/// `attempt` counts from 1 and includes the first request, so at most
/// `max_attempts` requests are made. 429 honours `Retry-After` (default 2s);
/// 5xx backs off exponentially from 250ms. Everything else fails immediately.
fn retry_decision(
    status: StatusCode,
    retry_after: Option<u64>,
    attempt: usize,
    max_attempts: usize,
) -> Retry {
    if attempt >= max_attempts {
        return Retry::GiveUp;
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Retry::After(Duration::from_secs(retry_after.unwrap_or(2)));
    }

    if status.is_server_error() {
        let shift = (attempt - 1).min(16) as u32;
        return Retry::After(Duration::from_millis(250u64.saturating_mul(1 << shift)));
    }

    Retry::GiveUp
}

#[async_trait]
impl RepoDataProvider for GithubClient {
    async fn list_repos(&self, account: &str) -> Result<Vec<RepositorySummary>> {
        let url = self.repos_url(account);
        let json = self.get_json(&url).await?;
        let repos: Vec<RepositorySummary> = serde_json::from_value(json)
            .map_err(|e| LangStatsError::fetch(&url, format!("unexpected repository list: {e}")))?;

        debug!(account, count = repos.len(), "listed repositories");
        Ok(repos)
    }

    async fn languages(&self, url: &str) -> Result<Value> {
        self.get_json(url).await
    }
}
