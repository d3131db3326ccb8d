#![cfg(test)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::accumulator::RankingObserver;
use crate::error::{LangStatsError, Result};
use crate::github::RepoDataProvider;
use crate::languages::{LanguageBytes, LanguageTotals, RankedEntry, RepositorySummary};

pub fn bytes_from(pairs: &[(&str, u64)]) -> LanguageBytes {
    pairs.iter().map(|(l, b)| (*l, *b)).collect()
}

pub fn totals_from(pairs: &[(&str, u64)]) -> LanguageTotals {
    let mut totals = LanguageTotals::default();
    totals.apply("fixture", &bytes_from(pairs)).unwrap();
    totals
}

pub fn make_repo(name: &str, fork: bool) -> RepositorySummary {
    RepositorySummary {
        name: name.to_string(),
        fork,
        languages_url: languages_url(name),
    }
}

pub fn languages_url(name: &str) -> String {
    format!("https://api.example.test/repos/octo/{name}/languages")
}

/// Collects every ranking it is handed.
#[derive(Default)]
pub struct RecordingObserver {
    seen: Arc<Mutex<Vec<Vec<RankedEntry>>>>,
}

impl RecordingObserver {
    pub fn handle(&self) -> Arc<Mutex<Vec<Vec<RankedEntry>>>> {
        Arc::clone(&self.seen)
    }
}

impl RankingObserver for RecordingObserver {
    fn on_ranking(&mut self, ranking: &[RankedEntry]) -> Result<()> {
        self.seen.lock().unwrap().push(ranking.to_vec());
        Ok(())
    }
}

enum Canned {
    Body(Value),
    Status(u16),
}

/// In-memory provider with optional per-url latency to shuffle completions.
#[derive(Default)]
pub struct FakeProvider {
    repos: Option<Vec<RepositorySummary>>,
    languages: HashMap<String, (Canned, Duration)>,
    requested: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeProvider {
    pub fn with_repos(repos: Vec<RepositorySummary>) -> Self {
        Self {
            repos: Some(repos),
            ..Self::default()
        }
    }

    pub fn with_languages(mut self, repo: &str, body: Value, delay_ms: u64) -> Self {
        self.languages.insert(
            languages_url(repo),
            (Canned::Body(body), Duration::from_millis(delay_ms)),
        );
        self
    }

    pub fn failing(mut self, repo: &str, status: u16) -> Self {
        self.languages.insert(
            languages_url(repo),
            (Canned::Status(status), Duration::ZERO),
        );
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Highest number of `languages` calls that were running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoDataProvider for FakeProvider {
    async fn list_repos(&self, account: &str) -> Result<Vec<RepositorySummary>> {
        self.repos.clone().ok_or_else(|| LangStatsError::Status {
            url: format!("/users/{account}/repos"),
            status: 404,
        })
    }

    async fn languages(&self, url: &str) -> Result<Value> {
        self.requested.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = match self.languages.get(url) {
            Some((Canned::Body(body), delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(body.clone())
            }
            Some((Canned::Status(status), _)) => Err(LangStatsError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(LangStatsError::fetch(url, "connection refused")),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Minimal HTTP/1.1 server on a loopback port. Answers one connection per
/// canned `(status, body)` in order and keeps the request heads it saw.
pub struct StubServer {
    pub base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn spawn(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };

                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                seen.lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&head).to_lowercase());

                let reason = reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown");
                let resp = format!(
                    "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });

        Self { base, requests }
    }

    /// Request heads received so far, lowercased.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}
