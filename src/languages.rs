//! languages.rs
//!
//! Data model for language usage: the per-repository byte counts reported by
//! GitHub, the running totals they are folded into, and the ranked entries
//! derived from those totals.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{LangStatsError, Result};

/// One repository as listed by `GET /users/{user}/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    #[serde(default)]
    pub fork: bool,
    pub languages_url: String,
}

/// Validated byte counts of a single repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageBytes(Vec<(String, u64)>);

impl LanguageBytes {
    /// Parse the body of a `languages_url` response.
    ///
    /// GitHub answers with a flat object `{"Rust": 1234, "Shell": 56}`. Every
    /// value must be a non-negative integer; anything else rejects the whole
    /// payload so a malformed repository never leaks partial counts.
    pub fn parse(repo: &str, raw: &Value) -> Result<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| LangStatsError::invalid(repo, "expected a JSON object"))?;

        let mut out = Vec::with_capacity(obj.len());
        for (lang, v) in obj {
            let bytes = match v {
                Value::Number(n) => n.as_u64().ok_or_else(|| {
                    LangStatsError::invalid(
                        repo,
                        format!("byte count for {lang} is not a non-negative integer: {n}"),
                    )
                })?,
                other => {
                    return Err(LangStatsError::invalid(
                        repo,
                        format!("byte count for {lang} is not numeric: {other}"),
                    ));
                }
            };
            out.push((lang.clone(), bytes));
        }

        Ok(Self(out))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(l, b)| (l.as_str(), *b))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of this repository's byte counts, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, (_, b)| acc.saturating_add(*b))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for LanguageBytes {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(l, b)| (l.into(), b)).collect())
    }
}

/// Running byte totals keyed by language name.
///
/// Only the accumulator can add to it; everyone else gets a read-only view.
/// The sum of all totals always fits in a `u64`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageTotals {
    totals: HashMap<String, u64>,
    grand_total: u64,
}

impl LanguageTotals {
    pub fn get(&self, language: &str) -> Option<u64> {
        self.totals.get(language).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.totals.iter().map(|(l, b)| (l.as_str(), *b))
    }

    /// Sum of every language total.
    pub fn grand_total(&self) -> u64 {
        self.grand_total
    }

    /// Add `bytes` to this map as one unit. Fails without touching anything
    /// if any language total, or the sum of all of them, would overflow.
    pub(crate) fn apply(&mut self, repo: &str, bytes: &LanguageBytes) -> Result<()> {
        let mut grand = self.grand_total;
        let mut staged: HashMap<&str, u64> = HashMap::with_capacity(bytes.0.len());
        for (lang, add) in bytes.iter() {
            let current = staged
                .get(lang)
                .copied()
                .or_else(|| self.get(lang))
                .unwrap_or(0);
            let next = current.checked_add(add).ok_or_else(|| {
                LangStatsError::invalid(repo, format!("total for {lang} overflows"))
            })?;
            grand = grand.checked_add(add).ok_or_else(|| {
                LangStatsError::invalid(repo, "sum of all language totals overflows")
            })?;
            staged.insert(lang, next);
        }

        for (lang, next) in staged {
            self.totals.insert(lang.to_string(), next);
        }
        self.grand_total = grand;
        Ok(())
    }
}

/// A language and its accumulated byte count.
///
/// Serialises as a two-element array, `["Rust", 1234]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry(pub String, pub u64);

impl RankedEntry {
    pub fn language(&self) -> &str {
        &self.0
    }

    pub fn bytes(&self) -> u64 {
        self.1
    }

    /// Percentage of `total`, 0.0 when `total` is zero.
    pub fn share_of(&self, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            self.1 as f64 * 100.0 / total as f64
        }
    }
}
