use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{LangStatsError, Result};

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub username: Option<String>,
    pub github_token: Option<String>,
    pub api_base: String,
    pub user_agent: Option<String>,
    pub concurrency: usize,
    pub timeout_secs: u64,
    /// Requests per URL including the first one.
    pub max_attempts: usize,
    pub output_dir: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            github_token: None,
            api_base: "https://api.github.com".to_string(),
            user_agent: None,
            concurrency: 8,
            timeout_secs: 30,
            max_attempts: 4,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Command-line values that take precedence over every other layer.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Layer defaults, the TOML file, `LANGSTATS_*` / `GITHUB_TOKEN` env vars
    /// and CLI overrides, in that order.
    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let default_file = config_dir().join("langstats").join("config.toml");
        let file = config_file.unwrap_or(default_file.as_path());

        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if file.exists() {
            figment = figment.merge(Toml::file(file));
        } else if config_file.is_some() {
            return Err(LangStatsError::Config(format!(
                "config file {} does not exist",
                file.display()
            )));
        }

        figment = figment
            .merge(Env::prefixed("LANGSTATS_"))
            .merge(
                Env::raw()
                    .only(&["GITHUB_TOKEN"])
                    .map(|_| "github_token".into()),
            )
            .merge(Serialized::defaults(overrides));

        let config: Config = figment
            .extract()
            .map_err(|e| LangStatsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.account().is_none() {
            return Err(LangStatsError::Config(
                "no GitHub username configured (use --user or LANGSTATS_USERNAME)".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(LangStatsError::Config("concurrency must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(LangStatsError::Config("max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// The configured account, ignoring blank values.
    pub fn account(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// GitHub rejects requests without a `User-Agent`; fall back to the
    /// account name.
    pub fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .or(self.account())
            .unwrap_or("langstats")
    }
}

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from("."))
}
