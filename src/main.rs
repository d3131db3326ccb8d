mod accumulator;
mod config;
mod error;
mod github;
mod languages;
mod rank;
mod render;
mod session;
mod svg;
#[cfg(test)]
mod test_utils;

use accumulator::Accumulator;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::{Config, Overrides};
use github::GithubClient;
use render::{JsonRenderer, LogRenderer, SvgRenderer};
use std::path::PathBuf;
use svg::Theme;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeChoice {
    Dark,
    Light,
    Both,
}

impl ThemeChoice {
    fn themes(self) -> Vec<Theme> {
        match self {
            ThemeChoice::Dark => vec![Theme::Dark],
            ThemeChoice::Light => vec![Theme::Light],
            ThemeChoice::Both => vec![Theme::Dark, Theme::Dark.toggled()],
        }
    }
}

#[derive(Parser)]
#[command(
    name = "langstats",
    about = "Rank the languages used across a GitHub account's repositories"
)]
struct Cli {
    #[arg(long, short, help = "GitHub account to aggregate")]
    user: Option<String>,

    #[arg(long, help = "Path to a config.toml")]
    config: Option<PathBuf>,

    #[arg(long, help = "Directory the SVG charts are written to")]
    out_dir: Option<PathBuf>,

    #[arg(long, help = "Maximum language requests in flight")]
    concurrency: Option<usize>,

    #[arg(long, value_enum, default_value_t = ThemeChoice::Both)]
    theme: ThemeChoice,

    #[arg(long, help = "Print every intermediate ranking as a JSON line")]
    json: bool,

    #[arg(long, help = "Do not write SVG charts")]
    no_svg: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is reserved for --json output and the summary
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "langstats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(
        cli.config.as_deref(),
        Overrides {
            username: cli.user,
            concurrency: cli.concurrency,
            output_dir: cli.out_dir,
        },
    )
    .context("failed to load configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let account = config
        .account()
        .context("no GitHub username configured")?
        .to_string();
    let client = GithubClient::new(&config)?;

    let mut accumulator = Accumulator::new();
    accumulator.subscribe(Box::new(LogRenderer));
    if !cli.no_svg {
        accumulator.subscribe(Box::new(SvgRenderer::new(
            &config.output_dir,
            cli.theme.themes(),
        )));
    }
    if cli.json {
        accumulator.subscribe(Box::new(JsonRenderer::new(std::io::stdout())));
    }

    let report = session::run(&client, &account, &mut accumulator, config.concurrency)
        .await
        .with_context(|| format!("failed to aggregate languages for {account}"))?;

    let total = report.total_bytes;
    println!(
        "{account}: {} languages across {} repositories ({} forks skipped, {} failed)",
        report.ranking.len(),
        accumulator.merges(),
        report.skipped_forks.len(),
        report.failures.len()
    );
    if accumulator.totals().is_empty() {
        println!("{:>20}", "no language data");
    }
    for entry in &report.ranking {
        println!(
            "{:>20}  {:>12}  {:>5.1}%",
            entry.language(),
            svg::human_bytes(entry.bytes()),
            entry.share_of(total)
        );
    }
    for failure in &report.failures {
        println!("{:>20}  failed: {}", failure.repo, failure.error);
    }

    Ok(())
}
