//! session.rs
//!
//! One aggregation run: list an account's repositories, skip forks, fetch
//! every remaining repository's languages concurrently and fold each response
//! into the accumulator as it arrives.
//!
//! Only the repository listing can fail the run. A repository whose language
//! data cannot be fetched or validated is recorded in the report and the run
//! carries on with the others.

use futures::StreamExt;
use futures::stream;
use tracing::{debug, info, warn};

use crate::accumulator::Accumulator;
use crate::error::Result;
use crate::github::RepoDataProvider;
use crate::languages::RankedEntry;

#[derive(Debug)]
pub struct RepoFailure {
    pub repo: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub ranking: Vec<RankedEntry>,
    pub total_bytes: u64,
    pub merged: Vec<String>,
    pub skipped_forks: Vec<String>,
    pub failures: Vec<RepoFailure>,
}

pub async fn run<P: RepoDataProvider + ?Sized>(
    provider: &P,
    account: &str,
    accumulator: &mut Accumulator,
    concurrency: usize,
) -> Result<RunReport> {
    let repos = provider.list_repos(account).await?;
    let mut report = RunReport::default();

    let (forks, sources): (Vec<_>, Vec<_>) = repos.into_iter().partition(|r| r.fork);
    for fork in forks {
        debug!(repo = %fork.name, "skipping fork");
        report.skipped_forks.push(fork.name);
    }

    info!(
        account,
        repos = sources.len(),
        forks = report.skipped_forks.len(),
        "fetching language data"
    );

    let mut completions = stream::iter(sources)
        .map(|repo| async move {
            let result = provider.languages(&repo.languages_url).await;
            (repo.name, result)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((name, result)) = completions.next().await {
        let merged = result.and_then(|raw| accumulator.merge_raw(&name, &raw).map(|_| ()));
        match merged {
            Ok(()) => report.merged.push(name),
            Err(e) => {
                warn!(repo = %name, "skipping repository: {e}");
                report.failures.push(RepoFailure {
                    repo: name,
                    error: e.to_string(),
                });
            }
        }
    }

    report.ranking = accumulator.ranking();
    report.total_bytes = accumulator.totals().grand_total();
    info!(
        merged = report.merged.len(),
        failed = report.failures.len(),
        languages = report.ranking.len(),
        "aggregation finished"
    );
    Ok(report)
}
