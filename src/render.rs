//! Ranking observers that turn each intermediate ranking into output.

use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::accumulator::RankingObserver;
use crate::error::Result;
use crate::languages::RankedEntry;
use crate::svg::{self, Theme};

/// Rewrites `languages_<theme>.svg` in `out_dir` on every update.
pub struct SvgRenderer {
    out_dir: PathBuf,
    themes: Vec<Theme>,
}

impl SvgRenderer {
    pub fn new(out_dir: impl Into<PathBuf>, themes: Vec<Theme>) -> Self {
        Self {
            out_dir: out_dir.into(),
            themes,
        }
    }

    pub fn path_for(&self, theme: Theme) -> PathBuf {
        self.out_dir.join(format!("languages_{}.svg", theme.name()))
    }
}

impl RankingObserver for SvgRenderer {
    fn on_ranking(&mut self, ranking: &[RankedEntry]) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let now = Utc::now();
        for &theme in &self.themes {
            let path = self.path_for(theme);
            fs::write(&path, svg::generate_svg(ranking, theme, now))?;
            debug!(path = %path.display(), "wrote chart");
        }
        Ok(())
    }
}

/// Writes each ranking as one JSON line: `[["Rust",1234],["Shell",56]]`.
pub struct JsonRenderer<W> {
    out: W,
}

impl<W: Write + Send> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> RankingObserver for JsonRenderer<W> {
    fn on_ranking(&mut self, ranking: &[RankedEntry]) -> Result<()> {
        serde_json::to_writer(&mut self.out, ranking).map_err(std::io::Error::from)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Logs the size of the ranking and the current leader.
pub struct LogRenderer;

impl RankingObserver for LogRenderer {
    fn on_ranking(&mut self, ranking: &[RankedEntry]) -> Result<()> {
        match ranking.first() {
            Some(top) => info!(
                languages = ranking.len(),
                leader = top.language(),
                bytes = top.bytes(),
                "ranking updated"
            ),
            None => info!("ranking updated: no languages yet"),
        }
        Ok(())
    }
}
