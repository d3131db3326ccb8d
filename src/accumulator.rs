//! accumulator.rs
//!
//! Folds per-repository language byte counts into one running total and
//! pushes a fresh ranking to every subscriber after each successful merge.
//!
//! Merges take `&mut self`, so whoever owns the accumulator is the only one
//! able to update it. The aggregation session holds it for the whole run and
//! drains fetch completions one at a time.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::languages::{LanguageBytes, LanguageTotals, RankedEntry};
use crate::rank::rank;

/// Receives the ranking produced after every merge.
pub trait RankingObserver: Send {
    fn on_ranking(&mut self, ranking: &[RankedEntry]) -> Result<()>;
}

#[derive(Default)]
pub struct Accumulator {
    totals: LanguageTotals,
    observers: Vec<Box<dyn RankingObserver>>,
    merges: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn RankingObserver>) {
        self.observers.push(observer);
    }

    pub fn totals(&self) -> &LanguageTotals {
        &self.totals
    }

    /// Number of successful merges so far.
    pub fn merges(&self) -> usize {
        self.merges
    }

    pub fn ranking(&self) -> Vec<RankedEntry> {
        rank(&self.totals)
    }

    /// Merge one repository's byte counts, then notify observers.
    ///
    /// On error the totals are left exactly as they were and nobody is
    /// notified.
    pub fn merge(&mut self, repo: &str, bytes: &LanguageBytes) -> Result<&LanguageTotals> {
        self.totals.apply(repo, bytes)?;
        self.merges += 1;
        if bytes.is_empty() {
            debug!(repo, "no languages detected");
        } else {
            debug!(
                repo,
                languages = self.totals.len(),
                added = bytes.total(),
                "merged language bytes"
            );
        }

        self.notify();
        Ok(&self.totals)
    }

    /// Validate a raw `languages_url` payload and merge it.
    pub fn merge_raw(&mut self, repo: &str, raw: &Value) -> Result<&LanguageTotals> {
        let bytes = LanguageBytes::parse(repo, raw)?;
        self.merge(repo, &bytes)
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let ranking = rank(&self.totals);
        for obs in self.observers.iter_mut() {
            // A broken renderer must not undo or block aggregation.
            if let Err(e) = obs.on_ranking(&ranking) {
                warn!("renderer failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LangStatsError;
    use crate::render::SvgRenderer;
    use crate::svg::Theme;
    use crate::test_utils::{RecordingObserver, bytes_from};
    use serde_json::json;

    #[test]
    fn test_merge_scenario() {
        let mut acc = Accumulator::new();
        acc.merge("a", &bytes_from(&[("JavaScript", 100), ("CSS", 20)]))
            .unwrap();
        acc.merge("b", &bytes_from(&[("JavaScript", 50), ("HTML", 10)]))
            .unwrap();

        let totals = acc.totals();
        assert_eq!(totals.get("JavaScript"), Some(150));
        assert_eq!(totals.get("CSS"), Some(20));
        assert_eq!(totals.get("HTML"), Some(10));
        assert_eq!(totals.len(), 3);

        assert_eq!(
            acc.ranking(),
            vec![
                RankedEntry("JavaScript".into(), 150),
                RankedEntry("CSS".into(), 20),
                RankedEntry("HTML".into(), 10),
            ]
        );
    }

    #[test]
    fn test_merge_empty_is_identity() {
        let mut acc = Accumulator::new();
        acc.merge("a", &bytes_from(&[("Rust", 9)])).unwrap();
        let before = acc.totals().clone();

        acc.merge("empty", &LanguageBytes::default()).unwrap();

        assert_eq!(acc.totals(), &before);
        assert_eq!(acc.ranking().len(), 1);
        assert_eq!(acc.merges(), 2);
    }

    #[test]
    fn test_sum_preserved() {
        let batches: Vec<Vec<(&str, u64)>> = vec![
            vec![("Rust", 10), ("C", 4)],
            vec![],
            vec![("C", 6), ("Python", 1)],
            vec![("Rust", 1), ("Python", 2), ("Go", 30)],
        ];

        let mut acc = Accumulator::new();
        let mut expected_total = 0u64;
        for (i, batch) in batches.iter().enumerate() {
            acc.merge(&format!("r{i}"), &bytes_from(batch)).unwrap();
            expected_total += batch.iter().map(|(_, b)| b).sum::<u64>();
            assert_eq!(acc.totals().grand_total(), expected_total);
        }

        assert_eq!(acc.totals().get("Rust"), Some(11));
        assert_eq!(acc.totals().get("C"), Some(10));
        assert_eq!(acc.totals().get("Python"), Some(3));
        assert_eq!(acc.totals().get("Go"), Some(30));
    }

    #[test]
    fn test_merge_raw_rejects_invalid_without_change() {
        let mut acc = Accumulator::new();
        acc.merge_raw("ok", &json!({"Rust": 5})).unwrap();

        let err = acc
            .merge_raw("bad", &json!({"Rust": 5, "C": -1}))
            .unwrap_err();
        assert!(matches!(err, LangStatsError::InvalidInput { .. }));
        assert_eq!(acc.totals().get("Rust"), Some(5));
        assert_eq!(acc.totals().get("C"), None);
        assert_eq!(acc.merges(), 1);
    }

    #[test]
    fn test_observers_notified_per_merge() {
        let recorder = RecordingObserver::default();
        let seen = recorder.handle();

        let mut acc = Accumulator::new();
        acc.subscribe(Box::new(recorder));

        acc.merge("a", &bytes_from(&[("JavaScript", 100), ("CSS", 20)]))
            .unwrap();
        let _ = acc.merge_raw("bad", &json!({"CSS": "lots"}));
        acc.merge("b", &bytes_from(&[("JavaScript", 50), ("HTML", 10)]))
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[1].len(), 3);
        assert_eq!(seen[1][0], RankedEntry("JavaScript".into(), 150));
    }

    #[test]
    fn test_failing_observer_does_not_block_merge() {
        struct Broken;
        impl RankingObserver for Broken {
            fn on_ranking(&mut self, _: &[RankedEntry]) -> Result<()> {
                Err(std::io::Error::other("disk full").into())
            }
        }

        let recorder = RecordingObserver::default();
        let seen = recorder.handle();

        let mut acc = Accumulator::new();
        acc.subscribe(Box::new(Broken));
        acc.subscribe(Box::new(recorder));
        acc.merge("a", &bytes_from(&[("Rust", 1)])).unwrap();

        assert_eq!(acc.totals().get("Rust"), Some(1));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_overflowing_grand_total_rejected_with_chart_subscribed() {
        let dir = tempfile::tempdir().unwrap();
        let mut acc = Accumulator::new();
        acc.subscribe(Box::new(SvgRenderer::new(dir.path(), vec![Theme::Dark])));

        let err = acc
            .merge_raw("big", &json!({"A": u64::MAX, "B": 1}))
            .unwrap_err();
        assert!(matches!(err, LangStatsError::InvalidInput { .. }));
        assert!(acc.totals().is_empty());
        assert!(!dir.path().join("languages_dark.svg").exists());

        acc.merge_raw("a", &json!({"A": u64::MAX})).unwrap();
        assert!(acc.merge_raw("b", &json!({"B": 1})).is_err());
        assert_eq!(acc.totals().grand_total(), u64::MAX);
        assert_eq!(acc.merges(), 1);
        assert!(dir.path().join("languages_dark.svg").exists());
    }
}
