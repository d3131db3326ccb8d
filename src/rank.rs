use crate::languages::{LanguageTotals, RankedEntry};

/// Rank languages by accumulated bytes, largest first.
///
/// Equal totals are ordered alphabetically so the output does not depend on
/// hash map iteration order.
pub fn rank(totals: &LanguageTotals) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = totals
        .iter()
        .map(|(lang, bytes)| RankedEntry(lang.to_string(), bytes))
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}
