use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use tracing::debug;

use crate::{error::ReportError, result::ResultRow};

/// Ranking value of a scheme that never appears on the reference corpus
pub const NEUTRAL_RATIO: f64 = 1.0;

/// Schemes in chart order, still grouped by format family
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOrder {
    groups: Vec<Vec<String>>,
}

impl DisplayOrder {
    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flatten().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.schemes().any(|s| s == scheme)
    }
}

/// Best compression ratio per scheme on `reference_corpus`; the baseline
/// scheme is pinned to 0
pub fn ranking_values(
    rows: &[ResultRow],
    reference_corpus: &str,
    baseline_scheme: &str,
) -> Result<HashMap<String, f64>, ReportError> {
    let mut best = HashMap::new();
    for row in rows.iter().filter(|r| r.corpus == reference_corpus) {
        let ratio = row.compression_ratio()?;
        let entry = best.entry(row.scheme.clone()).or_insert(NEUTRAL_RATIO);
        *entry = f64::max(*entry, ratio);
    }
    best.insert(baseline_scheme.to_owned(), 0.0);
    Ok(best)
}

/// Sorts the members of each group by their ranking value, then the groups
/// by their best member. Both sorts are stable.
pub fn compute_display_order(
    rows: &[ResultRow],
    groups: &[Vec<String>],
    reference_corpus: &str,
    baseline_scheme: &str,
) -> Result<DisplayOrder, ReportError> {
    let ranking = ranking_values(rows, reference_corpus, baseline_scheme)?;
    let rank = |scheme: &str| ranking.get(scheme).copied().unwrap_or(NEUTRAL_RATIO);

    let mut groups = groups
        .iter()
        .map(|group| {
            let mut group = group.clone();
            group.sort_by(|a, b| rank(a).total_cmp(&rank(b)));
            group
        })
        .collect::<Vec<_>>();
    let group_rank = |group: &Vec<String>| {
        group
            .iter()
            .map(|s| rank(s))
            .fold(f64::NEG_INFINITY, f64::max)
    };
    groups.sort_by(|a, b| group_rank(a).total_cmp(&group_rank(b)));

    for group in &groups {
        debug!("Scheme group: {}", group.iter().join(", "));
    }
    Ok(DisplayOrder { groups })
}

/// Schemes present in `rows` but missing from `order`
pub fn validate_scheme_coverage(rows: &[ResultRow], order: &DisplayOrder) -> BTreeSet<String> {
    rows.iter()
        .filter(|r| !order.contains(&r.scheme))
        .map(|r| r.scheme.clone())
        .collect()
}

pub fn ensure_coverage(rows: &[ResultRow], order: &DisplayOrder) -> Result<(), ReportError> {
    let missing = validate_scheme_coverage(rows, order);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::Coverage(missing.into_iter().collect()))
    }
}
