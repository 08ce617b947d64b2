use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One folder suggested by the model and the bookmark indices it claims.
///
/// Indices are kept signed so that a negative value from the model lands in
/// the out-of-range bucket instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPlan {
    pub name: String,
    #[serde(rename = "bookmarks", default)]
    pub bookmark_indices: Vec<i64>,
}

impl CategoryPlan {
    pub fn new(name: impl Into<String>, bookmark_indices: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            bookmark_indices,
        }
    }

    /// Resolves indices against `items`, silently dropping anything out of range.
    pub fn resolve<'a, T>(&'a self, items: &'a [T]) -> impl Iterator<Item = &'a T> + 'a {
        self.bookmark_indices
            .iter()
            .filter_map(|&idx| usize::try_from(idx).ok())
            .filter_map(|idx| items.get(idx))
    }
}

/// How well a plan set partitions `[0, len)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PlanCoverage {
    /// Indices no plan mentions.
    pub missing: Vec<usize>,
    /// In-range indices mentioned more than once (listed once each).
    pub duplicated: Vec<usize>,
    /// Indices outside `[0, len)`.
    pub out_of_range: Vec<i64>,
}

impl PlanCoverage {
    pub fn is_partition(&self) -> bool {
        self.missing.is_empty() && self.duplicated.is_empty() && self.out_of_range.is_empty()
    }
}

pub fn check_coverage(plans: &[CategoryPlan], len: usize) -> PlanCoverage {
    let mut seen = vec![0usize; len];
    let mut out_of_range = Vec::new();

    for idx in plans.iter().flat_map(|plan| plan.bookmark_indices.iter().copied()) {
        match usize::try_from(idx).ok().filter(|&i| i < len) {
            Some(i) => seen[i] += 1,
            None => out_of_range.push(idx),
        }
    }

    let missing = (0..len).filter(|&i| seen[i] == 0).collect();
    let duplicated = (0..len).filter(|&i| seen[i] > 1).collect();
    let out_of_range = out_of_range
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    PlanCoverage {
        missing,
        duplicated,
        out_of_range,
    }
}
