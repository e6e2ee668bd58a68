//! Merge and ranking rules shared by the aggregate views.
//!
//! The three budget policies are deliberately separate functions: the
//! dashboard reports the larger of two totals, a department reports its raw
//! project budget sum, and the trend series adds both sources per year.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::store::{AttributedTally, Tally, YearAmount};

/// Bucket for publications that cannot be traced to a department.
pub const GENERAL_BUCKET: &str = "General";

/// Dashboard policy: the higher of the two independently tracked totals.
pub fn max_merge(project_budget_total: f64, allocation_total: f64) -> f64 {
    project_budget_total.max(allocation_total)
}

/// Trend policy: both series summed per year, no deduplication.
pub fn additive_by_year(project_budgets: &[YearAmount], allocations: &[YearAmount]) -> BTreeMap<i32, f64> {
    let mut years = BTreeMap::new();
    for row in project_budgets.iter().chain(allocations) {
        *years.entry(row.year).or_insert(0.0) += row.amount;
    }
    years
}

pub fn year_map(rows: &[YearAmount]) -> BTreeMap<i32, f64> {
    additive_by_year(rows, &[])
}

pub fn tally_map(rows: Vec<Tally>) -> BTreeMap<String, i64> {
    rows.into_iter().map(|t| (t.key, t.count)).collect()
}

/// Name a department-attributed tally, folding unattributed rows into
/// [`GENERAL_BUCKET`]. Zero counts never produce a key.
pub fn attribute(rows: Vec<AttributedTally>) -> BTreeMap<String, i64> {
    let mut named = BTreeMap::new();
    for row in rows {
        if row.count == 0 {
            continue;
        }
        let key = row.department.unwrap_or_else(|| GENERAL_BUCKET.to_string());
        *named.entry(key).or_insert(0) += row.count;
    }
    named
}

/// Stable sort then truncate; equal items keep their incoming order.
pub fn top_n<T>(mut items: Vec<T>, n: usize, compare: impl FnMut(&T, &T) -> Ordering) -> Vec<T> {
    items.sort_by(compare);
    items.truncate(n);
    items
}

/// Descending order for amounts that are never NaN.
pub fn desc_f64(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
