//! Simpson diversity of per-category place counts.

use crate::CategoryCounts;

/// Complement of Simpson's index, `1 - sum((count_c / total)^2)` over the
/// target categories.
///
/// A building with no places in range scores 0. The ratio is undefined
/// there; downstream maps expect a number, so 0 is the convention.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn simpson_diversity(counts: &CategoryCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let squares: f64 = counts
        .values()
        .iter()
        .map(|&count| {
            let share = count as f64 / total;
            share * share
        })
        .sum();
    1.0 - squares
}
