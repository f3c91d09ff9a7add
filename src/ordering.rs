//! Fractional sort keys for drag-and-drop ordering.
//!
//! A moved task takes the midpoint of its destination neighbors, so no other
//! row is rewritten. Repeated bisection can exhaust float precision; when the
//! neighbor gap collapses below [`ORDER_EPSILON`] the column is renormalized
//! to a fresh `0, 1000, 2000, …` sequence.

use chrono::Utc;

/// Spacing used when inserting at a column edge and when renormalizing.
pub const ORDER_STEP: f64 = 1000.0;

/// Below this neighbor gap the midpoint no longer separates the keys.
pub const ORDER_EPSILON: f64 = 1e-9;

/// Sort key for a task dropped between `prev` and `next`, the immediate
/// neighbors in the destination column after the move.
pub fn compute_order(prev: Option<f64>, next: Option<f64>) -> f64 {
    match (prev, next) {
        (Some(p), Some(n)) => (p + n) / 2.0,
        (Some(p), None) => p + ORDER_STEP,
        (None, Some(n)) => n - ORDER_STEP,
        // Empty column: epoch seconds, so standalone insertions keep sorting
        // after historical ones.
        (None, None) => initial_order(),
    }
}

/// Order key for a brand-new task.
pub fn initial_order() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// True when the destination gap is too small for another midpoint.
pub fn gap_collapsed(prev: Option<f64>, next: Option<f64>) -> bool {
    match (prev, next) {
        (Some(p), Some(n)) => (n - p).abs() < ORDER_EPSILON,
        _ => false,
    }
}

/// Fresh keys for a column of `len` tasks, preserving their current order.
pub fn renormalize(len: usize) -> Vec<f64> {
    (0..len).map(|i| i as f64 * ORDER_STEP).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::midpoint(Some(1000.0), Some(2000.0), 1500.0)]
    #[case::after_last(Some(3000.0), None, 4000.0)]
    #[case::before_first(None, Some(3000.0), 2000.0)]
    #[case::negative_reach(None, Some(500.0), -500.0)]
    fn test_compute_order_cases(
        #[case] prev: Option<f64>,
        #[case] next: Option<f64>,
        #[case] expected: f64,
    ) {
        assert_eq!(compute_order(prev, next), expected);
    }

    #[test]
    fn test_empty_column_sorts_after_history() {
        // Any historical key is below the current epoch.
        let historical = 1_700_000_000.0;
        let order = compute_order(None, None);
        assert!(order > historical);
    }

    #[test]
    fn test_gap_collapse_detection() {
        assert!(!gap_collapsed(Some(0.0), Some(1000.0)));
        assert!(gap_collapsed(Some(1.0), Some(1.0 + 1e-12)));
        assert!(!gap_collapsed(Some(1.0), None));
        assert!(!gap_collapsed(None, None));
    }

    #[test]
    fn test_repeated_bisection_eventually_collapses() {
        let mut lo = 0.0f64;
        let mut hi = 1000.0f64;
        let mut collapsed = false;
        for _ in 0..100 {
            let mid = compute_order(Some(lo), Some(hi));
            if gap_collapsed(Some(lo), Some(mid)) {
                collapsed = true;
                break;
            }
            hi = mid;
        }
        assert!(collapsed);
    }

    #[test]
    fn test_renormalize_spacing() {
        let keys = renormalize(4);
        assert_eq!(keys, vec![0.0, 1000.0, 2000.0, 3000.0]);
        assert!(renormalize(0).is_empty());
    }
}
