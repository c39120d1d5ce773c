//! PercentileRanker: rank each value against its own trailing history.
//!
//! For row `i` the window is `[max(0, i - lookback + 1), i]`. The rank is
//! `count(window <= v_i) / count(window) * 100`, counting only non-missing
//! values, so ties and the window maximum score 100. A row is NaN when its
//! value is NaN or the window holds fewer than `lookback * min_periods_ratio`
//! valid values.
//!
//! `percentile_rank` keeps the window in a Fenwick tree over the
//! coordinate-compressed value domain (O(log n) per row);
//! `percentile_rank_naive` rescans every window and serves as the oracle.

pub mod fenwick;

use std::cmp::Ordering;

use fenwick::Fenwick;

// -0.0 and 0.0 compare equal under `<=`; fold them so `total_cmp` agrees.
#[inline]
fn canonical(v: f64) -> f64 {
    v + 0.0
}

#[inline]
fn has_enough(count: usize, lookback: usize, min_periods_ratio: f64) -> bool {
    count as f64 >= lookback as f64 * min_periods_ratio
}

#[inline]
fn rank(count_le: usize, count: usize) -> f64 {
    count_le as f64 / count as f64 * 100.0
}

/// Rolling percentile rank in `[0, 100]` using a Fenwick tree.
pub fn percentile_rank(values: &[f64], lookback: usize, min_periods_ratio: f64) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if lookback == 0 {
        return out;
    }

    let mut domain: Vec<f64> = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| canonical(*v))
        .collect();
    domain.sort_by(f64::total_cmp);
    domain.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);

    let slot = |v: f64| -> Option<usize> {
        if v.is_nan() {
            None
        } else {
            domain.binary_search_by(|d| d.total_cmp(&canonical(v))).ok()
        }
    };
    let slots: Vec<Option<usize>> = values.iter().map(|v| slot(*v)).collect();

    let mut tree = Fenwick::new(domain.len());
    let mut in_window = 0usize;

    for i in 0..n {
        if let Some(s) = slots[i] {
            tree.insert(s);
            in_window += 1;
        }
        if i >= lookback {
            if let Some(s) = slots[i - lookback] {
                tree.remove(s);
                in_window -= 1;
            }
        }

        let Some(current) = slots[i] else { continue };
        if in_window == 0 || !has_enough(in_window, lookback, min_periods_ratio) {
            continue;
        }
        let count_le = tree.prefix_count(current) as usize;
        out[i] = rank(count_le, in_window);
    }
    out
}

/// Rolling percentile rank by rescanning each window. Reference oracle.
pub fn percentile_rank_naive(values: &[f64], lookback: usize, min_periods_ratio: f64) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if lookback == 0 {
        return out;
    }

    for i in 0..n {
        let current = values[i];
        if current.is_nan() {
            continue;
        }
        let start = (i + 1).saturating_sub(lookback);
        let window = &values[start..=i];
        let count = window.iter().filter(|v| !v.is_nan()).count();
        if !has_enough(count, lookback, min_periods_ratio) {
            continue;
        }
        let count_le = window.iter().filter(|v| **v <= current).count();
        out[i] = rank(count_le, count);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increasing_series_ranks_at_top() {
        let r = percentile_rank(&[1.0, 2.0, 3.0, 4.0, 5.0], 5, 0.1);
        assert_eq!(r[4], 100.0);
        assert_eq!(r[0], 100.0);
    }

    #[test]
    fn decreasing_series_ranks_lowest() {
        let r = percentile_rank(&[5.0, 4.0, 3.0, 2.0, 1.0], 5, 0.1);
        assert_eq!(r[4], 20.0);
        assert_eq!(r[1], 50.0);
    }

    #[test]
    fn ties_are_inclusive() {
        let r = percentile_rank(&[2.0, 2.0, 2.0], 3, 0.1);
        assert!(r.iter().all(|v| *v == 100.0));
    }

    #[test]
    fn window_slides() {
        // lookback 2: row 2 sees [3, 1]
        let r = percentile_rank(&[0.0, 3.0, 1.0], 2, 0.1);
        assert_eq!(r[2], 50.0);
    }

    #[test]
    fn min_periods_gate_and_nan_current() {
        let values = [1.0, f64::NAN, 2.0, 3.0, f64::NAN];
        let r = percentile_rank(&values, 4, 0.75);
        assert!(r[0].is_nan());
        assert!(r[1].is_nan());
        assert!(r[2].is_nan()); // 2 valid < 3
        assert_eq!(r[3], 100.0);
        assert!(r[4].is_nan());
    }

    #[test]
    fn signed_zero_ties() {
        let r = percentile_rank(&[0.0, -0.0], 2, 0.5);
        assert_eq!(r[1], 100.0);
        assert_eq!(r, percentile_rank_naive(&[0.0, -0.0], 2, 0.5));
    }

    #[test]
    fn zero_lookback_is_all_missing() {
        assert!(percentile_rank(&[1.0, 2.0], 0, 0.5).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn matches_naive_oracle() {
        let values: Vec<f64> = (0..200)
            .map(|i| {
                if i % 17 == 0 {
                    f64::NAN
                } else {
                    ((i * 37) % 23) as f64 - 11.0
                }
            })
            .collect();
        let fast = percentile_rank(&values, 30, 0.8);
        let slow = percentile_rank_naive(&values, 30, 0.8);
        for (a, b) in fast.iter().zip(&slow) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
