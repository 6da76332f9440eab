//! Log-ratio computation, centering, and post-merge reconciliation.
//!
//! Two centering rules live here. Extraction and the merge engine use the
//! *extend* rule: infinities are rewritten just past the finite extremes.
//! Reconciliation of two independently binned channel runs uses the *cap*
//! rule: infinities are capped at the 1st/99th percentile of the finite
//! values, since post-merge sets are prone to extreme finite outliers that
//! would otherwise drag the infinity rewrite out with them.

use rustc_hash::FxHashMap;

use crate::types::{LogBase, Point};

/// Provisional log ratio for one point: `log_base((a + eps) / (b + eps))`.
///
/// With a positive pseudocount both effective values are positive and the
/// result is always finite. A zero or negative pseudocount is a defined edge
/// case: one-sided positivity yields the matching signed infinity, and two
/// dead sides yield 0.
#[inline]
pub fn raw_log_ratio(value_a: f64, value_b: f64, pseudocount: f64, base: LogBase) -> f64 {
    let eff_a = value_a + pseudocount;
    let eff_b = value_b + pseudocount;
    if eff_a > 0.0 && eff_b > 0.0 {
        base.log(eff_a / eff_b)
    } else if eff_a > 0.0 {
        f64::INFINITY
    } else if eff_b > 0.0 {
        f64::NEG_INFINITY
    } else {
        0.0
    }
}

/// Assign provisional log ratios to every point in place.
pub(crate) fn assign_log_ratios(points: &mut [Point], pseudocount: f64, base: LogBase) {
    for p in points {
        p.log_ratio = raw_log_ratio(p.value_a, p.value_b, pseudocount, base);
    }
}

/// Center finite log ratios on their mean and rewrite infinities just past
/// the finite extremes (the extend rule).
///
/// Infinities become `(max(finite ∪ {0}) - mean) + 1` on the positive side
/// and the mirror on the negative side, falling back to ±10 should the cap
/// compute to exactly 0. With no finite values at all, infinities map to ±10
/// and everything else to 0.
pub(crate) fn center_log_ratios(points: &mut [Point]) {
    let finite: Vec<f64> = points
        .iter()
        .map(|p| p.log_ratio)
        .filter(|lr| lr.is_finite())
        .collect();

    if finite.is_empty() {
        for p in points.iter_mut() {
            p.log_ratio = if p.log_ratio == f64::INFINITY {
                10.0
            } else if p.log_ratio == f64::NEG_INFINITY {
                -10.0
            } else {
                0.0
            };
        }
        return;
    }

    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    let max_finite = finite.iter().fold(0.0_f64, |m, &v| m.max(v));
    let min_finite = finite.iter().fold(0.0_f64, |m, &v| m.min(v));

    let mut cap_pos = (max_finite - mean) + 1.0;
    if cap_pos == 0.0 {
        cap_pos = 10.0;
    }
    let mut cap_neg = (min_finite - mean) - 1.0;
    if cap_neg == 0.0 {
        cap_neg = -10.0;
    }

    for p in points.iter_mut() {
        if p.log_ratio.is_finite() {
            p.log_ratio -= mean;
        } else if p.log_ratio == f64::INFINITY {
            p.log_ratio = cap_pos;
        } else if p.log_ratio == f64::NEG_INFINITY {
            p.log_ratio = cap_neg;
        }
    }
}

/// Assign and center log ratios with the extend rule, in one step.
pub(crate) fn recompute_log_ratios(points: &mut [Point], pseudocount: f64, base: LogBase) {
    assign_log_ratios(points, pseudocount, base);
    center_log_ratios(points);
}

// Coordinate key for reconciliation: the exact bit patterns of the merged
// (possibly fractional) position. Matching positions must match bit-for-bit,
// which they do when both runs started from the same extracted points.
#[inline]
fn coord_key(p: &Point) -> (u64, u64) {
    (p.row.to_bits(), p.col.to_bits())
}

/// Reconcile two independently binned channel runs into one combined
/// log-ratio point set.
///
/// Both sets are keyed by their merged coordinates and the key sets unioned.
/// For each coordinate, `value_a` is taken from the A-run's record when
/// present, else from the A-value embedded in the B-run's record, else 0 —
/// and symmetrically for `value_b`. Log ratios are recomputed, centered on
/// the finite mean, and infinities are capped at the 1st/99th percentile of
/// the uncentered finite values (±1, mean-subtracted like everything else).
///
/// Output ids are a dense 0-based sequence; `original_index` is -1 since the
/// combined points no longer trace to a single input record.
pub fn reconcile_binned(
    binned_a: &[Point],
    binned_b: &[Point],
    pseudocount: f64,
    base: LogBase,
) -> Vec<Point> {
    // (own-channel value, embedded counterpart value) per coordinate.
    let mut from_a: FxHashMap<(u64, u64), (f64, f64)> = FxHashMap::default();
    let mut from_b: FxHashMap<(u64, u64), (f64, f64)> = FxHashMap::default();
    let mut order: Vec<(u64, u64)> = Vec::with_capacity(binned_a.len() + binned_b.len());

    for p in binned_a {
        let key = coord_key(p);
        if from_a.insert(key, (p.value_a, p.value_b)).is_none() {
            order.push(key);
        }
    }
    for p in binned_b {
        let key = coord_key(p);
        if from_b.insert(key, (p.value_b, p.value_a)).is_none() && !from_a.contains_key(&key) {
            order.push(key);
        }
    }

    let mut combined: Vec<Point> = Vec::with_capacity(order.len());
    for (idx, key) in order.iter().enumerate() {
        let a_entry = from_a.get(key);
        let b_entry = from_b.get(key);
        let value_a = a_entry
            .map(|e| e.0)
            .or_else(|| b_entry.map(|e| e.1))
            .unwrap_or(0.0);
        let value_b = b_entry
            .map(|e| e.0)
            .or_else(|| a_entry.map(|e| e.1))
            .unwrap_or(0.0);

        combined.push(Point {
            id: idx as u32,
            row: f64::from_bits(key.0),
            col: f64::from_bits(key.1),
            value_a,
            value_b,
            log_ratio: raw_log_ratio(value_a, value_b, pseudocount, base),
            original_index: -1,
            removed: false,
        });
    }

    center_with_percentile_caps(&mut combined);
    combined
}

/// The cap rule: mean-center finite log ratios and pin infinities to the
/// 1st/99th percentile of the finite distribution.
fn center_with_percentile_caps(points: &mut [Point]) {
    let mut finite: Vec<f64> = points
        .iter()
        .map(|p| p.log_ratio)
        .filter(|lr| lr.is_finite())
        .collect();

    if finite.is_empty() {
        for p in points.iter_mut() {
            p.log_ratio = if p.log_ratio == f64::INFINITY {
                10.0
            } else if p.log_ratio == f64::NEG_INFINITY {
                -10.0
            } else {
                0.0
            };
        }
        return;
    }

    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    finite.sort_by(f64::total_cmp);
    let n = finite.len();
    let hi_idx = ((n as f64 * 0.99).floor() as usize).min(n - 1);
    let lo_idx = ((n as f64 * 0.01).ceil() as usize).min(n - 1);
    let cap_pos = (finite[hi_idx] - mean) + 1.0;
    let cap_neg = (finite[lo_idx] - mean) - 1.0;

    for p in points.iter_mut() {
        if p.log_ratio.is_finite() {
            p.log_ratio -= mean;
        } else if p.log_ratio == f64::INFINITY {
            p.log_ratio = cap_pos;
        } else if p.log_ratio == f64::NEG_INFINITY {
            p.log_ratio = cap_neg;
        }
    }
}
