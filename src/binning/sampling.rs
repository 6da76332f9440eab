//! Weighted neighbor selection for the merge engine.

use rand::Rng;

/// Selection weight for a neighbor at squared distance `dist_sq`: closer
/// neighbors are proportionally more likely to absorb the point. The epsilon
/// guards against coincident positions.
#[inline]
pub(crate) fn selection_weight(dist_sq: f64) -> f64 {
    1.0 / (dist_sq + f64::EPSILON)
}

/// Draw an index with probability proportional to its weight via a single
/// cumulative sweep.
///
/// Returns `None` when the weights do not sum to a positive value (the
/// degenerate-numeric skip). If floating rounding pushes the draw past the
/// final cumulative bound, the last candidate is selected.
pub(crate) fn pick_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || total.is_nan() {
        return None;
    }

    let draw = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (k, w) in weights.iter().enumerate() {
        cumulative += w;
        if draw < cumulative {
            return Some(k);
        }
    }
    Some(weights.len() - 1)
}
