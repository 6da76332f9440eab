//! The adaptive merge ("binning") engine.
//!
//! Each outer iteration rebuilds the Delaunay neighbor graph over the active
//! points, visits them in a uniformly random order, and probabilistically
//! fuses under-weight points into a nearby neighbor. The graph is patched in
//! place between merges within a pass and rebuilt from scratch for the next
//! one. The run stops at its iteration budget, when fewer than 3 points
//! remain, or at a fixed point (a full pass with zero merges).

mod sampling;

use glam::DVec2;
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::graph::NeighborGraph;
use crate::normalize;
use crate::types::{LogBase, Point};

/// Parameters for one binning run over a channel.
#[derive(Debug, Clone, Copy)]
pub struct BinParams {
    /// Eligibility bound: a point whose weight in *either* channel falls
    /// below this may be merged away.
    pub threshold: f64,
    /// Outer iteration budget; a budget of 0 runs no passes.
    pub max_iterations: usize,
    /// Pseudocount for the final log-ratio recompute.
    pub pseudocount: f64,
    pub log_base: LogBase,
}

/// Result of one binning run.
#[derive(Debug, Clone)]
pub struct BinOutcome {
    /// Surviving points, log ratios recomputed and centered.
    pub points: Vec<Point>,
    /// Outer iterations actually executed.
    pub iterations: usize,
    /// Total merges across all passes.
    pub merges: usize,
}

/// Run the merge engine over a set of points.
///
/// The engine owns `points` for the duration of the run and returns only the
/// survivors. Randomness comes exclusively from `rng`; inject a seeded source
/// for reproducible runs. `on_pass(iteration, merged_this_pass,
/// max_iterations)` fires synchronously after every completed outer pass, in
/// increasing iteration order; it must not block.
pub fn bin_points<R: Rng + ?Sized>(
    mut points: Vec<Point>,
    params: &BinParams,
    rng: &mut R,
    mut on_pass: impl FnMut(usize, usize, usize),
) -> BinOutcome {
    // Arena lookup by stable id; no ids are created during a run.
    let index_of: FxHashMap<u32, usize> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();

    let mut iterations = 0;
    let mut merges = 0;

    for iteration in 1..=params.max_iterations {
        let active: Vec<usize> = (0..points.len()).filter(|&i| !points[i].removed).collect();
        if active.len() < 3 {
            break;
        }

        let sites: Vec<(u32, DVec2)> = active
            .iter()
            .map(|&i| (points[i].id, points[i].pos()))
            .collect();
        let Some(mut graph) = NeighborGraph::build(&sites) else {
            break;
        };

        let mut order = active;
        order.shuffle(rng);

        let mut merged_this_pass = 0usize;
        for &pi in &order {
            if points[pi].removed {
                continue;
            }
            if !(points[pi].value_a < params.threshold || points[pi].value_b < params.threshold) {
                continue;
            }

            let Some(neighbor_ids) = graph.neighbors(points[pi].id) else {
                continue;
            };
            let candidates: Vec<usize> = neighbor_ids
                .iter()
                .filter_map(|id| index_of.get(id).copied())
                .filter(|&qi| !points[qi].removed)
                .collect();
            if candidates.is_empty() {
                continue;
            }

            let origin = points[pi].pos();
            let weights: Vec<f64> = candidates
                .iter()
                .map(|&qi| sampling::selection_weight(points[qi].pos().distance_squared(origin)))
                .collect();
            // A zero weight sum is a degenerate-numeric skip; the point is
            // left untouched and re-evaluated next pass.
            let survivor = match sampling::pick_weighted(&weights, rng) {
                Some(k) => candidates[k],
                None => continue,
            };

            let removed_id = points[pi].id;
            let survivor_id = points[survivor].id;
            fuse_points(&mut points, pi, survivor);
            graph.fuse(removed_id, survivor_id);
            merged_this_pass += 1;
        }

        iterations = iteration;
        merges += merged_this_pass;
        on_pass(iteration, merged_this_pass, params.max_iterations);
        if merged_this_pass == 0 {
            break;
        }
    }

    let mut survivors: Vec<Point> = points.into_iter().filter(|p| !p.removed).collect();
    normalize::recompute_log_ratios(&mut survivors, params.pseudocount, params.log_base);

    BinOutcome {
        points: survivors,
        iterations,
        merges,
    }
}

/// Fuse `removed_idx` into `survivor_idx`: relocate the survivor to the
/// mass-weighted centroid (zero total mass leaves its position unchanged),
/// transfer both channel weights, and mark the absorbed point removed.
fn fuse_points(points: &mut [Point], removed_idx: usize, survivor_idx: usize) {
    let sum_p = points[removed_idx].sum_value();
    let sum_q = points[survivor_idx].sum_value();
    let total = sum_p + sum_q;
    if total > 0.0 {
        let centroid =
            (points[removed_idx].pos() * sum_p + points[survivor_idx].pos() * sum_q) / total;
        points[survivor_idx].col = centroid.x;
        points[survivor_idx].row = centroid.y;
    }
    points[survivor_idx].value_a += points[removed_idx].value_a;
    points[survivor_idx].value_b += points[removed_idx].value_b;
    points[removed_idx].removed = true;
}
