//! Spatially adaptive binning for sparse two-channel contact maps.
//!
//! This crate turns a sparse list of `(row, col, valueA, valueB)` records
//! into a point cloud with per-point log ratios, then coarsens each channel
//! by repeatedly merging low-weight points into a Delaunay neighbor chosen
//! with inverse-squared-distance weighting. The two coarsened clouds are
//! reconciled into one combined cloud whose log ratios are recomputed with
//! percentile-capped centering.
//!
//! # Example
//!
//! ```
//! use voroserp::{extract_points, SparseRecord, VoroserpConfig};
//!
//! let records = vec![
//!     SparseRecord::new(0, 0, 1.0, 0.0),
//!     SparseRecord::new(0, 1, 0.0, 1.0),
//!     SparseRecord::new(1, 1, 5.0, 5.0),
//! ];
//!
//! let config = VoroserpConfig::default();
//! let points = extract_points(&records, &config);
//!
//! // With pseudocount 1: log2(2/1), log2(1/2), log2(6/6), mean-centered.
//! assert_eq!(points[0].log_ratio, 1.0);
//! assert_eq!(points[1].log_ratio, -1.0);
//! assert_eq!(points[2].log_ratio, 0.0);
//! ```

mod error;
mod extract;
mod graph;
mod normalize;
mod types;
pub mod ingest;
pub mod validation;

// Internal modules
pub(crate) mod binning;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use binning::{bin_points, BinParams};

pub use error::VoroserpError;
pub use extract::extract_points;
pub use graph::NeighborGraph;
pub use normalize::{raw_log_ratio, reconcile_binned};
pub use types::{Channel, LogBase, Point, RecordLike, SparseRecord};

/// Output from a full binning run: the extracted cloud, both per-channel
/// coarsened clouds, and the reconciled combination.
#[derive(Debug, Clone)]
pub struct VoroserpOutput {
    /// The initial point cloud, filtered, truncated, and mean-centered.
    pub extracted: Vec<Point>,
    /// Channel-A coarsened cloud.
    pub binned_a: Vec<Point>,
    /// Channel-B coarsened cloud.
    pub binned_b: Vec<Point>,
    /// Reconciled union of both coarsened clouds, with percentile-capped
    /// log ratios.
    pub combined: Vec<Point>,
    /// Diagnostic information about the computation.
    pub diagnostics: VoroserpDiagnostics,
}

/// Per-channel run statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelStats {
    /// Outer iterations actually executed.
    pub iterations: usize,
    /// Total merges across all passes.
    pub merges: usize,
    /// Points surviving the run.
    pub surviving: usize,
}

/// Diagnostic information from a full binning run.
#[derive(Debug, Clone, Default)]
pub struct VoroserpDiagnostics {
    pub channel_a: ChannelStats,
    pub channel_b: ChannelStats,
}

/// Configuration for a full binning run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoroserpConfig {
    /// Base of the log-ratio logarithm.
    pub log_base: LogBase,
    /// Added to both channels before taking the ratio. Must be finite and
    /// positive; a pseudocount of 0 is accepted but yields infinite ratios
    /// on one-sided points, which the centering step folds back in.
    pub pseudocount: f64,
    /// Records whose channel sum falls below this are dropped at extraction.
    pub value_threshold: f64,
    /// At most this many points enter the pipeline; the heaviest are kept.
    pub max_points: usize,
    /// Merge eligibility threshold for the channel-A run.
    pub merge_threshold_a: f64,
    /// Merge eligibility threshold for the channel-B run.
    pub merge_threshold_b: f64,
    /// Outer iteration budget per channel run.
    pub max_iterations: usize,
    /// Seed for the per-channel random sources. `None` seeds from entropy;
    /// a fixed seed makes the whole run reproducible.
    pub seed: Option<u64>,
}

impl Default for VoroserpConfig {
    fn default() -> Self {
        Self {
            log_base: LogBase::Two,
            pseudocount: 1.0,
            value_threshold: 0.0,
            max_points: 20_000,
            merge_threshold_a: 10.0,
            merge_threshold_b: 10.0,
            max_iterations: 10,
            seed: None,
        }
    }
}

impl VoroserpConfig {
    /// Reject configuration the pipeline cannot run with.
    ///
    /// Thresholds and iteration budgets of any magnitude are allowed; only
    /// a broken pseudocount or an empty point budget is an error.
    pub fn validate(&self) -> Result<(), VoroserpError> {
        if !self.pseudocount.is_finite() || self.pseudocount < 0.0 {
            return Err(VoroserpError::InvalidPseudocount(self.pseudocount));
        }
        if self.max_points == 0 {
            return Err(VoroserpError::ZeroMaxPoints);
        }
        Ok(())
    }
}

/// Observer for per-pass progress during the two channel runs.
///
/// Called after every completed pass with the channel, the 1-based pass
/// number, the merges performed in that pass, and the iteration budget.
pub trait ProgressObserver: Sync {
    fn on_pass(&self, channel: Channel, iteration: usize, merged: usize, max_iterations: usize);
}

/// Observer that discards all progress reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_pass(&self, _: Channel, _: usize, _: usize, _: usize) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(Channel, usize, usize, usize) + Sync,
{
    fn on_pass(&self, channel: Channel, iteration: usize, merged: usize, max_iterations: usize) {
        self(channel, iteration, merged, max_iterations)
    }
}

/// Run the full pipeline with no progress reporting.
pub fn run<R: RecordLike>(
    records: &[R],
    config: &VoroserpConfig,
) -> Result<VoroserpOutput, VoroserpError> {
    run_with_observer(records, config, &NoProgress)
}

/// Run the full pipeline: extract, coarsen both channels, reconcile.
///
/// The two channel runs are independent (each works on its own copy of the
/// extracted cloud) and execute concurrently when the `parallel` feature is
/// enabled.
///
/// Data-shape problems are never errors here: an empty or fully filtered
/// record list flows through as an empty output. Only invalid configuration
/// is rejected.
pub fn run_with_observer<R: RecordLike>(
    records: &[R],
    config: &VoroserpConfig,
    observer: &dyn ProgressObserver,
) -> Result<VoroserpOutput, VoroserpError> {
    config.validate()?;

    let extracted = extract_points(records, config);

    let base_seed = match config.seed {
        Some(seed) => seed,
        None => rand::thread_rng().gen(),
    };
    // Decorrelate the B run from the A run while keeping both derived from
    // one caller-provided seed.
    let seed_b = base_seed ^ 0x9E37_79B9_7F4A_7C15;

    let run_channel = |channel: Channel, threshold: f64, seed: u64| {
        let params = BinParams {
            threshold,
            max_iterations: config.max_iterations,
            pseudocount: config.pseudocount,
            log_base: config.log_base,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        bin_points(extracted.clone(), &params, &mut rng, |iteration, merged, max| {
            observer.on_pass(channel, iteration, merged, max)
        })
    };

    #[cfg(feature = "parallel")]
    let (outcome_a, outcome_b) = rayon::join(
        || run_channel(Channel::A, config.merge_threshold_a, base_seed),
        || run_channel(Channel::B, config.merge_threshold_b, seed_b),
    );
    #[cfg(not(feature = "parallel"))]
    let (outcome_a, outcome_b) = (
        run_channel(Channel::A, config.merge_threshold_a, base_seed),
        run_channel(Channel::B, config.merge_threshold_b, seed_b),
    );

    let diagnostics = VoroserpDiagnostics {
        channel_a: ChannelStats {
            iterations: outcome_a.iterations,
            merges: outcome_a.merges,
            surviving: outcome_a.points.len(),
        },
        channel_b: ChannelStats {
            iterations: outcome_b.iterations,
            merges: outcome_b.merges,
            surviving: outcome_b.points.len(),
        },
    };

    let combined = reconcile_binned(
        &outcome_a.points,
        &outcome_b.points,
        config.pseudocount,
        config.log_base,
    );

    Ok(VoroserpOutput {
        extracted,
        binned_a: outcome_a.points,
        binned_b: outcome_b.points,
        combined,
        diagnostics,
    })
}
