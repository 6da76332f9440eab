//! Structural validation for binning runs.
//!
//! Provides functions to verify conservation and bookkeeping invariants of a
//! merge pass. Useful for debugging, testing, and catching numerical issues.

use rustc_hash::FxHashSet;

use crate::types::Point;

/// Detailed validation report for one binning run.
#[derive(Debug, Clone)]
pub struct BinningReport {
    /// Number of input points.
    pub input_points: usize,
    /// Number of output points.
    pub output_points: usize,

    /// Total channel-A mass in the input.
    pub input_mass_a: f64,
    /// Total channel-B mass in the input.
    pub input_mass_b: f64,
    /// Total channel-A mass in the output.
    pub output_mass_a: f64,
    /// Total channel-B mass in the output.
    pub output_mass_b: f64,

    /// Number of output points sharing an id with another output point.
    pub duplicate_ids: usize,
    /// Number of output points still flagged as removed.
    pub removed_points_in_output: usize,
    /// Number of output points carrying an id absent from the input.
    pub unknown_ids: usize,
    /// Number of output points with a non-finite coordinate.
    pub non_finite_positions: usize,
}

impl BinningReport {
    /// Check the run with a relative tolerance on mass conservation.
    ///
    /// Requires:
    /// - Per-channel mass conserved within `tolerance` (relative)
    /// - Output no larger than input
    /// - No duplicate or unknown ids, no removed points, finite coordinates
    pub fn is_valid(&self, tolerance: f64) -> bool {
        let mass_ok = |input: f64, output: f64| {
            let scale = input.abs().max(1.0);
            (input - output).abs() <= tolerance * scale
        };
        mass_ok(self.input_mass_a, self.output_mass_a)
            && mass_ok(self.input_mass_b, self.output_mass_b)
            && self.output_points <= self.input_points
            && self.duplicate_ids == 0
            && self.unknown_ids == 0
            && self.removed_points_in_output == 0
            && self.non_finite_positions == 0
    }

    /// Format a summary of any issues found.
    pub fn summary(&self) -> String {
        let mut issues = Vec::new();

        let drift_a = (self.input_mass_a - self.output_mass_a).abs();
        let drift_b = (self.input_mass_b - self.output_mass_b).abs();
        if drift_a > 0.0 {
            issues.push(format!("channel A mass drift {:.3e}", drift_a));
        }
        if drift_b > 0.0 {
            issues.push(format!("channel B mass drift {:.3e}", drift_b));
        }
        if self.output_points > self.input_points {
            issues.push(format!(
                "output grew ({} -> {})",
                self.input_points, self.output_points
            ));
        }
        if self.duplicate_ids > 0 {
            issues.push(format!("{} duplicate ids", self.duplicate_ids));
        }
        if self.unknown_ids > 0 {
            issues.push(format!("{} unknown ids", self.unknown_ids));
        }
        if self.removed_points_in_output > 0 {
            issues.push(format!(
                "{} removed points in output",
                self.removed_points_in_output
            ));
        }
        if self.non_finite_positions > 0 {
            issues.push(format!(
                "{} non-finite positions",
                self.non_finite_positions
            ));
        }

        if issues.is_empty() {
            "Clean".to_string()
        } else {
            issues.join(", ")
        }
    }
}

impl std::fmt::Display for BinningReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BinningReport {{ points {} -> {}, {} }}",
            self.input_points,
            self.output_points,
            self.summary()
        )
    }
}

/// Validate one binning run against its input cloud.
///
/// Checks:
/// - Per-channel mass conservation
/// - Point count never grows
/// - Output ids unique and drawn from the input id set
/// - No removed points survive into the output
/// - All output coordinates finite
pub fn validate_binning(input: &[Point], output: &[Point]) -> BinningReport {
    let mut input_mass_a = 0.0;
    let mut input_mass_b = 0.0;
    let mut input_ids = FxHashSet::default();
    for p in input {
        input_mass_a += p.value_a;
        input_mass_b += p.value_b;
        input_ids.insert(p.id);
    }

    let mut output_mass_a = 0.0;
    let mut output_mass_b = 0.0;
    let mut seen_ids = FxHashSet::default();
    let mut duplicate_ids = 0;
    let mut unknown_ids = 0;
    let mut removed_points_in_output = 0;
    let mut non_finite_positions = 0;
    for p in output {
        output_mass_a += p.value_a;
        output_mass_b += p.value_b;
        if !seen_ids.insert(p.id) {
            duplicate_ids += 1;
        }
        if !input_ids.contains(&p.id) {
            unknown_ids += 1;
        }
        if p.removed {
            removed_points_in_output += 1;
        }
        if !p.row.is_finite() || !p.col.is_finite() {
            non_finite_positions += 1;
        }
    }

    BinningReport {
        input_points: input.len(),
        output_points: output.len(),
        input_mass_a,
        input_mass_b,
        output_mass_a,
        output_mass_b,
        duplicate_ids,
        removed_points_in_output,
        unknown_ids,
        non_finite_positions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: u32, row: f64, col: f64, value_a: f64, value_b: f64) -> Point {
        Point {
            id,
            row,
            col,
            value_a,
            value_b,
            log_ratio: 0.0,
            original_index: id as i32,
            removed: false,
        }
    }

    #[test]
    fn test_identity_run_is_valid() {
        let input = vec![point(0, 0.0, 0.0, 2.0, 1.0), point(1, 1.0, 1.0, 3.0, 4.0)];
        let report = validate_binning(&input, &input);
        assert!(report.is_valid(1e-9), "{}", report);
        assert_eq!(report.summary(), "Clean");
    }

    #[test]
    fn test_mass_drift_is_flagged() {
        let input = vec![point(0, 0.0, 0.0, 2.0, 1.0), point(1, 1.0, 1.0, 3.0, 4.0)];
        let output = vec![point(0, 0.5, 0.5, 4.0, 5.0)];
        let report = validate_binning(&input, &output);
        assert!(!report.is_valid(1e-9));
        assert!(report.summary().contains("mass drift"));
    }

    #[test]
    fn test_bookkeeping_issues_are_flagged() {
        let input = vec![point(0, 0.0, 0.0, 1.0, 1.0), point(1, 1.0, 1.0, 1.0, 1.0)];
        let mut bad = point(7, 0.0, 0.0, 2.0, 2.0);
        bad.removed = true;
        let output = vec![bad];
        let report = validate_binning(&input, &output);
        assert_eq!(report.unknown_ids, 1);
        assert_eq!(report.removed_points_in_output, 1);
        assert!(!report.is_valid(1e-9));
    }

    #[test]
    fn test_duplicate_ids_detected() {
        let input = vec![point(0, 0.0, 0.0, 1.0, 0.0), point(1, 1.0, 0.0, 1.0, 0.0)];
        let output = vec![point(0, 0.0, 0.0, 1.0, 0.0), point(0, 1.0, 0.0, 1.0, 0.0)];
        let report = validate_binning(&input, &output);
        assert_eq!(report.duplicate_ids, 1);
    }
}
