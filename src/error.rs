//! Error types for the binning pipeline.

use std::fmt;

/// Errors that can occur before or while entering the pipeline.
///
/// Insufficient geometry (fewer than 3 points for a triangulation) and
/// degenerate numerics are deliberately *not* errors: they are defined
/// terminal or skip conditions handled inside the components.
#[derive(Debug, Clone)]
pub enum VoroserpError {
    /// Pseudocount must be finite and non-negative; anything else produces
    /// non-finite intermediate results throughout the pipeline.
    InvalidPseudocount(f64),

    /// The point-count cap must be at least 1.
    ZeroMaxPoints,

    /// Ingested text contained no usable data.
    EmptyInput(String),

    /// Ingested text was structurally unusable (individual bad rows are
    /// skipped instead of reported).
    MalformedInput { line: usize, message: String },
}

impl fmt::Display for VoroserpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoroserpError::InvalidPseudocount(v) => {
                write!(f, "pseudocount must be finite and >= 0, got {}", v)
            }
            VoroserpError::ZeroMaxPoints => {
                write!(f, "max_points must be at least 1")
            }
            VoroserpError::EmptyInput(what) => {
                write!(f, "empty input: {}", what)
            }
            VoroserpError::MalformedInput { line, message } => {
                write!(f, "malformed input at line {}: {}", line, message)
            }
        }
    }
}

impl std::error::Error for VoroserpError {}
