//! Core types for adaptive contact-map binning.

use glam::DVec2;

/// Logarithm base used for channel log ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogBase {
    #[default]
    Two,
    Ten,
    Natural,
}

impl LogBase {
    /// Logarithm of a positive value in this base.
    #[inline]
    pub fn log(self, value: f64) -> f64 {
        match self {
            LogBase::Two => value.log2(),
            LogBase::Ten => value.log10(),
            LogBase::Natural => value.ln(),
        }
    }
}

/// One of the two weight channels carried per point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    A,
    B,
}

/// A raw sparse contact record: integer matrix coordinates plus one
/// accumulated weight per channel.
///
/// Records are expected to be pre-merged by coordinate (one record per
/// `(row, col)` pair); the `ingest` module produces them in that form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseRecord {
    pub row: u32,
    pub col: u32,
    pub value_a: f64,
    pub value_b: f64,
}

impl SparseRecord {
    #[inline]
    pub const fn new(row: u32, col: u32, value_a: f64, value_b: f64) -> Self {
        Self {
            row,
            col,
            value_a,
            value_b,
        }
    }
}

/// Trait for types that can be used as input records.
///
/// This allows zero-copy input from caller-side record types.
pub trait RecordLike {
    fn row(&self) -> u32;
    fn col(&self) -> u32;
    fn value_a(&self) -> f64;
    fn value_b(&self) -> f64;
}

impl RecordLike for SparseRecord {
    #[inline]
    fn row(&self) -> u32 {
        self.row
    }
    #[inline]
    fn col(&self) -> u32 {
        self.col
    }
    #[inline]
    fn value_a(&self) -> f64 {
        self.value_a
    }
    #[inline]
    fn value_b(&self) -> f64 {
        self.value_b
    }
}

impl RecordLike for (u32, u32, f64, f64) {
    #[inline]
    fn row(&self) -> u32 {
        self.0
    }
    #[inline]
    fn col(&self) -> u32 {
        self.1
    }
    #[inline]
    fn value_a(&self) -> f64 {
        self.2
    }
    #[inline]
    fn value_b(&self) -> f64 {
        self.3
    }
}

/// A point in the binning pipeline.
///
/// Positions start at the integer matrix coordinates of the source record but
/// become fractional once merges relocate survivors to mass-weighted
/// centroids. A removed point is terminal: it never regains mass and never
/// re-enters a neighbor graph; it is kept in storage only for traceability.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Stable identifier, unique among active points, never reused.
    pub id: u32,
    pub row: f64,
    pub col: f64,
    pub value_a: f64,
    pub value_b: f64,
    /// Signed log-ratio signal; NaN until first assigned.
    pub log_ratio: f64,
    /// Index into the pre-filter input ordering, or -1 if the point was
    /// synthesized downstream (e.g. during reconciliation).
    pub original_index: i32,
    pub removed: bool,
}

impl Point {
    /// Total mass across both channels.
    #[inline]
    pub fn sum_value(&self) -> f64 {
        self.value_a + self.value_b
    }

    /// Position in the (col, row) plane used for all geometry.
    #[inline]
    pub fn pos(&self) -> DVec2 {
        DVec2::new(self.col, self.row)
    }
}
