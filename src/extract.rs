//! Point extraction: raw sparse records to normalized pipeline points.

use std::cmp::Ordering;

use crate::normalize;
use crate::types::{Point, RecordLike};
use crate::VoroserpConfig;

#[inline]
fn weight_or_zero(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

/// Extract pipeline points from raw sparse records.
///
/// Each record becomes a point with a provisional log ratio; records whose
/// total weight falls below `config.value_threshold` are dropped; if more
/// than `config.max_points` remain, only the heaviest survive (ties keep
/// input order); finally log ratios are mean-centered with the extend rule.
///
/// Output ids are a dense 0-based sequence in output order and
/// `original_index` preserves each point's pre-filter input position. NaN
/// weights are treated as 0; nothing here is fatal.
pub fn extract_points<R: RecordLike>(records: &[R], config: &VoroserpConfig) -> Vec<Point> {
    let mut points: Vec<Point> = records
        .iter()
        .enumerate()
        .map(|(idx, rec)| {
            let value_a = weight_or_zero(rec.value_a());
            let value_b = weight_or_zero(rec.value_b());
            Point {
                id: 0,
                row: rec.row() as f64,
                col: rec.col() as f64,
                value_a,
                value_b,
                log_ratio: normalize::raw_log_ratio(
                    value_a,
                    value_b,
                    config.pseudocount,
                    config.log_base,
                ),
                original_index: idx as i32,
                removed: false,
            }
        })
        .filter(|p| p.sum_value() >= config.value_threshold)
        .collect();

    if points.len() > config.max_points {
        // Stable sort: equal weights keep their input order.
        points.sort_by(|a, b| {
            b.sum_value()
                .partial_cmp(&a.sum_value())
                .unwrap_or(Ordering::Equal)
        });
        points.truncate(config.max_points);
    }

    for (idx, p) in points.iter_mut().enumerate() {
        p.id = idx as u32;
    }

    normalize::center_log_ratios(&mut points);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SparseRecord;

    fn config() -> VoroserpConfig {
        VoroserpConfig {
            pseudocount: 1.0,
            value_threshold: 0.0,
            max_points: 10,
            ..VoroserpConfig::default()
        }
    }

    #[test]
    fn test_extract_basic_log_ratios() {
        let records = vec![
            SparseRecord::new(0, 0, 1.0, 0.0),
            SparseRecord::new(0, 1, 0.0, 1.0),
            SparseRecord::new(1, 0, 5.0, 5.0),
        ];
        let points = extract_points(&records, &config());
        assert_eq!(points.len(), 3);
        // Pre-centering ratios are log2(2/1)=1, log2(1/2)=-1, log2(6/6)=0;
        // their mean is 0 so centering leaves them unchanged.
        assert_eq!(points[0].log_ratio, 1.0);
        assert_eq!(points[1].log_ratio, -1.0);
        assert_eq!(points[2].log_ratio, 0.0);
        // Dense ids, input-order traceability.
        assert_eq!(
            points.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            points.iter().map(|p| p.original_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_extract_threshold_drops_light_records() {
        let records = vec![
            SparseRecord::new(0, 0, 1.0, 0.5),
            SparseRecord::new(0, 1, 3.0, 3.0),
        ];
        let cfg = VoroserpConfig {
            value_threshold: 2.0,
            ..config()
        };
        let points = extract_points(&records, &cfg);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].original_index, 1);
        assert_eq!(points[0].id, 0);
    }

    #[test]
    fn test_extract_caps_to_heaviest() {
        let records = vec![
            SparseRecord::new(0, 0, 1.0, 0.0),
            SparseRecord::new(0, 1, 9.0, 0.0),
            SparseRecord::new(0, 2, 4.0, 0.0),
            SparseRecord::new(0, 3, 7.0, 0.0),
        ];
        let cfg = VoroserpConfig {
            max_points: 2,
            ..config()
        };
        let points = extract_points(&records, &cfg);
        assert_eq!(points.len(), 2);
        assert_eq!(
            points.iter().map(|p| p.original_index).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn test_extract_cap_ties_keep_input_order() {
        let records = vec![
            SparseRecord::new(0, 0, 2.0, 0.0),
            SparseRecord::new(0, 1, 2.0, 0.0),
            SparseRecord::new(0, 2, 2.0, 0.0),
        ];
        let cfg = VoroserpConfig {
            max_points: 2,
            ..config()
        };
        let points = extract_points(&records, &cfg);
        assert_eq!(
            points.iter().map(|p| p.original_index).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn test_extract_nan_weights_default_to_zero() {
        let records = vec![(0u32, 0u32, f64::NAN, 2.0), (0u32, 1u32, 1.0, 1.0)];
        let points = extract_points(&records, &config());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value_a, 0.0);
        assert_eq!(points[0].value_b, 2.0);
    }

    #[test]
    fn test_extract_zero_pseudocount_extends_infinities() {
        // Zero pseudocount is a defined edge case: one-sided records get the
        // extend-rule rewrite instead of a raw infinity.
        let records = vec![
            SparseRecord::new(0, 0, 4.0, 0.0),
            SparseRecord::new(0, 1, 4.0, 1.0),
        ];
        let cfg = VoroserpConfig {
            pseudocount: 0.0,
            ..config()
        };
        let points = extract_points(&records, &cfg);
        // Finite: log2(4/1) = 2; mean = 2; the infinity maps to (2-2)+1 = 1.
        assert!(points.iter().all(|p| p.log_ratio.is_finite()));
        assert_eq!(points[0].log_ratio, 1.0);
        assert_eq!(points[1].log_ratio, 0.0);
    }
}
