//! Euclidean distance between feature vectors.

use num_traits::{AsPrimitive, Float};

use crate::common_types::Record;
use crate::error::{KnnError, Result};

/// Calculates the Euclidean distance between two feature vectors.
///
/// Differences are taken in `F` and accumulated in `f64`. Vectors of different
/// lengths are rejected rather than silently truncated by the zip.
pub fn euclidean_distance<F>(a: &[F], b: &[F]) -> Result<f64>
where
    F: Float + AsPrimitive<f64>,
{
    if a.len() != b.len() {
        return Err(KnnError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let sum_sq_diff: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let diff: f64 = (x - y).as_();
            diff * diff
        })
        .sum();
    Ok(sum_sq_diff.sqrt())
}

/// Distance between the feature vectors of two records; labels are ignored.
pub fn record_distance<F>(a: &Record<F>, b: &Record<F>) -> Result<f64>
where
    F: Float + AsPrimitive<f64>,
{
    euclidean_distance(&a.features, &b.features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let vec_a = vec![1.0, 2.0, 3.0];
        let vec_b = vec![4.0, 5.0, 6.0];
        let epsilon = 1e-9;

        // sqrt(9 + 9 + 9)
        let dist = euclidean_distance(&vec_a, &vec_b).unwrap();
        let expected = (27.0_f64).sqrt();
        assert!((dist - expected).abs() < epsilon, "Expected {}, got {}", expected, dist);

        let empty_vec: Vec<f64> = vec![];
        assert_eq!(euclidean_distance(&empty_vec, &empty_vec).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_self() {
        let a = Record::new(vec![0.3, -7.25, 1e6], "A");
        let b = Record::new(vec![2.1, 4.0, -3.5], "B");
        assert_eq!(record_distance(&a, &b).unwrap(), record_distance(&b, &a).unwrap());
        assert_eq!(record_distance(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_labels_do_not_affect_distance() {
        let a = Record::new(vec![1.0, 1.0], "A");
        let b = Record::new(vec![1.0, 1.0], "B");
        assert_eq!(record_distance(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = euclidean_distance(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(KnnError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_single_precision_features() {
        let dist = euclidean_distance(&[0.0_f32, 0.0], &[3.0_f32, 4.0]).unwrap();
        assert!((dist - 5.0).abs() < 1e-6);
    }
}
