//! Brute-force k-nearest-neighbours classification.

pub mod distance;
pub mod heap_utils;
pub mod vote;

use num_traits::{AsPrimitive, Float};
use rayon::prelude::*;

use crate::common_types::{Dataset, Record};
use crate::error::{KnnError, Result, check_k};
use distance::euclidean_distance;
use heap_utils::KBestNeighbors;

/// A training record seen from one query: its distance and its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour<'a> {
    pub distance: f64,
    pub label: &'a str,
}

/// Returns exactly `k` neighbours of `query`, nearest first.
///
/// Distance ties are resolved by position in `training`, earlier first.
///
/// # Errors
/// `EmptyTrainingSet` if `training` is empty, `InvalidK` unless
/// `1 <= k <= training.len()`, `DimensionMismatch` if a training record and
/// the query differ in feature count.
pub fn nearest_neighbours<'a, F>(
    training: &'a [Record<F>],
    query: &[F],
    k: usize,
) -> Result<Vec<Neighbour<'a>>>
where
    F: Float + AsPrimitive<f64>,
{
    check_k(k, training.len())?;

    let mut best = KBestNeighbors::new(k);
    for (index, record) in training.iter().enumerate() {
        let distance = euclidean_distance(&record.features, query)?;
        best.add(distance, index, Neighbour { distance, label: &record.label });
    }
    debug_assert_eq!(best.len(), k);
    Ok(best.into_sorted_points())
}

/// Predicts the label of `query` by majority vote among its `k` nearest training records.
///
/// `query` holds only features; a held-out record's own label is never consulted.
/// The returned label is always one of the labels present in `training`.
pub fn classify<F>(training: &[Record<F>], query: &[F], k: usize) -> Result<String>
where
    F: Float + AsPrimitive<f64>,
{
    let neighbours = nearest_neighbours(training, query, k)?;
    let label = vote::majority_vote(&neighbours).ok_or(KnnError::EmptyTrainingSet)?;
    tracing::trace!(k, label, nearest = neighbours[0].distance, "classified query");
    Ok(label.to_string())
}

/// The K-Nearest Neighbors Classifier.
///
/// A lazy learner: fitting only validates and stores the training records, all
/// work happens at prediction time.
#[derive(Debug, Clone)]
pub struct KnnClassifier<F> {
    k: usize,
    training_data: Vec<Record<F>>,
}

impl<F> KnnClassifier<F>
where
    F: Float + AsPrimitive<f64> + Send + Sync,
{
    pub fn new(k: usize) -> Self {
        Self {
            k,
            training_data: Vec::new(),
        }
    }

    /// Trains the classifier.
    ///
    /// Any existing training data is replaced. Fails if the records are empty,
    /// disagree on feature count, or hold fewer than `k` records.
    pub fn fit(&mut self, training_data: Vec<Record<F>>) -> Result<()> {
        let dataset = Dataset::new(training_data)?;
        check_k(self.k, dataset.len())?;
        tracing::debug!(
            k = self.k,
            records = dataset.len(),
            dimensions = dataset.dimensions(),
            "fitted k-NN classifier"
        );
        self.training_data = dataset.into_records();
        Ok(())
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn training_data(&self) -> &[Record<F>] {
        &self.training_data
    }

    /// Predicts the label for a single sample.
    ///
    /// # Errors
    /// `EmptyTrainingSet` if `fit` has not succeeded yet.
    pub fn predict_single(&self, test_sample_features: &[F]) -> Result<String> {
        classify(&self.training_data, test_sample_features, self.k)
    }

    /// Predicts labels for a batch of samples, classifying them in parallel.
    ///
    /// Output order matches input order.
    pub fn predict(&self, test_data: &[Vec<F>]) -> Result<Vec<String>> {
        test_data
            .par_iter()
            .map(|features| self.predict_single(features))
            .collect()
    }
}
