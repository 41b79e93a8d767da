//! Hold-out evaluation: classify every testing record and report accuracy.

use std::fmt;
use std::io::Write;

use num_traits::{AsPrimitive, Float};
use rayon::prelude::*;

use crate::common_types::{Dataset, Record};
use crate::config::ExperimentConfig;
use crate::error::{KnnError, Result};
use crate::knn::classify;
use crate::split::{stratified_split, stratified_split_seeded};

/// One testing record whose predicted label differs from its stored label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misclassification<'a> {
    /// Position of the record in the testing set.
    pub index: usize,
    pub actual: &'a str,
    pub predicted: String,
}

impl fmt::Display for Misclassification<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Miss! {} classified as {}", self.actual, self.predicted)
    }
}

/// Receives misclassifications as they are tallied, in testing order.
pub trait MissSink {
    fn record_miss(&mut self, miss: &Misclassification<'_>);
}

impl<T> MissSink for T
where
    T: FnMut(&Misclassification<'_>),
{
    fn record_miss(&mut self, miss: &Misclassification<'_>) {
        self(miss)
    }
}

/// Writes one line per miss to any `Write` destination.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MissSink for WriterSink<W> {
    fn record_miss(&mut self, miss: &Misclassification<'_>) {
        if let Err(err) = writeln!(self.writer, "{}", miss) {
            tracing::warn!(error = %err, "failed to write misclassification");
        }
    }
}

/// Emits each miss as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MissSink for TracingSink {
    fn record_miss(&mut self, miss: &Misclassification<'_>) {
        tracing::info!(
            index = miss.index,
            actual = miss.actual,
            predicted = %miss.predicted,
            "misclassified"
        );
    }
}

/// Summary of one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationReport {
    pub total: usize,
    pub training: usize,
    pub testing: usize,
    pub hits: usize,
    /// `hits * 100 / testing`, truncated toward zero (2 of 3 reports 66).
    pub accuracy: usize,
}

impl EvaluationReport {
    /// Testing records that were misclassified; 0 for an inconsistent hand-built report.
    pub fn misses(&self) -> usize {
        self.testing.saturating_sub(self.hits)
    }

    /// Exact hit ratio, without the truncation applied to `accuracy`.
    ///
    /// Clamped to `[0, 1]`; a report with no testing records yields 0.
    pub fn accuracy_ratio(&self) -> f64 {
        if self.testing == 0 {
            return 0.0;
        }
        self.hits.min(self.testing) as f64 / self.testing as f64
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total: {}, training: {}, testing: {}, hits: {}, accuracy: {}%",
            self.total, self.training, self.testing, self.hits, self.accuracy
        )
    }
}

/// Classifies every record of `testing` against `training` and counts hits.
///
/// Records are classified in parallel; the outcomes are then reduced in testing
/// order, so `sink` sees misses in a deterministic order.
///
/// # Errors
/// `EmptyTestSet` if `testing` is empty; otherwise any classifier error
/// (`EmptyTrainingSet`, `InvalidK`, `DimensionMismatch`).
#[tracing::instrument(level = "debug", skip_all, fields(k = k, training = training.len(), testing = testing.len()))]
pub fn evaluate<F, S>(
    training: &[Record<F>],
    testing: &[Record<F>],
    k: usize,
    sink: &mut S,
) -> Result<EvaluationReport>
where
    F: Float + AsPrimitive<f64> + Send + Sync,
    S: MissSink + ?Sized,
{
    if testing.is_empty() {
        return Err(KnnError::EmptyTestSet);
    }

    let predictions: Vec<String> = testing
        .par_iter()
        .map(|record| classify(training, &record.features, k))
        .collect::<Result<_>>()?;

    let hits = testing
        .iter()
        .zip(predictions)
        .enumerate()
        .fold(0, |hits, (index, (record, predicted))| {
            if record.label == predicted {
                return hits + 1;
            }
            sink.record_miss(&Misclassification {
                index,
                actual: &record.label,
                predicted,
            });
            hits
        });

    let report = EvaluationReport {
        total: training.len() + testing.len(),
        training: training.len(),
        testing: testing.len(),
        hits,
        accuracy: hits * 100 / testing.len(),
    };
    tracing::info!(hits = report.hits, accuracy = report.accuracy, "evaluation finished");
    Ok(report)
}

/// Splits `dataset` as configured and evaluates the held-out part.
pub fn run_experiment<F, S>(
    dataset: &Dataset<F>,
    config: &ExperimentConfig,
    sink: &mut S,
) -> Result<EvaluationReport>
where
    F: Float + AsPrimitive<f64> + Send + Sync,
    S: MissSink + ?Sized,
{
    let split = match config.shuffle_seed {
        Some(seed) => stratified_split_seeded(dataset, config.testing_fraction, seed)?,
        None => stratified_split(dataset, config.testing_fraction)?,
    };
    evaluate(&split.training, &split.testing, config.k, sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_clusters() -> Vec<Record<f64>> {
        vec![
            Record::new(vec![0.0, 0.0], "A"),
            Record::new(vec![0.0, 1.0], "A"),
            Record::new(vec![10.0, 10.0], "B"),
            Record::new(vec![10.0, 11.0], "B"),
        ]
    }

    #[test]
    fn test_accuracy_truncates() {
        let training = two_clusters();
        let testing = vec![
            Record::new(vec![0.5, 0.5], "A"),
            Record::new(vec![9.0, 9.0], "B"),
            Record::new(vec![9.5, 9.5], "A"), // lands in the B cluster
        ];
        let mut misses = Vec::new();
        let mut sink = |miss: &Misclassification<'_>| misses.push(miss.to_string());
        let report = evaluate(&training, &testing, 1, &mut sink).unwrap();

        assert_eq!(report.hits, 2);
        assert_eq!(report.accuracy, 66);
        assert_eq!(report.misses(), 1);
        assert!((report.accuracy_ratio() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.total, 7);
        assert_eq!(misses, vec!["Miss! A classified as B"]);
    }

    #[test]
    fn test_empty_testing_set() {
        let training = two_clusters();
        let mut sink = TracingSink;
        assert!(matches!(
            evaluate(&training, &[], 1, &mut sink),
            Err(KnnError::EmptyTestSet)
        ));
    }

    #[test]
    fn test_misses_arrive_in_testing_order() {
        let training = two_clusters();
        let testing = vec![
            Record::new(vec![10.0, 10.0], "A"),
            Record::new(vec![0.0, 0.0], "A"),
            Record::new(vec![0.0, 0.0], "B"),
        ];
        let mut sink = WriterSink::new(Vec::new());
        let report = evaluate(&training, &testing, 1, &mut sink).unwrap();
        assert_eq!(report.hits, 1);
        assert_eq!(report.accuracy, 33);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "Miss! A classified as B\nMiss! B classified as A\n"
        );
    }

    #[test]
    fn test_classifier_errors_propagate() {
        let training = two_clusters();
        let testing = vec![Record::new(vec![0.0, 0.0], "A")];
        let mut sink = TracingSink;
        assert!(matches!(
            evaluate(&training, &testing, 5, &mut sink),
            Err(KnnError::InvalidK { k: 5, available: 4 })
        ));
        assert!(matches!(
            evaluate(&[], &testing, 1, &mut sink),
            Err(KnnError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_report_helpers_on_hand_built_values() {
        let empty = EvaluationReport { total: 4, training: 4, testing: 0, hits: 0, accuracy: 0 };
        assert_eq!(empty.misses(), 0);
        assert_eq!(empty.accuracy_ratio(), 0.0);

        let inconsistent = EvaluationReport { total: 5, training: 2, testing: 3, hits: 5, accuracy: 100 };
        assert_eq!(inconsistent.misses(), 0);
        assert_eq!(inconsistent.accuracy_ratio(), 1.0);
    }

    #[test]
    fn test_report_display() {
        let report = EvaluationReport {
            total: 569,
            training: 116,
            testing: 453,
            hits: 420,
            accuracy: 92,
        };
        assert_eq!(
            report.to_string(),
            "total: 569, training: 116, testing: 453, hits: 420, accuracy: 92%"
        );
    }

    #[test]
    fn test_run_experiment_splits_then_evaluates() {
        let mut records = Vec::new();
        for i in 0..10 {
            records.push(Record::new(vec![i as f64 * 0.1], "low"));
            records.push(Record::new(vec![100.0 + i as f64 * 0.1], "high"));
        }
        let dataset = Dataset::new(records).unwrap();
        let config = ExperimentConfig {
            k: 1,
            ..ExperimentConfig::default()
        };
        let mut sink = TracingSink;
        let report = run_experiment(&dataset, &config, &mut sink).unwrap();
        assert_eq!(report.total, 20);
        assert_eq!(report.testing, 16);
        assert_eq!(report.training, 4);
        assert_eq!(report.hits, 16);
        assert_eq!(report.accuracy, 100);
    }
}
