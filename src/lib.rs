//! Stratified hold-out evaluation of a k-nearest-neighbours classifier.
//!
//! The pipeline: [`ingest`] reads labeled rows into a [`Dataset`], [`split`]
//! partitions it per class, [`knn`] classifies each held-out record by majority
//! vote among its `k` nearest training records, and [`evaluate`] tallies hits.

pub mod common_types;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod ingest;
pub mod knn;
pub mod split;

#[cfg(feature = "python")]
mod python;

pub use common_types::{Dataset, Record};
pub use config::ExperimentConfig;
pub use error::{KnnError, Result};
pub use evaluate::{
    EvaluationReport, Misclassification, MissSink, TracingSink, WriterSink, evaluate,
    run_experiment,
};
pub use ingest::{CsvOptions, MalformedRowPolicy, load_dataset, read_dataset};
pub use knn::{KnnClassifier, Neighbour, classify, nearest_neighbours};
pub use split::{TrainTestSplit, stratified_split, stratified_split_seeded};
