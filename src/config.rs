//! Experiment configuration, loaded from TOML.
//!
//! ```toml
//! dataset = "data/dataset.csv"
//! testing_fraction = 0.8
//! k = 10
//! shuffle_seed = 7
//! threads = 4
//!
//! [csv]
//! has_headers = false
//! delimiter = ","
//! on_malformed = "abort"
//! expected_features = 30
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{KnnError, Result};
use crate::ingest::CsvOptions;
use crate::split::check_testing_fraction;

pub const DEFAULT_DATASET_PATH: &str = "data/dataset.csv";
pub const DEFAULT_TESTING_FRACTION: f64 = 0.8;
pub const DEFAULT_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub dataset: PathBuf,
    /// Share of every class held out for testing, in (0, 1).
    pub testing_fraction: f64,
    pub k: usize,
    /// Shuffle each class with this seed before splitting. Unset keeps dataset order.
    pub shuffle_seed: Option<u64>,
    /// Worker threads for classification. Unset lets rayon decide.
    pub threads: Option<usize>,
    pub csv: CsvOptions,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            dataset: PathBuf::from(DEFAULT_DATASET_PATH),
            testing_fraction: DEFAULT_TESTING_FRACTION,
            k: DEFAULT_K,
            shuffle_seed: None,
            threads: None,
            csv: CsvOptions::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| KnnError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| KnnError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Rejects out-of-range values. Nothing is clamped.
    ///
    /// The upper bound on `k` depends on the training set and is checked by the classifier.
    pub fn validate(&self) -> Result<()> {
        check_testing_fraction(self.testing_fraction)?;
        if self.k == 0 {
            return Err(KnnError::Config("k must be at least 1".to_string()));
        }
        if self.threads == Some(0) {
            return Err(KnnError::Config("threads must be at least 1".to_string()));
        }
        self.csv.validate()
    }
}
