//! This module contains the labeled record and dataset types shared by the splitter,
//! the classifier and the evaluation driver.

use crate::error::{KnnError, Result};

/// A single labeled sample: a feature vector plus its class label.
///
/// - `F`: The feature type (`f64` or `f32`). Both operands of a distance always
///   share it, so precisions cannot be mixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<F> {
    pub features: Vec<F>,
    pub label: String,
}

impl<F> Record<F> {
    pub fn new(features: Vec<F>, label: impl Into<String>) -> Self {
        Record { features, label: label.into() }
    }

    pub fn dimensions(&self) -> usize {
        self.features.len()
    }
}

/// An ordered collection of records with a common feature count.
///
/// Record order is kept as given; the splitter relies on it for reproducible
/// per-class ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<F> {
    records: Vec<Record<F>>,
    dimensions: usize,
}

impl<F> Dataset<F> {
    /// Builds a dataset, rejecting records whose feature count differs from the first one.
    pub fn new(records: Vec<Record<F>>) -> Result<Self> {
        let dimensions = records.first().map_or(0, |r| r.dimensions());
        if let Some((index, bad)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.dimensions() != dimensions)
        {
            return Err(KnnError::InvalidInput(format!(
                "record {} has {} features, expected {}",
                index,
                bad.dimensions(),
                dimensions
            )));
        }
        Ok(Dataset { records, dimensions })
    }

    pub fn records(&self) -> &[Record<F>] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record<F>> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature count shared by every record (0 for an empty dataset).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Distinct labels in order of first appearance.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = Vec::new();
        for record in &self.records {
            if !classes.contains(&record.label.as_str()) {
                classes.push(&record.label);
            }
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_rejects_inconsistent_dimensions() {
        let records = vec![
            Record::new(vec![1.0, 2.0], "A"),
            Record::new(vec![1.0], "B"),
        ];
        match Dataset::new(records) {
            Err(KnnError::InvalidInput(msg)) => assert!(msg.contains("record 1"), "got {}", msg),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_classes_in_first_appearance_order() {
        let dataset = Dataset::new(vec![
            Record::new(vec![0.0], "benign"),
            Record::new(vec![1.0], "malignant"),
            Record::new(vec![2.0], "benign"),
            Record::new(vec![3.0], "unknown"),
        ])
        .unwrap();
        assert_eq!(dataset.classes(), vec!["benign", "malignant", "unknown"]);
        assert_eq!(dataset.dimensions(), 1);
        assert_eq!(dataset.len(), 4);
    }

    #[test]
    fn test_empty_dataset_is_constructible() {
        let dataset: Dataset<f64> = Dataset::new(Vec::new()).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.dimensions(), 0);
        assert!(dataset.classes().is_empty());
    }
}
