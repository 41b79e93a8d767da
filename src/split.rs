//! Stratified train/test partitioning.
//!
//! Each class is cut independently so that the testing subset keeps the class
//! proportions of the full dataset even when classes are imbalanced.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::common_types::{Dataset, Record};
use crate::error::{KnnError, Result};

/// Result of a stratified split. Every input record lands in exactly one side.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit<F> {
    pub training: Vec<Record<F>>,
    pub testing: Vec<Record<F>>,
}

/// Splits `dataset` so that `floor(count * testing_fraction)` records of every class
/// go to `testing` and the rest to `training`.
///
/// Within a class the first records (in dataset order) are the ones held out.
/// Classes are emitted in order of first appearance.
pub fn stratified_split<F: Clone>(
    dataset: &Dataset<F>,
    testing_fraction: f64,
) -> Result<TrainTestSplit<F>> {
    split_by_class(dataset, testing_fraction, None)
}

/// Like [`stratified_split`], but shuffles each class with a seeded RNG before cutting it.
///
/// The same seed over the same dataset always yields the same split.
pub fn stratified_split_seeded<F: Clone>(
    dataset: &Dataset<F>,
    testing_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit<F>> {
    let mut rng = StdRng::seed_from_u64(seed);
    split_by_class(dataset, testing_fraction, Some(&mut rng))
}

pub(crate) fn check_testing_fraction(testing_fraction: f64) -> Result<()> {
    if !testing_fraction.is_finite() || testing_fraction <= 0.0 || testing_fraction >= 1.0 {
        return Err(KnnError::InvalidInput(format!(
            "testing fraction must be in (0, 1), got {}",
            testing_fraction
        )));
    }
    Ok(())
}

/// Number of a class's `count` instances that are held out for testing.
fn testing_count(count: usize, testing_fraction: f64) -> usize {
    (count as f64 * testing_fraction).floor() as usize
}

fn split_by_class<F: Clone>(
    dataset: &Dataset<F>,
    testing_fraction: f64,
    mut rng: Option<&mut StdRng>,
) -> Result<TrainTestSplit<F>> {
    check_testing_fraction(testing_fraction)?;
    if dataset.is_empty() {
        return Err(KnnError::InvalidInput(
            "cannot stratify an empty dataset".to_string(),
        ));
    }

    let mut training = Vec::new();
    let mut testing = Vec::new();

    for class in dataset.classes() {
        let mut instances: Vec<&Record<F>> = dataset
            .records()
            .iter()
            .filter(|r| r.label == class)
            .collect();
        if let Some(rng) = rng.as_deref_mut() {
            instances.shuffle(rng);
        }

        let held_out = testing_count(instances.len(), testing_fraction);
        tracing::debug!(
            class,
            instances = instances.len(),
            testing = held_out,
            "stratifying class"
        );

        let (test_part, train_part) = instances.split_at(held_out);
        testing.extend(test_part.iter().map(|&r| r.clone()));
        training.extend(train_part.iter().map(|&r| r.clone()));
    }

    tracing::debug!(
        training = training.len(),
        testing = testing.len(),
        "dataset split"
    );
    Ok(TrainTestSplit { training, testing })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(counts: &[(&str, usize)]) -> Dataset<f64> {
        let mut records = Vec::new();
        let mut value = 0.0;
        for &(label, count) in counts {
            for _ in 0..count {
                records.push(Record::new(vec![value], label));
                value += 1.0;
            }
        }
        Dataset::new(records).unwrap()
    }

    #[test]
    fn test_ten_instances_at_eighty_percent() {
        let dataset = labeled(&[("A", 10)]);
        let split = stratified_split(&dataset, 0.8).unwrap();
        assert_eq!(split.testing.len(), 8);
        assert_eq!(split.training.len(), 2);
        // The first eight in dataset order are held out.
        assert_eq!(split.testing[0].features, vec![0.0]);
        assert_eq!(split.training[0].features, vec![8.0]);
    }

    #[test]
    fn test_split_is_per_class() {
        // Interleave classes to make sure grouping follows first appearance.
        let dataset = Dataset::new(vec![
            Record::new(vec![0.0], "B"),
            Record::new(vec![1.0], "A"),
            Record::new(vec![2.0], "B"),
            Record::new(vec![3.0], "A"),
            Record::new(vec![4.0], "B"),
            Record::new(vec![5.0], "B"),
        ])
        .unwrap();
        let split = stratified_split(&dataset, 0.5).unwrap();

        let testing: Vec<f64> = split.testing.iter().map(|r| r.features[0]).collect();
        let training: Vec<f64> = split.training.iter().map(|r| r.features[0]).collect();
        assert_eq!(testing, vec![0.0, 2.0, 1.0]);
        assert_eq!(training, vec![4.0, 5.0, 3.0]);
    }

    #[test]
    fn test_small_class_goes_entirely_to_training() {
        let dataset = labeled(&[("common", 10), ("rare", 1)]);
        let split = stratified_split(&dataset, 0.8).unwrap();
        assert!(split.testing.iter().all(|r| r.label == "common"));
        assert_eq!(split.training.iter().filter(|r| r.label == "rare").count(), 1);
        assert_eq!(split.training.len() + split.testing.len(), 11);
    }

    #[test]
    fn test_empty_dataset_is_invalid_input() {
        let dataset: Dataset<f64> = Dataset::new(Vec::new()).unwrap();
        assert!(matches!(
            stratified_split(&dataset, 0.8),
            Err(KnnError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_fraction_out_of_range_is_rejected() {
        let dataset = labeled(&[("A", 4)]);
        for fraction in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(
                matches!(stratified_split(&dataset, fraction), Err(KnnError::InvalidInput(_))),
                "fraction {} should be rejected",
                fraction
            );
        }
    }

    #[test]
    fn test_seeded_split_is_reproducible_and_stratified() {
        let dataset = labeled(&[("A", 20), ("B", 5)]);
        let first = stratified_split_seeded(&dataset, 0.5, 42).unwrap();
        let second = stratified_split_seeded(&dataset, 0.5, 42).unwrap();
        assert_eq!(first, second);

        assert_eq!(first.testing.iter().filter(|r| r.label == "A").count(), 10);
        assert_eq!(first.testing.iter().filter(|r| r.label == "B").count(), 2);

        let mut seen: Vec<f64> = first
            .training
            .iter()
            .chain(first.testing.iter())
            .map(|r| r.features[0])
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f64> = (0..25).map(|v| v as f64).collect();
        assert_eq!(seen, expected);
    }
}
