//! Majority vote over a neighbour list.

use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

use ordered_float::OrderedFloat;

use super::Neighbour;

/// Per-label statistics gathered during one vote.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LabelTally {
    pub count: usize,
    pub distance_sum: f64,
}

/// Label -> occurrence count (and cumulative distance), scoped to a single vote.
#[derive(Debug, Default)]
pub struct ClassTally<'a> {
    counts: HashMap<&'a str, LabelTally>,
}

impl<'a> ClassTally<'a> {
    pub fn from_neighbours(neighbours: &[Neighbour<'a>]) -> Self {
        let mut counts: HashMap<&'a str, LabelTally> = HashMap::new();
        for neighbour in neighbours {
            let entry = counts.entry(neighbour.label).or_default();
            entry.count += 1;
            entry.distance_sum += neighbour.distance;
        }
        ClassTally { counts }
    }

    pub fn get(&self, label: &str) -> Option<LabelTally> {
        self.counts.get(label).copied()
    }

    /// The label with the highest count.
    ///
    /// Equal counts go to the lower cumulative distance, then to the
    /// lexicographically smaller label, so the winner never depends on map order.
    pub fn winner(&self) -> Option<&'a str> {
        self.counts
            .iter()
            .max_by(|(label_a, a), (label_b, b)| compare(label_a, a, label_b, b))
            .map(|(&label, _)| label)
    }
}

fn compare(label_a: &str, a: &LabelTally, label_b: &str, b: &LabelTally) -> Ordering {
    let rank = |label, tally: &LabelTally| {
        (
            tally.count,
            Reverse(OrderedFloat(tally.distance_sum)),
            Reverse(label),
        )
    };
    rank(label_a, a).cmp(&rank(label_b, b))
}

/// Returns the majority label among `neighbours`, or `None` when the list is empty.
pub fn majority_vote<'a>(neighbours: &[Neighbour<'a>]) -> Option<&'a str> {
    ClassTally::from_neighbours(neighbours).winner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(distance: f64, label: &str) -> Neighbour<'_> {
        Neighbour { distance, label }
    }

    #[test]
    fn test_majority_wins() {
        let neighbours = [n(0.1, "B"), n(0.2, "A"), n(0.3, "A")];
        assert_eq!(majority_vote(&neighbours), Some("A"));
    }

    #[test]
    fn test_count_tie_goes_to_closer_class() {
        // Both have two votes; "B" is closer overall.
        let neighbours = [n(0.5, "A"), n(0.1, "B"), n(0.2, "B"), n(0.6, "A")];
        assert_eq!(majority_vote(&neighbours), Some("B"));
    }

    #[test]
    fn test_full_tie_goes_to_smaller_label() {
        let neighbours = [n(1.0, "zeta"), n(1.0, "alpha")];
        assert_eq!(majority_vote(&neighbours), Some("alpha"));
    }

    #[test]
    fn test_tally_counts_and_sums() {
        let neighbours = [n(1.0, "A"), n(2.5, "A"), n(4.0, "B")];
        let tally = ClassTally::from_neighbours(&neighbours);
        assert_eq!(tally.get("A"), Some(LabelTally { count: 2, distance_sum: 3.5 }));
        assert_eq!(tally.get("B"), Some(LabelTally { count: 1, distance_sum: 4.0 }));
        assert_eq!(tally.get("C"), None);
    }

    #[test]
    fn test_empty_neighbour_list() {
        assert_eq!(majority_vote(&[]), None);
    }
}
