//! Seeded train / held-out split.

use crate::error::TrainingError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices of each side of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub held_out: Vec<usize>,
}

/// Shuffle `0..rows` with `seed` and hold out `ceil(rows * test_size)` rows.
///
/// Both sides must end up non-empty.
pub fn train_test_split(rows: usize, test_size: f64, seed: u64) -> Result<Split, TrainingError> {
    let held_out_len = (rows as f64 * test_size).ceil() as usize;
    if held_out_len == 0 || held_out_len >= rows {
        return Err(TrainingError::DegenerateSplit { rows, test_size });
    }

    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = order.split_off(held_out_len);

    Ok(Split {
        train,
        held_out: order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sizes_and_disjoint() {
        let split = train_test_split(10, 0.3, 42).unwrap();
        assert_eq!(split.held_out.len(), 3);
        assert_eq!(split.train.len(), 7);

        let all: HashSet<usize> = split.train.iter().chain(&split.held_out).copied().collect();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_seed_is_reproducible() {
        assert_eq!(
            train_test_split(50, 0.2, 1).unwrap(),
            train_test_split(50, 0.2, 1).unwrap()
        );
    }

    #[test]
    fn test_degenerate_splits_rejected() {
        assert!(train_test_split(0, 0.3, 1).is_err());
        assert!(train_test_split(1, 0.3, 1).is_err());
        assert!(train_test_split(5, 0.0, 1).is_err());
    }
}
