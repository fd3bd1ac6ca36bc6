use ndarray::{array, Array2};

use super::Dataset;
use crate::encoding::{Tier, NUM_CLASSES};

/// Tier of each reference row, in the same order as the feature table
const TIERS: [Tier; 18] = [
    Tier::Premium,
    Tier::Medium,
    Tier::Basic,
    Tier::Premium,
    Tier::Premium,
    Tier::Premium,
    Tier::Premium,
    Tier::Premium,
    Tier::Medium,
    Tier::Medium,
    Tier::Medium,
    Tier::Medium,
    Tier::Medium,
    Tier::Basic,
    Tier::Basic,
    Tier::Basic,
    Tier::Basic,
    Tier::Basic,
];

/// The built-in labeled people, already normalized and one-hot encoded.
/// Premium people like blue and are 30-50, medium people like red and are
/// under 30, basic people like green and are over 70.
pub fn dataset() -> Dataset {
    let data = array![
        [0.33, 1., 0., 0., 1., 0., 0.],
        [0.00, 0., 1., 0., 0., 1., 0.],
        [1.00, 0., 0., 1., 0., 0., 1.],
        // premium
        [0.35, 1., 0., 0., 1., 0., 0.],
        [0.45, 1., 0., 0., 1., 0., 0.],
        [0.50, 1., 0., 0., 0., 1., 0.],
        [0.40, 1., 0., 0., 0., 0., 1.],
        [0.38, 1., 0., 0., 1., 0., 0.],
        // medium
        [0.10, 0., 1., 0., 0., 1., 0.],
        [0.20, 0., 1., 0., 0., 1., 0.],
        [0.25, 0., 1., 0., 1., 0., 0.],
        [0.15, 0., 1., 0., 0., 0., 1.],
        [0.05, 0., 1., 0., 0., 1., 0.],
        // basic
        [0.80, 0., 0., 1., 0., 0., 1.],
        [0.90, 0., 0., 1., 0., 0., 1.],
        [0.85, 0., 0., 1., 0., 1., 0.],
        [0.75, 0., 0., 1., 1., 0., 0.],
        [0.95, 0., 0., 1., 0., 0., 1.],
    ];
    let target = Array2::from_shape_fn((TIERS.len(), NUM_CLASSES), |(row, col)| {
        if TIERS[row].index() == col {
            1f64
        } else {
            0f64
        }
    });

    Dataset { data, target }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_table_is_valid() {
        let dataset = dataset();

        assert_eq!(dataset.len(), TIERS.len());
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn reference_labels_match_colors() {
        let dataset = dataset();

        // Every premium row is blue, every medium row red, every basic row green
        for (features, tier) in dataset.data.rows().into_iter().zip(TIERS.iter()) {
            assert_eq!(features[1 + tier.index()], 1.0);
        }
    }
}
