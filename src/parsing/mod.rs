use ndarray::{Array2, ArrayView1, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::encoding::{NUM_CLASSES, NUM_FEATURES};
use crate::error::TierError;

pub mod people;
pub mod reference;
pub mod table;

/// Parallel feature and label tables. Row i of `data` is labeled by row i of `target`.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub data: Array2<f64>,
    pub target: Array2<f64>,
}

impl Dataset {
    /// Build a dataset from row slices, checking every row before anything is copied
    pub fn from_rows(data: &[Vec<f64>], target: &[Vec<f64>]) -> Result<Dataset, TierError> {
        check_widths("feature", data, NUM_FEATURES)?;
        check_widths("label", target, NUM_CLASSES)?;

        let flat_data: Vec<f64> = data.iter().flatten().copied().collect();
        let flat_target: Vec<f64> = target.iter().flatten().copied().collect();

        let dataset = Dataset {
            data: Array2::from_shape_vec((data.len(), NUM_FEATURES), flat_data)?,
            target: Array2::from_shape_vec((target.len(), NUM_CLASSES), flat_target)?,
        };
        dataset.validate()?;

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Check the table shapes and the one-hot segments of every row
    pub fn validate(&self) -> Result<(), TierError> {
        if self.data.ncols() != NUM_FEATURES {
            return Err(TierError::Shape {
                what: "feature",
                row: 0,
                expected: NUM_FEATURES,
                got: self.data.ncols(),
            });
        }
        if self.target.ncols() != NUM_CLASSES {
            return Err(TierError::Shape {
                what: "label",
                row: 0,
                expected: NUM_CLASSES,
                got: self.target.ncols(),
            });
        }
        if self.data.nrows() != self.target.nrows() {
            return Err(TierError::RowCountMismatch {
                data: self.data.nrows(),
                target: self.target.nrows(),
            });
        }
        if self.is_empty() {
            return Err(TierError::EmptyDataset);
        }

        for (row, features) in self.data.axis_iter(Axis(0)).enumerate() {
            if features.iter().any(|x| !x.is_finite()) {
                return Err(TierError::NonFinite { table: "feature", row });
            }
            // Age is free-form; colors live in 1..4 and locations in 4..7
            if !is_one_hot(features.slice(ndarray::s![1..4]))
                || !is_one_hot(features.slice(ndarray::s![4..7]))
            {
                return Err(TierError::NotOneHot { table: "feature", row });
            }
        }
        for (row, label) in self.target.axis_iter(Axis(0)).enumerate() {
            if !is_one_hot(label) {
                return Err(TierError::NotOneHot { table: "label", row });
            }
        }

        Ok(())
    }

    /// Copy of the dataset with rows permuted. Both tables get the same permutation.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Dataset {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);

        Dataset {
            data: self.data.select(Axis(0), &indices),
            target: self.target.select(Axis(0), &indices),
        }
    }
}

fn check_widths(what: &'static str, rows: &[Vec<f64>], expected: usize) -> Result<(), TierError> {
    match rows.iter().position(|row| row.len() != expected) {
        Some(row) => Err(TierError::Shape {
            what,
            row,
            expected,
            got: rows[row].len(),
        }),
        None => Ok(()),
    }
}

fn is_one_hot(values: ArrayView1<f64>) -> bool {
    let ones = values.iter().filter(|x| **x == 1f64).count();
    let zeros = values.iter().filter(|x| **x == 0f64).count();

    ones == 1 && ones + zeros == values.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rows() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        (
            vec![
                vec![0.33, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0],
                vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            ],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        )
    }

    #[test]
    fn builds_from_rows() {
        let (data, target) = rows();
        let dataset = Dataset::from_rows(&data, &target).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.data.row(1)[2], 1.0);
        assert_eq!(dataset.target.row(2)[2], 1.0);
    }

    #[test]
    fn rejects_short_feature_row() {
        let (mut data, target) = rows();
        data[2].pop();

        assert!(matches!(
            Dataset::from_rows(&data, &target),
            Err(TierError::Shape { what: "feature", row: 2, expected: 7, got: 6 })
        ));
    }

    #[test]
    fn rejects_long_label_row() {
        let (data, mut target) = rows();
        target[0].push(0.0);

        assert!(matches!(
            Dataset::from_rows(&data, &target),
            Err(TierError::Shape { what: "label", row: 0, expected: 3, got: 4 })
        ));
    }

    #[test]
    fn rejects_empty_and_mismatched_tables() {
        assert!(matches!(Dataset::from_rows(&[], &[]), Err(TierError::EmptyDataset)));

        let (data, mut target) = rows();
        target.pop();
        assert!(matches!(
            Dataset::from_rows(&data, &target),
            Err(TierError::RowCountMismatch { data: 3, target: 2 })
        ));
    }

    #[test]
    fn rejects_rows_that_are_not_one_hot() {
        let (mut data, target) = rows();
        data[1][3] = 1.0;
        assert!(matches!(
            Dataset::from_rows(&data, &target),
            Err(TierError::NotOneHot { table: "feature", row: 1 })
        ));

        let (data, mut target) = rows();
        target[0] = vec![0.0, 0.0, 0.0];
        assert!(matches!(
            Dataset::from_rows(&data, &target),
            Err(TierError::NotOneHot { table: "label", row: 0 })
        ));
    }

    #[test]
    fn rejects_non_finite_ages() {
        let (mut data, target) = rows();
        data[1][0] = f64::NAN;
        assert!(matches!(
            Dataset::from_rows(&data, &target),
            Err(TierError::NonFinite { table: "feature", row: 1 })
        ));

        let mut dataset = reference::dataset();
        dataset.data[[4, 0]] = f64::INFINITY;
        assert!(matches!(
            dataset.validate(),
            Err(TierError::NonFinite { table: "feature", row: 4 })
        ));
    }

    #[test]
    fn shuffle_keeps_rows_paired() {
        let dataset = reference::dataset();
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = dataset.shuffled(&mut rng);

        assert_eq!(shuffled.len(), dataset.len());
        for (features, label) in shuffled
            .data
            .axis_iter(Axis(0))
            .zip(shuffled.target.axis_iter(Axis(0)))
        {
            let original = dataset
                .data
                .axis_iter(Axis(0))
                .position(|row| row == features)
                .unwrap();
            assert_eq!(dataset.target.row(original), label);
        }
    }
}
