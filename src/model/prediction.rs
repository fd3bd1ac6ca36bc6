use ndarray::{ArrayView1, Axis};

use super::Model;
use crate::encoding::{FeatureVector, Tier, NUM_CLASSES, NUM_FEATURES};
use crate::error::TierError;

/// Probability assigned to one tier
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub tier: Tier,
    pub probability: f64,
}

impl Prediction {
    pub fn label(&self) -> &'static str {
        self.tier.name()
    }

    pub fn percentage(&self) -> f64 {
        self.probability * 100f64
    }
}

/// One entry per tier, in `Tier::ALL` order
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionResult {
    entries: [Prediction; NUM_CLASSES],
}

impl PredictionResult {
    pub fn from_probabilities(probabilities: ArrayView1<f64>) -> Result<PredictionResult, TierError> {
        if probabilities.len() != NUM_CLASSES {
            return Err(TierError::Shape {
                what: "prediction",
                row: 0,
                expected: NUM_CLASSES,
                got: probabilities.len(),
            });
        }

        let entries = std::array::from_fn(|idx| Prediction {
            tier: Tier::ALL[idx],
            probability: probabilities[idx],
        });

        Ok(PredictionResult { entries })
    }

    pub fn entries(&self) -> &[Prediction] {
        &self.entries
    }

    pub fn probability_of(&self, tier: Tier) -> f64 {
        self.entries[tier.index()].probability
    }

    /// The most probable tier. Ties go to the tier listed first in `Tier::ALL`.
    pub fn rank(&self) -> &Prediction {
        let mut best = &self.entries[0];

        for entry in &self.entries[1..] {
            if entry.probability > best.probability {
                best = entry;
            }
        }

        best
    }

    /// All entries from most to least probable, ties kept in label order
    pub fn ranked(&self) -> Vec<Prediction> {
        let mut ranked = self.entries.to_vec();
        // sort_by is stable
        ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        ranked
    }
}

/// Score one encoded person
pub fn predict<M: Model>(model: &M, input: &FeatureVector) -> Result<PredictionResult, TierError> {
    if input.len() != NUM_FEATURES {
        return Err(TierError::Shape {
            what: "feature",
            row: 0,
            expected: NUM_FEATURES,
            got: input.len(),
        });
    }

    let probabilities = model.predict(&input.view().insert_axis(Axis(0)))?;

    PredictionResult::from_probabilities(probabilities.row(0))
}
