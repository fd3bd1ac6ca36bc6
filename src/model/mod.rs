use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use ndarray::{Array2, ArrayView2};

use crate::error::TierError;
use crate::parsing::Dataset;

pub mod adam;
pub mod neural_net;
pub mod prediction;

pub use neural_net::NeuralNet;
pub use prediction::{predict, Prediction, PredictionResult};

pub const DEFAULT_EPOCHS: usize = 200;
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

pub trait Model {
    /// Fit the model to the dataset, reporting every finished epoch to `on_epoch`.
    /// Returns the loss history as (epoch, loss) pairs.
    fn fit<F>(&mut self, dataset: &Dataset, on_epoch: F) -> Result<Vec<(usize, f64)>, TierError>
    where
        F: FnMut(&EpochStats);

    /// Class probabilities for each row of `inputs`
    fn predict(&self, inputs: &ArrayView2<f64>) -> Result<Array2<f64>, TierError>;
}

/// Hyperparameters of a training run
#[derive(Clone, Debug)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Seeds weight initialization and shuffling. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Checked between epochs; once set, training stops with `TierError::Cancelled`
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: DEFAULT_EPOCHS,
            learning_rate: DEFAULT_LEARNING_RATE,
            seed: None,
            stop_flag: None,
        }
    }
}

/// Progress event emitted once per finished epoch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochStats {
    /// 0-based epoch index
    pub epoch: usize,
    /// Mean cross-entropy of the epoch's batch, measured before the update
    pub loss: f64,
    /// Fraction of rows whose top class matched the label
    pub accuracy: f64,
}

/// Build the tier network and fit it to `dataset`
pub fn train<F>(dataset: &Dataset, config: &TrainConfig, on_epoch: F) -> Result<NeuralNet, TierError>
where
    F: FnMut(&EpochStats),
{
    let mut neural_net = NeuralNet::new(config);
    neural_net.fit(dataset, on_epoch)?;

    Ok(neural_net)
}
