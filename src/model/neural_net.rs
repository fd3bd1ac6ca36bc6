use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use ndarray::{Array, Array1, Array2, ArrayView2, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::adam::Adam;
use super::{EpochStats, Model, TrainConfig};
use crate::encoding::{NUM_CLASSES, NUM_FEATURES};
use crate::error::TierError;
use crate::parsing::Dataset;

/// Units per layer, input first. Hidden layers use ReLU, the output layer softmax.
pub const LAYER_STRUCTURE: [usize; 3] = [NUM_FEATURES, 80, NUM_CLASSES];

// Keeps ln() finite when a predicted probability reaches 0
const LOG_EPSILON: f64 = 1e-7;

/// Feed-forward tier classifier
pub struct NeuralNet {
    pub layers: Vec<(Array2<f64>, Array1<f64>)>, // Each layer holds a weight matrix and a bias vector
    pub num_epochs: usize,                       // Training hyperparams
    pub learning_rate: f64,
    stop_flag: Option<Arc<AtomicBool>>,
    rng: StdRng,
}

/// Intermediate values of a forward pass, kept for backprop
struct ForwardPass {
    /// Input of every layer (the first one is the network input)
    inputs: Vec<Array2<f64>>,
    /// Output of every layer before its activation
    linear: Vec<Array2<f64>>,
    /// Output of the last layer, before the softmax
    scores: Array2<f64>,
}

impl NeuralNet {
    /// Construct a freshly initialized network for the given training run
    pub fn new(config: &TrainConfig) -> NeuralNet {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let layers = init_layers_xavier(&LAYER_STRUCTURE, &mut rng);

        NeuralNet {
            layers,
            num_epochs: config.epochs,
            learning_rate: config.learning_rate,
            stop_flag: config.stop_flag.clone(),
            rng,
        }
    }

    fn forward(&self, inputs: &ArrayView2<f64>) -> ForwardPass {
        let mut layer_inputs = Vec::with_capacity(self.layers.len());
        let mut linear = Vec::with_capacity(self.layers.len());
        let mut current = inputs.to_owned();

        let mut it = self.layers.iter().peekable();

        while let Some((weights, bias)) = it.next() {
            let lin_output = current.dot(weights) + bias;
            // Hidden layers are rectified, the output layer stays linear until the softmax
            let real_output = match it.peek() {
                Some(_) => lin_output.mapv(relu),
                None => lin_output.clone(),
            };

            layer_inputs.push(std::mem::replace(&mut current, real_output));
            linear.push(lin_output);
        }

        ForwardPass {
            inputs: layer_inputs,
            linear,
            scores: current,
        }
    }

    /// Gradients of every layer, given the gradient of the loss WRT the output scores
    fn backward(&self, pass: &ForwardPass, grad: Array2<f64>) -> Vec<(Array2<f64>, Array1<f64>)> {
        let mut grads = Vec::with_capacity(self.layers.len());
        let mut grad_help = grad;

        for idx in (0..self.layers.len()).rev() {
            if idx != self.layers.len() - 1 {
                let step_mat = pass.linear[idx].mapv(delta_relu);
                grad_help = grad_help * step_mat;
            }

            let weight_grad = pass.inputs[idx].t().dot(&grad_help);
            let bias_grad = grad_help.sum_axis(Axis(0));

            grad_help = grad_help.dot(&self.layers[idx].0.t());
            grads.push((weight_grad, bias_grad));
        }

        grads.reverse();
        grads
    }

    fn cancelled(&self) -> bool {
        self.stop_flag
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

impl Model for NeuralNet {
    /// Full-batch Adam for `num_epochs` epochs, shuffling the rows every epoch
    fn fit<F>(&mut self, dataset: &Dataset, mut on_epoch: F) -> Result<Vec<(usize, f64)>, TierError>
    where
        F: FnMut(&EpochStats),
    {
        dataset.validate()?;

        let mut optimizer = Adam::new(self.learning_rate, &self.layers);
        let mut losses = Vec::with_capacity(self.num_epochs);

        info!(
            "Training {:?} network on {} rows for {} epochs",
            LAYER_STRUCTURE,
            dataset.len(),
            self.num_epochs
        );

        for epoch in 0..self.num_epochs {
            if self.cancelled() {
                warn!("Training cancelled before epoch {}", epoch);
                return Err(TierError::Cancelled { epoch });
            }

            let batch = dataset.shuffled(&mut self.rng);
            let pass = self.forward(&batch.data.view());
            let predictions = softmax_rows(&pass.scores);

            let loss = cross_entropy(&predictions, &batch.target.view());
            if !loss.is_finite() {
                return Err(TierError::Numerical(format!(
                    "loss became {} at epoch {}",
                    loss, epoch
                )));
            }
            let accuracy = accuracy(&predictions, &batch.target.view());

            // Softmax followed by cross-entropy differentiates to (p - y), averaged over the batch
            let grad = (predictions - &batch.target) / batch.len() as f64;
            let grads = self.backward(&pass, grad);
            optimizer.step(&mut self.layers, &grads);

            let stats = EpochStats {
                epoch,
                loss,
                accuracy,
            };
            debug!("Epoch {}: loss = {}, accuracy = {:.3}", epoch, loss, accuracy);
            on_epoch(&stats);
            losses.push((epoch, loss));
        }

        info!(
            "Training finished, final loss = {}",
            losses.last().map(|(_, loss)| *loss).unwrap_or(f64::NAN)
        );

        Ok(losses)
    }

    /// Predict the probabities for a set of instances - each instance is a row in "inputs"
    fn predict(&self, inputs: &ArrayView2<f64>) -> Result<Array2<f64>, TierError> {
        if inputs.ncols() != NUM_FEATURES {
            return Err(TierError::Shape {
                what: "feature",
                row: 0,
                expected: NUM_FEATURES,
                got: inputs.ncols(),
            });
        }

        // ReLU would turn a NaN input into 0 and hide it
        if let Some(row) = inputs
            .axis_iter(Axis(0))
            .position(|features| features.iter().any(|x| !x.is_finite()))
        {
            return Err(TierError::NonFinite { table: "feature", row });
        }

        let pass = self.forward(inputs);
        let predictions = softmax_rows(&pass.scores);

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(TierError::Numerical(
                "prediction produced a non-finite probability".to_string(),
            ));
        }

        Ok(predictions)
    }
}

fn relu(z: f64) -> f64 {
    z.max(0f64)
}

fn delta_relu(z: f64) -> f64 {
    if z > 0f64 {
        1f64
    } else {
        0f64
    }
}

/// Glorot uniform weights and zero biases
fn init_layers_xavier<R: Rng>(layer_structure: &[usize], rng: &mut R) -> Vec<(Array2<f64>, Array1<f64>)> {
    let mut layers = vec![];

    for i in 0..layer_structure.len() - 1 {
        let boundary = (6f64 / (layer_structure[i] + layer_structure[i + 1]) as f64).sqrt();
        let dist = Uniform::new(-boundary, boundary);

        let weights = Array::zeros((layer_structure[i], layer_structure[i + 1]))
            .map(|_: &f64| dist.sample(&mut *rng));
        let bias = Array::zeros(layer_structure[i + 1]);

        layers.push((weights, bias));
    }

    layers
}

/// Softmax of every row - Convert scores into probability distributions
fn softmax_rows(scores: &Array2<f64>) -> Array2<f64> {
    let mut predictions = scores.to_owned();

    for mut row in predictions.axis_iter_mut(Axis(0)) {
        // Shift by the max so exp() cannot overflow
        let max = row.fold(f64::NEG_INFINITY, |acc, x| acc.max(*x));
        row.mapv_inplace(|x| (x - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|x| x / sum);
    }

    predictions
}

/// Mean categorical cross-entropy over the rows of a batch
fn cross_entropy(predictions: &Array2<f64>, target: &ArrayView2<f64>) -> f64 {
    let total: f64 = predictions
        .axis_iter(Axis(0))
        .zip(target.axis_iter(Axis(0)))
        .map(|(actual_row, target_row)| {
            target_row.dot(&actual_row.mapv(|x| x.clamp(LOG_EPSILON, 1f64 - LOG_EPSILON).ln()))
        })
        .sum();

    -total / predictions.nrows() as f64
}

/// Fraction of rows whose most probable class is the labeled one
fn accuracy(predictions: &Array2<f64>, target: &ArrayView2<f64>) -> f64 {
    let correct = predictions
        .axis_iter(Axis(0))
        .zip(target.axis_iter(Axis(0)))
        .filter(|(actual_row, target_row)| argmax(actual_row.iter()) == argmax(target_row.iter()))
        .count();

    correct as f64 / predictions.nrows() as f64
}

/// Index of the largest value, the first one on ties
fn argmax<'a>(values: impl Iterator<Item = &'a f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);

    for (idx, value) in values.enumerate() {
        if *value > best.1 {
            best = (idx, *value);
        }
    }

    best.0
}
