use ndarray::{Array, Array1, Array2, Dimension, Zip};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

/// Adam optimizer state for a stack of (weights, bias) layers
pub struct Adam {
    learning_rate: f64,
    step: i32,
    // First and second moment estimates, shaped like the layers
    first_moments: Vec<(Array2<f64>, Array1<f64>)>,
    second_moments: Vec<(Array2<f64>, Array1<f64>)>,
}

impl Adam {
    pub fn new(learning_rate: f64, layers: &[(Array2<f64>, Array1<f64>)]) -> Adam {
        let zeros: Vec<(Array2<f64>, Array1<f64>)> = layers
            .iter()
            .map(|(weights, bias)| (Array2::zeros(weights.raw_dim()), Array1::zeros(bias.raw_dim())))
            .collect();

        Adam {
            learning_rate,
            step: 0,
            first_moments: zeros.clone(),
            second_moments: zeros,
        }
    }

    /// Apply one bias-corrected update. `grads[i]` must be shaped like `layers[i]`.
    pub fn step(&mut self, layers: &mut [(Array2<f64>, Array1<f64>)], grads: &[(Array2<f64>, Array1<f64>)]) {
        self.step += 1;
        let step_size = self.learning_rate * (1f64 - BETA2.powi(self.step)).sqrt()
            / (1f64 - BETA1.powi(self.step));

        for (idx, (weights, bias)) in layers.iter_mut().enumerate() {
            let (m_w, m_b) = &mut self.first_moments[idx];
            let (v_w, v_b) = &mut self.second_moments[idx];

            update(weights, m_w, v_w, &grads[idx].0, step_size);
            update(bias, m_b, v_b, &grads[idx].1, step_size);
        }
    }
}

fn update<D: Dimension>(
    param: &mut Array<f64, D>,
    first: &mut Array<f64, D>,
    second: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    step_size: f64,
) {
    Zip::from(param)
        .and(first)
        .and(second)
        .and(grad)
        .for_each(|p, m, v, &g| {
            *m = BETA1 * *m + (1f64 - BETA1) * g;
            *v = BETA2 * *v + (1f64 - BETA2) * g * g;
            *p -= step_size * *m / (v.sqrt() + EPSILON);
        });
}
