use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Optimizer trait for parameter updates during training
pub trait Optimizer {
    fn update(&mut self, param_id: &str, param: &mut Array2<f64>, gradient: &Array2<f64>);
    fn reset(&mut self);
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn update(&mut self, param_id: &str, param: &mut Array2<f64>, gradient: &Array2<f64>) {
        (**self).update(param_id, param, gradient)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Optimizer selection as it appears in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
    RmsProp,
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f64) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Sgd => Box::new(SGD::new(learning_rate)),
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate)),
            OptimizerKind::RmsProp => Box::new(RMSprop::new(learning_rate)),
        }
    }
}

/// Stochastic Gradient Descent: θ = θ - η∇θ
pub struct SGD {
    learning_rate: f64,
}

impl SGD {
    pub fn new(learning_rate: f64) -> Self {
        SGD { learning_rate }
    }
}

impl Optimizer for SGD {
    fn update(&mut self, _param_id: &str, param: &mut Array2<f64>, gradient: &Array2<f64>) {
        param.scaled_add(-self.learning_rate, gradient);
    }

    fn reset(&mut self) {}
}

/// Adam optimizer with adaptive learning rates
///
/// Implements: m_t = β₁m_{t-1} + (1-β₁)g_t
///             v_t = β₂v_{t-1} + (1-β₂)g_t²
///             θ_t = θ_{t-1} - η * m̂_t / (√v̂_t + ε)
/// where m̂_t and v̂_t are bias-corrected with a per-parameter step count
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    state: HashMap<String, AdamState>,
}

struct AdamState {
    t: i32,
    m: Array2<f64>,
    v: Array2<f64>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Adam::with_params(learning_rate, 0.9, 0.999, 1e-8)
    }

    pub fn with_params(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            state: HashMap::new(),
        }
    }
}

impl Optimizer for Adam {
    fn update(&mut self, param_id: &str, param: &mut Array2<f64>, gradient: &Array2<f64>) {
        let state = self.state.entry(param_id.to_string()).or_insert_with(|| AdamState {
            t: 0,
            m: Array2::zeros(param.raw_dim()),
            v: Array2::zeros(param.raw_dim()),
        });
        state.t += 1;

        state.m = self.beta1 * &state.m + (1.0 - self.beta1) * gradient;
        state.v = self.beta2 * &state.v + (1.0 - self.beta2) * &(gradient * gradient);

        let m_hat = &state.m / (1.0 - self.beta1.powi(state.t));
        let v_hat = &state.v / (1.0 - self.beta2.powi(state.t));

        let update = self.learning_rate * m_hat / (v_hat.mapv(f64::sqrt) + self.epsilon);
        *param -= &update;
    }

    fn reset(&mut self) {
        self.state.clear();
    }
}

/// RMSprop: v_t = αv_{t-1} + (1-α)g_t²
///          θ_t = θ_{t-1} - η * g_t / √(v_t + ε)
pub struct RMSprop {
    learning_rate: f64,
    alpha: f64,
    epsilon: f64,
    v: HashMap<String, Array2<f64>>,
}

impl RMSprop {
    pub fn new(learning_rate: f64) -> Self {
        RMSprop::with_params(learning_rate, 0.99, 1e-8)
    }

    pub fn with_params(learning_rate: f64, alpha: f64, epsilon: f64) -> Self {
        RMSprop {
            learning_rate,
            alpha,
            epsilon,
            v: HashMap::new(),
        }
    }
}

impl Optimizer for RMSprop {
    fn update(&mut self, param_id: &str, param: &mut Array2<f64>, gradient: &Array2<f64>) {
        let v_t = self
            .v
            .entry(param_id.to_string())
            .or_insert_with(|| Array2::zeros(param.raw_dim()));

        *v_t = self.alpha * &*v_t + (1.0 - self.alpha) * &(gradient * gradient);

        let update = self.learning_rate * gradient / (v_t.mapv(f64::sqrt) + self.epsilon);
        *param -= &update;
    }

    fn reset(&mut self) {
        self.v.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_sgd_steps_against_gradient() {
        let mut optimizer = SGD::new(0.5);
        let mut param = arr2(&[[0.0, 1.0]]);
        optimizer.update("w", &mut param, &arr2(&[[2.0, -4.0]]));

        assert!((param - arr2(&[[-1.0, 3.0]])).mapv(f64::abs).sum() < 1e-12);
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        let mut optimizer = Adam::new(0.001);
        let mut param = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let gradient = arr2(&[[0.1, -0.2], [0.3, 0.4]]);

        let original_param = param.clone();
        optimizer.update("test_param", &mut param, &gradient);

        // After bias correction the first step is η·sign(g)
        let step = &original_param - &param;
        for (s, g) in step.iter().zip(gradient.iter()) {
            assert!((s - 0.001 * g.signum()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_adam_tracks_parameters_separately() {
        let mut optimizer = Adam::new(0.01);
        let mut a = arr2(&[[1.0]]);
        let mut b = arr2(&[[1.0]]);
        let gradient = arr2(&[[0.5]]);

        optimizer.update("a", &mut a, &gradient);
        optimizer.update("a", &mut a, &gradient);
        optimizer.update("b", &mut b, &gradient);

        // "b" sees its own first step regardless of how often "a" was updated
        assert!((1.0 - b[[0, 0]] - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_rmsprop_first_step_and_reset() {
        let mut optimizer = RMSprop::new(0.01);
        let mut param = arr2(&[[0.0]]);
        optimizer.update("w", &mut param, &arr2(&[[2.0]]));

        // v = 0.01 * g^2, so the step is η·g / (0.1·|g|) = 10η
        assert!((param[[0, 0]] + 0.1).abs() < 1e-6);

        optimizer.reset();
        let mut fresh = arr2(&[[0.0]]);
        optimizer.update("w", &mut fresh, &arr2(&[[2.0]]));
        assert!((fresh[[0, 0]] - param[[0, 0]]).abs() < 1e-12);
    }

    #[test]
    fn test_boxed_optimizer_from_kind() {
        let mut optimizer = OptimizerKind::Sgd.build(0.5);
        let mut param = arr2(&[[1.0]]);
        optimizer.update("p", &mut param, &arr2(&[[1.0]]));
        assert!((param[[0, 0]] - 0.5).abs() < 1e-12);

        let kind: OptimizerKind = serde_json::from_str("\"rmsprop\"").unwrap();
        assert_eq!(kind, OptimizerKind::RmsProp);
        assert_eq!(OptimizerKind::default(), OptimizerKind::Adam);
    }
}
