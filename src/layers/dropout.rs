use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand_distr::Uniform;

use crate::error::{ForecastError, Result};
use crate::utils::make_rng;

/// Inverted dropout applied to the recurrent output before the dense head
///
/// In training mode each element is zeroed with probability `dropout_rate` and the
/// survivors are scaled by `1 / (1 - dropout_rate)`. Evaluation mode is the identity.
#[derive(Clone, Debug)]
pub struct Dropout {
    pub dropout_rate: f64,
    pub is_training: bool,
    mask: Option<Array2<f64>>,
    rng: StdRng,
}

impl Dropout {
    pub fn new(dropout_rate: f64, seed: Option<u64>) -> Result<Self> {
        if !(0.0..1.0).contains(&dropout_rate) {
            return Err(ForecastError::invalid(format!(
                "dropout rate must lie in [0, 1), got {}",
                dropout_rate
            )));
        }

        Ok(Dropout {
            dropout_rate,
            is_training: true,
            mask: None,
            rng: make_rng(seed),
        })
    }

    pub fn train(&mut self) {
        self.is_training = true;
    }

    pub fn eval(&mut self) {
        self.is_training = false;
        self.mask = None;
    }

    fn is_active(&self) -> bool {
        self.is_training && self.dropout_rate > 0.0
    }

    pub fn forward(&mut self, input: &Array2<f64>) -> Array2<f64> {
        if !self.is_active() {
            self.mask = None;
            return input.clone();
        }

        let keep_prob = 1.0 - self.dropout_rate;
        let mask = Array2::random_using(input.raw_dim(), Uniform::new(0.0, 1.0), &mut self.rng)
            .mapv(|x: f64| if x < keep_prob { 1.0 } else { 0.0 });

        let output = input * &mask / keep_prob;
        self.mask = Some(mask);
        output
    }

    pub fn get_last_mask(&self) -> Option<&Array2<f64>> {
        self.mask.as_ref()
    }

    /// Routes gradients through the mask saved by the last `forward`
    pub fn backward(&self, grad_output: &Array2<f64>) -> Array2<f64> {
        match self.mask {
            Some(ref mask) => grad_output * mask / (1.0 - self.dropout_rate),
            None => grad_output.clone(),
        }
    }
}
