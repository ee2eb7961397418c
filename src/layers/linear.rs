use ndarray::{Array2, Axis};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use crate::optimizers::Optimizer;

/// Holds gradients for linear layer parameters during backpropagation
#[derive(Clone, Debug)]
pub struct LinearGradients {
    pub weight: Array2<f64>,
    pub bias: Array2<f64>,
}

impl LinearGradients {
    pub fn matrices_mut(&mut self) -> [&mut Array2<f64>; 2] {
        [&mut self.weight, &mut self.bias]
    }
}

/// Fully connected layer mapping the recurrent state to the forecast
///
/// Performs `output = weight · input + bias` on `(input_size, batch)` columns,
/// where weight has shape (output_size, input_size) and bias has shape (output_size, 1).
#[derive(Clone, Debug)]
pub struct LinearLayer {
    pub weight: Array2<f64>,
    pub bias: Array2<f64>,
    pub input_size: usize,
    pub output_size: usize,
}

impl LinearLayer {
    /// Create a new linear layer with Xavier/Glorot uniform initialization
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (input_size + output_size) as f64).sqrt();
        let weight = Array2::random_using((output_size, input_size), Uniform::new(-limit, limit), rng);
        let bias = Array2::zeros((output_size, 1));

        Self {
            weight,
            bias,
            input_size,
            output_size,
        }
    }

    /// Create a new linear layer with zero initialization
    pub fn new_zeros(input_size: usize, output_size: usize) -> Self {
        Self {
            weight: Array2::zeros((output_size, input_size)),
            bias: Array2::zeros((output_size, 1)),
            input_size,
            output_size,
        }
    }

    /// Builds a layer from existing parameters; `None` when the bias is not `(output_size, 1)`
    pub fn from_weights(weight: Array2<f64>, bias: Array2<f64>) -> Option<Self> {
        let (output_size, input_size) = weight.dim();
        if bias.shape() != &[output_size, 1] {
            return None;
        }

        Some(Self {
            weight,
            bias,
            input_size,
            output_size,
        })
    }

    /// Forward pass: `(input_size, batch)` to `(output_size, batch)`
    pub fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        &self.weight.dot(input) + &self.bias
    }

    /// Backward pass given the input seen by `forward`
    ///
    /// Returns the parameter gradients and the gradient w.r.t. the input.
    pub fn backward(&self, input: &Array2<f64>, grad_output: &Array2<f64>) -> (LinearGradients, Array2<f64>) {
        let gradients = LinearGradients {
            weight: grad_output.dot(&input.t()),
            bias: grad_output.sum_axis(Axis(1)).insert_axis(Axis(1)),
        };
        let input_grad = self.weight.t().dot(grad_output);

        (gradients, input_grad)
    }

    /// Update parameters using the provided optimizer
    pub fn update_parameters<O: Optimizer + ?Sized>(&mut self, gradients: &LinearGradients, optimizer: &mut O, prefix: &str) {
        optimizer.update(&format!("{}_weight", prefix), &mut self.weight, &gradients.weight);
        optimizer.update(&format!("{}_bias", prefix), &mut self.bias, &gradients.bias);
    }

    /// Get the number of parameters in this layer
    pub fn num_parameters(&self) -> usize {
        self.weight.len() + self.bias.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::SGD;
    use crate::utils::make_rng;
    use ndarray::arr2;

    #[test]
    fn test_linear_layer_creation() {
        let layer = LinearLayer::new(10, 1, &mut make_rng(Some(0)));
        assert_eq!(layer.weight.shape(), &[1, 10]);
        assert_eq!(layer.bias.shape(), &[1, 1]);
        assert_eq!(layer.num_parameters(), 11);
    }

    #[test]
    fn test_linear_layer_forward() {
        let layer = LinearLayer::from_weights(arr2(&[[1.0, 2.0, 3.0]]), arr2(&[[0.5]])).unwrap();
        let input = arr2(&[[1.0, 0.0], [1.0, 1.0], [1.0, 2.0]]);

        let output = layer.forward(&input);
        assert_eq!(output, arr2(&[[6.5, 8.5]]));

        let zeros = LinearLayer::new_zeros(3, 1);
        assert!(zeros.forward(&input).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_linear_layer_backward() {
        let layer = LinearLayer::new(3, 2, &mut make_rng(Some(1)));
        let input = arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let grad_output = arr2(&[[1.0, 1.0], [1.0, 1.0]]);

        let (gradients, input_grad) = layer.backward(&input, &grad_output);

        assert_eq!(gradients.weight.shape(), &[2, 3]);
        assert_eq!(gradients.bias, arr2(&[[2.0], [2.0]]));
        assert_eq!(input_grad.shape(), &[3, 2]);
    }

    #[test]
    fn test_linear_layer_with_optimizer() {
        let mut layer = LinearLayer::new_zeros(2, 1);
        let mut optimizer = SGD::new(0.1);

        let input = arr2(&[[1.0], [2.0]]);
        let target = arr2(&[[3.0]]);

        let output = layer.forward(&input);
        let grad_output = &output - &target;
        let (gradients, _) = layer.backward(&input, &grad_output);
        layer.update_parameters(&gradients, &mut optimizer, "head");

        let expected_weight = arr2(&[[0.3, 0.6]]);
        assert!((&layer.weight - &expected_weight).mapv(f64::abs).sum() < 1e-12);
        assert!((layer.bias[[0, 0]] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_from_weights_rejects_bad_bias() {
        assert!(LinearLayer::from_weights(arr2(&[[1.0, 2.0]]), arr2(&[[0.0], [0.0]])).is_none());
    }
}
