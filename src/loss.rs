use ndarray::Array2;

/// Error between `(1, batch)` forecasts and targets, with its gradient
pub trait LossFunction {
    /// Short name used in training logs
    fn name(&self) -> &'static str;

    /// Mean error over every element; 0.0 for an empty batch
    fn compute_loss(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> f64;

    /// d(loss)/d(predictions), same shape as `predictions`
    fn compute_gradient(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64>;
}

fn mean_of(errors: Array2<f64>) -> f64 {
    errors.mean().unwrap_or(0.0)
}

/// Squared error, the default forecasting objective
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl LossFunction for MSELoss {
    fn name(&self) -> &'static str {
        "mse"
    }

    fn compute_loss(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        mean_of((predictions - targets).mapv(|d| d * d))
    }

    fn compute_gradient(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64> {
        let n = predictions.len().max(1) as f64;
        (predictions - targets).mapv(|d| 2.0 * d / n)
    }
}

/// Absolute error; less sensitive to occasional large misses
#[derive(Debug, Clone, Copy, Default)]
pub struct MAELoss;

impl LossFunction for MAELoss {
    fn name(&self) -> &'static str {
        "mae"
    }

    fn compute_loss(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        mean_of((predictions - targets).mapv(f64::abs))
    }

    fn compute_gradient(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64> {
        let n = predictions.len().max(1) as f64;
        // sign(0) is taken as 0
        (predictions - targets).mapv(|d| if d == 0.0 { 0.0 } else { d.signum() / n })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_mse_on_forecast_row() {
        let predictions = arr2(&[[0.5, -0.5, 1.0]]);
        let targets = arr2(&[[0.0, 0.0, 1.0]]);

        assert!((MSELoss.compute_loss(&predictions, &targets) - 0.5 / 3.0).abs() < 1e-12);

        let gradient = MSELoss.compute_gradient(&predictions, &targets);
        let expected = arr2(&[[1.0 / 3.0, -1.0 / 3.0, 0.0]]);
        assert!((gradient - expected).mapv(f64::abs).sum() < 1e-12);
    }

    #[test]
    fn test_mae_gradient_is_scaled_sign() {
        let predictions = arr2(&[[2.0, -1.0, 0.25, 0.25]]);
        let targets = arr2(&[[1.0, 1.0, 0.25, 0.0]]);

        assert!((MAELoss.compute_loss(&predictions, &targets) - 3.25 / 4.0).abs() < 1e-12);
        assert_eq!(MAELoss.compute_gradient(&predictions, &targets), arr2(&[[0.25, -0.25, 0.0, 0.25]]));
    }

    #[test]
    fn test_mse_gradient_matches_finite_difference() {
        let mut predictions = arr2(&[[0.3, -0.7]]);
        let targets = arr2(&[[0.1, 0.2]]);
        let analytic = MSELoss.compute_gradient(&predictions, &targets)[[0, 1]];

        let eps = 1e-6;
        predictions[[0, 1]] += eps;
        let plus = MSELoss.compute_loss(&predictions, &targets);
        predictions[[0, 1]] -= 2.0 * eps;
        let minus = MSELoss.compute_loss(&predictions, &targets);

        assert!((analytic - (plus - minus) / (2.0 * eps)).abs() < 1e-8);
    }

    #[test]
    fn test_empty_batch_has_zero_loss() {
        let empty = Array2::<f64>::zeros((1, 0));
        assert_eq!(MSELoss.compute_loss(&empty, &empty), 0.0);
        assert_eq!(MAELoss.compute_loss(&empty, &empty), 0.0);
        assert_eq!(MSELoss.name(), "mse");
    }
}
