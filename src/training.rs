use ndarray::{Array2, ArrayView3};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::data::{Batch, ForecastDataset, Minibatches, Subset};
use crate::error::{ForecastError, Result};
use crate::loss::{LossFunction, MSELoss};
use crate::models::regressor::{LSTMRegressor, RegressorGradients};
use crate::optimizers::{Optimizer, OptimizerKind, SGD};
use crate::utils::{batch_to_sequence, labels_to_targets};

/// Configuration for training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
    pub print_every: usize,
    pub clip_gradient: Option<f64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 100,
            batch_size: 100,
            learning_rate: 0.005,
            optimizer: OptimizerKind::Adam,
            print_every: 10,
            clip_gradient: Some(5.0),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ForecastError::invalid("batch_size must be positive"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ForecastError::invalid(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if let Some(clip) = self.clip_gradient {
            if clip <= 0.0 {
                return Err(ForecastError::invalid(format!("clip_gradient must be positive, got {}", clip)));
            }
        }
        Ok(())
    }
}

/// Training metrics tracked during training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub validation_loss: Option<f64>,
    pub time_elapsed: f64,
}

/// Per-batch contract between the data pipeline and a trainable model
pub trait MinibatchHarness {
    /// One optimizer step on `batch`; returns the loss before the update
    fn train_minibatch(&mut self, batch: &Batch<'_>) -> f64;

    /// Error on `batch` without touching the parameters
    fn test_minibatch(&mut self, batch: &Batch<'_>) -> f64;

    /// `(batch, 1)` predictions for `(batch, time_steps, features)` inputs
    fn eval(&mut self, inputs: ArrayView3<'_, f32>) -> Array2<f32>;
}

/// Trainer for the LSTM forecaster with configurable loss and optimizer
pub struct ForecastTrainer<L: LossFunction, O: Optimizer> {
    pub model: LSTMRegressor,
    pub loss_function: L,
    pub optimizer: O,
    pub config: TrainingConfig,
    pub metrics_history: Vec<TrainingMetrics>,
}

impl<L: LossFunction, O: Optimizer> ForecastTrainer<L, O> {
    pub fn new(model: LSTMRegressor, loss_function: L, optimizer: O) -> Self {
        ForecastTrainer {
            model,
            loss_function,
            optimizer,
            config: TrainingConfig::default(),
            metrics_history: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs `config.epochs` passes over the train subset.
    ///
    /// Returns the mean train loss of every epoch. When the validation subset yields
    /// batches, its error is recorded alongside in `metrics_history`.
    pub fn fit(&mut self, dataset: &ForecastDataset) -> Result<Vec<f64>> {
        self.config.validate()?;
        let train_batches = dataset.batches(Subset::Train, self.config.batch_size)?;
        let val_batches = dataset.batches(Subset::Val, self.config.batch_size)?;

        if train_batches.is_empty() {
            warn!(
                rows = dataset.len(Subset::Train),
                batch_size = self.config.batch_size,
                "train subset yields no batches"
            );
        }
        info!(
            epochs = self.config.epochs,
            batches = train_batches.len(),
            loss = self.loss_function.name(),
            parameters = self.model.num_parameters(),
            "starting training"
        );

        let mut loss_summary = Vec::with_capacity(self.config.epochs);
        for epoch in 0..self.config.epochs {
            let start_time = Instant::now();

            let mut epoch_loss = 0.0;
            let mut batch_count = 0;
            for batch in train_batches.iter() {
                epoch_loss += self.train_minibatch(&batch);
                batch_count += 1;
            }
            if batch_count > 0 {
                epoch_loss /= batch_count as f64;
            }

            let validation_loss = if val_batches.is_empty() {
                None
            } else {
                Some(self.mean_error(&val_batches))
            };
            let time_elapsed = start_time.elapsed().as_secs_f64();

            self.metrics_history.push(TrainingMetrics {
                epoch,
                train_loss: epoch_loss,
                validation_loss,
                time_elapsed,
            });
            loss_summary.push(epoch_loss);

            if self.config.print_every > 0 && epoch % self.config.print_every == 0 {
                info!(epoch, train_loss = epoch_loss, validation_loss, "epoch finished");
            } else {
                debug!(epoch, train_loss = epoch_loss, validation_loss, time_elapsed, "epoch finished");
            }
        }

        info!(final_loss = loss_summary.last().copied(), "training completed");
        Ok(loss_summary)
    }

    /// Mean batch error over one subset; 0.0 when the subset yields no batches
    pub fn evaluate(&mut self, dataset: &ForecastDataset, subset: Subset) -> Result<f64> {
        let batches = dataset.batches(subset, self.config.batch_size)?;
        Ok(self.mean_error(&batches))
    }

    fn mean_error(&mut self, batches: &Minibatches<'_>) -> f64 {
        let mut total = 0.0;
        let mut count = 0;
        for batch in batches.iter() {
            total += self.test_minibatch(&batch);
            count += 1;
        }

        if count > 0 {
            total / count as f64
        } else {
            0.0
        }
    }

    /// Predictions for every window, tail included
    pub fn predict(&mut self, windows: ArrayView3<'_, f32>) -> Array2<f32> {
        self.model.predict(windows, self.config.batch_size)
    }

    /// Clip each gradient matrix to `max_norm` to prevent exploding gradients
    fn clip_gradients(gradients: &mut RegressorGradients, max_norm: f64) {
        for matrix in gradients.matrices_mut() {
            let norm = matrix.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > max_norm {
                let scale = max_norm / norm;
                matrix.mapv_inplace(|x| x * scale);
            }
        }
    }

    pub fn get_latest_metrics(&self) -> Option<&TrainingMetrics> {
        self.metrics_history.last()
    }

    pub fn get_metrics_history(&self) -> &[TrainingMetrics] {
        &self.metrics_history
    }
}

impl<L: LossFunction, O: Optimizer> MinibatchHarness for ForecastTrainer<L, O> {
    fn train_minibatch(&mut self, batch: &Batch<'_>) -> f64 {
        let sequence = batch_to_sequence(batch.inputs);
        let targets = labels_to_targets(batch.labels);

        self.model.train();
        let (predictions, cache) = self.model.forward_with_cache(&sequence);
        let loss = self.loss_function.compute_loss(&predictions, &targets);

        let d_output = self.loss_function.compute_gradient(&predictions, &targets);
        let mut gradients = self.model.backward(&d_output, &cache);
        if let Some(max_norm) = self.config.clip_gradient {
            Self::clip_gradients(&mut gradients, max_norm);
        }
        self.model.update_parameters(&gradients, &mut self.optimizer);

        loss
    }

    fn test_minibatch(&mut self, batch: &Batch<'_>) -> f64 {
        let predictions = self.eval(batch.inputs);
        let predictions = predictions.mapv(f64::from);
        let labels = batch.labels.mapv(f64::from);
        self.loss_function.compute_loss(&predictions, &labels)
    }

    fn eval(&mut self, inputs: ArrayView3<'_, f32>) -> Array2<f32> {
        let batch_size = inputs.len_of(ndarray::Axis(0));
        self.model.predict(inputs, batch_size)
    }
}

/// Trainer wired from configuration: MSE loss and the configured optimizer
pub fn create_trainer(model: LSTMRegressor, config: TrainingConfig) -> ForecastTrainer<MSELoss, Box<dyn Optimizer>> {
    let optimizer = config.optimizer.build(config.learning_rate);
    ForecastTrainer::new(model, MSELoss, optimizer).with_config(config)
}

/// Create a basic trainer with SGD optimizer and MSE loss
pub fn create_basic_trainer(model: LSTMRegressor, learning_rate: f64) -> ForecastTrainer<MSELoss, SGD> {
    let config = TrainingConfig {
        learning_rate,
        optimizer: OptimizerKind::Sgd,
        ..TrainingConfig::default()
    };
    ForecastTrainer::new(model, MSELoss, SGD::new(learning_rate)).with_config(config)
}
