//! End-to-end run: sample `sin`, window, split, train, then score every subset.

use ndarray::Axis;
use serde::Serialize;
use tracing::info;

use crate::config::ForecastConfig;
use crate::data::{generate_data, linspace, ForecastDataset, Subset};
use crate::error::Result;
use crate::loss::MSELoss;
use crate::models::regressor::LSTMRegressor;
use crate::optimizers::Optimizer;
use crate::training::{create_trainer, ForecastTrainer, TrainingMetrics};

/// Error and predictions for one subset
#[derive(Debug, Clone, Serialize)]
pub struct SubsetReport {
    pub subset: Subset,
    pub rows: usize,
    pub error: f64,
    pub predictions: Vec<f32>,
    pub labels: Vec<f32>,
}

/// Everything a run produced, ready to dump as JSON
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub config: ForecastConfig,
    pub loss_summary: Vec<f64>,
    pub metrics: Vec<TrainingMetrics>,
    pub subsets: Vec<SubsetReport>,
}

impl ExperimentReport {
    pub fn subset(&self, subset: Subset) -> Option<&SubsetReport> {
        self.subsets.iter().find(|report| report.subset == subset)
    }
}

pub struct Experiment {
    config: ForecastConfig,
}

impl Experiment {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Experiment { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Windows of `sin` over the configured domain, split three ways
    pub fn dataset(&self) -> Result<ForecastDataset> {
        let data = &self.config.data;
        let domain = linspace(data.start, data.end, data.num_points);
        generate_data(f64::sin, &domain, data.time_steps, data.time_shift, data.val_size, data.test_size)
    }

    pub fn build_trainer(&self) -> Result<ForecastTrainer<MSELoss, Box<dyn Optimizer>>> {
        let model = LSTMRegressor::new(
            1,
            self.config.model.hidden_size,
            self.config.model.num_layers,
            self.config.model.dropout,
            self.config.model.seed,
        )?;
        Ok(create_trainer(model, self.config.training.clone()))
    }

    /// Trains `trainer` on a fresh dataset and reports every subset
    pub fn run_with<O: Optimizer>(&self, trainer: &mut ForecastTrainer<MSELoss, O>) -> Result<ExperimentReport> {
        let dataset = self.dataset()?;
        let loss_summary = trainer.fit(&dataset)?;

        let mut subsets = Vec::with_capacity(Subset::ALL.len());
        for subset in Subset::ALL {
            let error = trainer.evaluate(&dataset, subset)?;
            let windows = dataset.windows.get(subset);
            let predictions = trainer.predict(windows.view());
            let labels = dataset.labels.get(subset);

            info!(subset = %subset, rows = labels.len_of(Axis(0)), mse = error, "subset evaluated");
            subsets.push(SubsetReport {
                subset,
                rows: labels.len_of(Axis(0)),
                error,
                predictions: predictions.iter().copied().collect(),
                labels: labels.iter().copied().collect(),
            });
        }

        Ok(ExperimentReport {
            config: self.config.clone(),
            loss_summary,
            metrics: trainer.get_metrics_history().to_vec(),
            subsets,
        })
    }

    pub fn run(&self) -> Result<ExperimentReport> {
        let mut trainer = self.build_trainer()?;
        self.run_with(&mut trainer)
    }
}
