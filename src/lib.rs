//! # LSTM time-series forecasting
//!
//! Windowed datasets cut from a sampled series and an LSTM regressor trained to
//! predict the value `time_shift` steps ahead of each window.
//!
//! ## Core Components
//!
//! - **Data**: sliding windows with shifted labels, sequential train/val/test splits
//!   and a restartable minibatch iterator
//! - **Model**: stacked LSTM, dropout and a dense head, trained with full BPTT
//! - **Training**: the [`training::MinibatchHarness`] contract and [`ForecastTrainer`]
//! - **Optimizers**: SGD, Adam and RMSprop, selectable from configuration
//! - **Persistence**: JSON or bincode snapshots with training metadata
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lstm_timeseries::{Experiment, ForecastConfig, Subset};
//!
//! let mut config = ForecastConfig::default();
//! config.training.epochs = 10;
//!
//! let report = Experiment::new(config)?.run()?;
//! println!("test mse {:?}", report.subset(Subset::Test).map(|s| s.error));
//! # Ok::<(), lstm_timeseries::ForecastError>(())
//! ```

pub mod utils;
pub mod error;
pub mod data;
pub mod layers;
pub mod models;
pub mod loss;
pub mod optimizers;
pub mod training;
pub mod persistence;
pub mod config;
pub mod experiment;

// Re-export commonly used items
pub use config::{DataConfig, ForecastConfig, ModelConfig};
pub use data::{generate_data, next_batch, split_data, Batch, ForecastDataset, Minibatches, Subset};
pub use error::{ForecastError, Result};
pub use experiment::{Experiment, ExperimentReport, SubsetReport};
pub use layers::lstm_cell::LSTMCell;
pub use loss::{MAELoss, MSELoss};
pub use models::lstm_network::LSTMNetwork;
pub use models::regressor::LSTMRegressor;
pub use optimizers::{Adam, OptimizerKind, RMSprop, SGD};
pub use persistence::{ModelMetadata, ModelPersistence, PersistentModel};
pub use training::{ForecastTrainer, MinibatchHarness, TrainingConfig, TrainingMetrics};

#[cfg(test)]
mod tests {
    use super::*;
    use data::linspace;

    #[test]
    fn test_library_integration() {
        let domain = linspace(0.0, 10.0, 150);
        let dataset = generate_data(f64::sin, &domain, 5, 5, 0.1, 0.1).unwrap();
        let model = LSTMRegressor::new(1, 3, 1, 0.0, Some(1)).unwrap();
        let mut trainer = training::create_basic_trainer(model, 0.05);

        let batch = dataset.batches(Subset::Train, 20).unwrap().iter().next().unwrap();
        let loss = trainer.train_minibatch(&batch);
        let predictions = trainer.eval(batch.inputs);

        assert!(loss.is_finite());
        assert_eq!(predictions.shape(), &[20, 1]);
    }
}
