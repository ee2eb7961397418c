use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::data::SplitFractions;
use crate::error::{ForecastError, Result};
use crate::training::TrainingConfig;

/// Sampled domain and window geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub start: f64,
    pub end: f64,
    pub num_points: usize,
    pub time_steps: usize,
    pub time_shift: usize,
    pub val_size: f64,
    pub test_size: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            start: 0.0,
            end: 100.0,
            num_points: 10_000,
            time_steps: 5,
            time_shift: 5,
            val_size: 0.1,
            test_size: 0.1,
        }
    }
}

impl DataConfig {
    pub fn fractions(&self) -> SplitFractions {
        SplitFractions {
            val_size: self.val_size,
            test_size: self.test_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.start.is_finite() && self.end.is_finite()) {
            return Err(ForecastError::invalid("domain bounds must be finite"));
        }
        if self.time_steps == 0 {
            return Err(ForecastError::invalid("time_steps must be positive"));
        }
        if self.time_shift == 0 {
            return Err(ForecastError::invalid("time_shift must be positive"));
        }
        self.fractions().validate()
    }
}

/// Network shape; `seed` fixes weight init and dropout masks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dropout: f64,
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            hidden_size: 5,
            num_layers: 1,
            dropout: 0.2,
            seed: None,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 || self.num_layers == 0 {
            return Err(ForecastError::invalid("hidden_size and num_layers must be positive"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::invalid(format!("dropout must lie in [0, 1), got {}", self.dropout)));
        }
        Ok(())
    }
}

/// Everything an experiment needs; any missing field takes its default.
///
/// ```json
/// { "data": { "num_points": 2000 }, "training": { "epochs": 20, "optimizer": "sgd" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
}

impl ForecastConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ForecastConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        self.model.validate()?;
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::OptimizerKind;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ForecastConfig::default();
        assert_eq!(config.data.num_points, 10_000);
        assert_eq!(config.data.time_steps, 5);
        assert_eq!(config.model.hidden_size, 5);
        assert_eq!(config.training.epochs, 100);
        assert_eq!(config.training.optimizer, OptimizerKind::Adam);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ForecastConfig::from_json_str(
            r#"{ "data": { "num_points": 500 }, "model": { "seed": 7 }, "training": { "optimizer": "sgd" } }"#,
        )
        .unwrap();

        assert_eq!(config.data.num_points, 500);
        assert_eq!(config.data.time_shift, 5);
        assert_eq!(config.training.optimizer, OptimizerKind::Sgd);
        assert_eq!(config.model.seed, Some(7));
        assert_eq!(config.training.batch_size, 100);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ForecastConfig::from_json_str(r#"{ "data": { "val_size": 0.6, "test_size": 0.5 } }"#).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = ForecastConfig::from_json_str(r#"{ "model": { "dropout": 1.0 } }"#).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = ForecastConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ForecastError::Serialization(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "model": {{ "hidden_size": 8, "num_layers": 2 }} }}"#).unwrap();

        let config = ForecastConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.model.hidden_size, 8);
        assert_eq!(config.model.num_layers, 2);

        let missing = ForecastConfig::from_json_file("/nonexistent/forecast.json").unwrap_err();
        assert!(matches!(missing, ForecastError::Io(_)));
    }
}
