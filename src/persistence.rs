use ndarray::{Array2, Dimension};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::layers::linear::LinearLayer;
use crate::layers::lstm_cell::LSTMCell;
use crate::models::lstm_network::LSTMNetwork;
use crate::models::regressor::LSTMRegressor;

/// Serializable version of Array2<f64> for persistence
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SerializableArray2 {
    data: Vec<f64>,
    shape: (usize, usize),
}

impl From<&Array2<f64>> for SerializableArray2 {
    fn from(array: &Array2<f64>) -> Self {
        Self {
            data: array.iter().cloned().collect(),
            shape: array.raw_dim().into_pattern(),
        }
    }
}

impl TryFrom<SerializableArray2> for Array2<f64> {
    type Error = ForecastError;

    fn try_from(array: SerializableArray2) -> Result<Self> {
        let (rows, cols) = array.shape;
        let found = array.data.len();
        Array2::from_shape_vec(array.shape, array.data).map_err(|_| {
            ForecastError::Serialization(format!(
                "array of shape ({}, {}) cannot hold {} values",
                rows, cols, found
            ))
        })
    }
}

/// Serializable LSTM cell parameters
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SerializableLSTMCell {
    w_ih: SerializableArray2,
    w_hh: SerializableArray2,
    b_ih: SerializableArray2,
    b_hh: SerializableArray2,
    input_size: usize,
    hidden_size: usize,
}

impl From<&LSTMCell> for SerializableLSTMCell {
    fn from(cell: &LSTMCell) -> Self {
        Self {
            w_ih: (&cell.w_ih).into(),
            w_hh: (&cell.w_hh).into(),
            b_ih: (&cell.b_ih).into(),
            b_hh: (&cell.b_hh).into(),
            input_size: cell.input_size,
            hidden_size: cell.hidden_size,
        }
    }
}

impl TryFrom<SerializableLSTMCell> for LSTMCell {
    type Error = ForecastError;

    fn try_from(cell: SerializableLSTMCell) -> Result<Self> {
        let gates = 4 * cell.hidden_size;
        let restored = LSTMCell {
            w_ih: cell.w_ih.try_into()?,
            w_hh: cell.w_hh.try_into()?,
            b_ih: cell.b_ih.try_into()?,
            b_hh: cell.b_hh.try_into()?,
            input_size: cell.input_size,
            hidden_size: cell.hidden_size,
        };

        let consistent = restored.w_ih.dim() == (gates, cell.input_size)
            && restored.w_hh.dim() == (gates, cell.hidden_size)
            && restored.b_ih.dim() == (gates, 1)
            && restored.b_hh.dim() == (gates, 1);
        if !consistent {
            return Err(ForecastError::Serialization(format!(
                "LSTM cell weights do not match input_size {} / hidden_size {}",
                cell.input_size, cell.hidden_size
            )));
        }
        Ok(restored)
    }
}

/// Serializable dense head
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SerializableLinear {
    weight: SerializableArray2,
    bias: SerializableArray2,
}

impl From<&LinearLayer> for SerializableLinear {
    fn from(layer: &LinearLayer) -> Self {
        Self {
            weight: (&layer.weight).into(),
            bias: (&layer.bias).into(),
        }
    }
}

impl TryFrom<SerializableLinear> for LinearLayer {
    type Error = ForecastError;

    fn try_from(layer: SerializableLinear) -> Result<Self> {
        LinearLayer::from_weights(layer.weight.try_into()?, layer.bias.try_into()?)
            .ok_or_else(|| ForecastError::Serialization("linear bias does not match weight rows".to_string()))
    }
}

/// Serializable forecaster: recurrent stack, dropout rate and head
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SerializableRegressor {
    cells: Vec<SerializableLSTMCell>,
    input_size: usize,
    hidden_size: usize,
    dropout: f64,
    head: SerializableLinear,
}

impl From<&LSTMRegressor> for SerializableRegressor {
    fn from(model: &LSTMRegressor) -> Self {
        Self {
            cells: model.lstm.get_cells().iter().map(SerializableLSTMCell::from).collect(),
            input_size: model.lstm.input_size,
            hidden_size: model.lstm.hidden_size,
            dropout: model.dropout.dropout_rate,
            head: (&model.head).into(),
        }
    }
}

impl TryFrom<SerializableRegressor> for LSTMRegressor {
    type Error = ForecastError;

    fn try_from(model: SerializableRegressor) -> Result<Self> {
        let cells = model
            .cells
            .into_iter()
            .map(LSTMCell::try_from)
            .collect::<Result<Vec<_>>>()?;
        let head = LinearLayer::try_from(model.head)?;
        check_layer_chain(&cells, &head, model.input_size, model.hidden_size)?;

        let lstm = LSTMNetwork::from_cells(cells, model.input_size, model.hidden_size);

        LSTMRegressor::from_parts(lstm, head, model.dropout)
            .map_err(|e| ForecastError::Serialization(e.to_string()))
    }
}

/// Each layer must consume what the previous one produces, ending in a `(1, hidden_size)` head
fn check_layer_chain(cells: &[LSTMCell], head: &LinearLayer, input_size: usize, hidden_size: usize) -> Result<()> {
    if cells.is_empty() {
        return Err(ForecastError::Serialization("saved model has no LSTM layers".to_string()));
    }

    let mut expected_input = input_size;
    for (layer, cell) in cells.iter().enumerate() {
        if cell.input_size != expected_input || cell.hidden_size != hidden_size {
            return Err(ForecastError::Serialization(format!(
                "layer {} is {} -> {}, expected {} -> {}",
                layer, cell.input_size, cell.hidden_size, expected_input, hidden_size
            )));
        }
        expected_input = cell.hidden_size;
    }

    if head.input_size != hidden_size || head.output_size != 1 {
        return Err(ForecastError::Serialization(format!(
            "head is {} -> {}, expected {} -> 1",
            head.input_size, head.output_size, hidden_size
        )));
    }
    Ok(())
}

/// Model metadata for tracking training information
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelMetadata {
    pub model_name: String,
    pub version: String,
    pub created_at: String,
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub time_steps: usize,
    pub time_shift: usize,
    pub total_epochs: usize,
    pub final_loss: Option<f64>,
    pub description: Option<String>,
}

impl ModelMetadata {
    /// Describes `model` and the window geometry it was trained on, without copying weights
    pub fn for_model(
        model: &LSTMRegressor,
        model_name: String,
        time_steps: usize,
        time_shift: usize,
        total_epochs: usize,
        final_loss: Option<f64>,
        description: Option<String>,
    ) -> Self {
        ModelMetadata {
            model_name,
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            input_size: model.lstm.input_size,
            hidden_size: model.lstm.hidden_size,
            num_layers: model.lstm.num_layers,
            time_steps,
            time_shift,
            total_epochs,
            final_loss,
            description,
        }
    }
}

/// Complete saved model including weights and metadata
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SavedModel {
    pub model: SerializableRegressor,
    pub metadata: ModelMetadata,
}

/// Model persistence operations
pub struct ModelPersistence;

impl ModelPersistence {
    /// Save model to JSON format (human-readable)
    pub fn save_to_json<P: AsRef<Path>>(model: &SavedModel, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(model)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load model from JSON format
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<SavedModel> {
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save model to binary format (compact and fast)
    pub fn save_to_binary<P: AsRef<Path>>(model: &SavedModel, path: P) -> Result<()> {
        let encoded = bincode::serialize(model)?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load model from binary format
    pub fn load_from_binary<P: AsRef<Path>>(path: P) -> Result<SavedModel> {
        let mut contents = Vec::new();
        File::open(path)?.read_to_end(&mut contents)?;
        Ok(bincode::deserialize(&contents)?)
    }

    /// Bundle a trained model with metadata describing how it was trained
    pub fn create_saved_model(
        model: &LSTMRegressor,
        model_name: String,
        time_steps: usize,
        time_shift: usize,
        total_epochs: usize,
        final_loss: Option<f64>,
        description: Option<String>,
    ) -> SavedModel {
        let metadata = ModelMetadata::for_model(
            model,
            model_name,
            time_steps,
            time_shift,
            total_epochs,
            final_loss,
            description,
        );

        SavedModel {
            model: model.into(),
            metadata,
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("json")
}

/// Convenience trait for easy model saving/loading
pub trait PersistentModel {
    /// Save model to file; `.json` is written as JSON, anything else as bincode
    fn save<P: AsRef<Path>>(&self, path: P, metadata: ModelMetadata) -> Result<()>;

    /// Load model from file, choosing the format by extension like [`PersistentModel::save`]
    fn load<P: AsRef<Path>>(path: P) -> Result<(Self, ModelMetadata)>
    where
        Self: Sized;
}

impl PersistentModel for LSTMRegressor {
    fn save<P: AsRef<Path>>(&self, path: P, metadata: ModelMetadata) -> Result<()> {
        let path = path.as_ref();
        let saved_model = SavedModel {
            model: self.into(),
            metadata,
        };

        debug!(path = %path.display(), json = is_json(path), "saving model");
        if is_json(path) {
            ModelPersistence::save_to_json(&saved_model, path)
        } else {
            ModelPersistence::save_to_binary(&saved_model, path)
        }
    }

    fn load<P: AsRef<Path>>(path: P) -> Result<(Self, ModelMetadata)> {
        let path = path.as_ref();
        debug!(path = %path.display(), json = is_json(path), "loading model");
        let saved_model = if is_json(path) {
            ModelPersistence::load_from_json(path)?
        } else {
            ModelPersistence::load_from_binary(path)?
        };

        let model = LSTMRegressor::try_from(saved_model.model)?;
        Ok((model, saved_model.metadata))
    }
}
