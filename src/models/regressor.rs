use ndarray::{s, Array2, ArrayView3, Axis};

use crate::error::Result;
use crate::layers::dropout::Dropout;
use crate::layers::linear::{LinearGradients, LinearLayer};
use crate::layers::lstm_cell::LSTMCellGradients;
use crate::models::lstm_network::{LSTMNetwork, LSTMNetworkCache};
use crate::optimizers::Optimizer;
use crate::utils::{batch_to_sequence, make_rng};

/// Values saved by [`LSTMRegressor::forward_with_cache`] for the backward pass
#[derive(Clone, Debug)]
pub struct RegressorCache {
    pub step_caches: Vec<LSTMNetworkCache>,
    pub head_input: Array2<f64>,
}

/// Gradients for every trainable matrix of the regressor
#[derive(Clone, Debug)]
pub struct RegressorGradients {
    pub lstm: Vec<LSTMCellGradients>,
    pub head: LinearGradients,
}

impl RegressorGradients {
    pub fn matrices_mut(&mut self) -> Vec<&mut Array2<f64>> {
        let mut matrices: Vec<&mut Array2<f64>> = Vec::new();
        for layer in self.lstm.iter_mut() {
            matrices.extend(layer.matrices_mut());
        }
        matrices.extend(self.head.matrices_mut());
        matrices
    }
}

/// Sequence-to-one forecaster: stacked LSTM, dropout on the last hidden state,
/// then a dense layer producing one value per window.
#[derive(Clone, Debug)]
pub struct LSTMRegressor {
    pub lstm: LSTMNetwork,
    pub dropout: Dropout,
    pub head: LinearLayer,
}

impl LSTMRegressor {
    /// Builds a regressor whose weights and dropout masks come from `seed` when given
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        num_layers: usize,
        dropout_rate: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        let mut rng = make_rng(seed);
        let lstm = LSTMNetwork::new(input_size, hidden_size, num_layers, &mut rng);
        let head = LinearLayer::new(hidden_size, 1, &mut rng);
        let dropout = Dropout::new(dropout_rate, seed.map(|s| s.wrapping_add(1)))?;

        Ok(LSTMRegressor { lstm, dropout, head })
    }

    pub fn from_parts(lstm: LSTMNetwork, head: LinearLayer, dropout_rate: f64) -> Result<Self> {
        Ok(LSTMRegressor {
            lstm,
            dropout: Dropout::new(dropout_rate, None)?,
            head,
        })
    }

    pub fn train(&mut self) {
        self.dropout.train();
    }

    pub fn eval(&mut self) {
        self.dropout.eval();
    }

    pub fn is_training(&self) -> bool {
        self.dropout.is_training
    }

    /// Forward pass over `(features, batch)` steps; returns `(1, batch)` predictions
    pub fn forward_with_cache(&mut self, sequence: &[Array2<f64>]) -> (Array2<f64>, RegressorCache) {
        let (last_hidden, step_caches) = self.lstm.forward_sequence_with_cache(sequence);
        let head_input = self.dropout.forward(&last_hidden);
        let output = self.head.forward(&head_input);

        (output, RegressorCache { step_caches, head_input })
    }

    pub fn forward(&mut self, sequence: &[Array2<f64>]) -> Array2<f64> {
        self.forward_with_cache(sequence).0
    }

    /// Backward pass from the gradient of the loss w.r.t. the `(1, batch)` output
    pub fn backward(&self, d_output: &Array2<f64>, cache: &RegressorCache) -> RegressorGradients {
        let (head, d_head_input) = self.head.backward(&cache.head_input, d_output);
        let d_last_hidden = self.dropout.backward(&d_head_input);
        let lstm = self.lstm.backward_through_time(&d_last_hidden, &cache.step_caches);

        RegressorGradients { lstm, head }
    }

    pub fn update_parameters<O: Optimizer + ?Sized>(&mut self, gradients: &RegressorGradients, optimizer: &mut O) {
        self.lstm.update_parameters(&gradients.lstm, optimizer);
        self.head.update_parameters(&gradients.head, optimizer, "head");
    }

    /// Predictions for `(count, time_steps, features)` windows, `batch_size` rows at a time,
    /// always in evaluation mode. Returns `(count, 1)`.
    pub fn predict(&mut self, windows: ArrayView3<f32>, batch_size: usize) -> Array2<f32> {
        let rows = windows.len_of(Axis(0));
        let mut predictions = Array2::zeros((rows, 1));
        let was_training = self.is_training();
        self.eval();

        let mut start = 0;
        for chunk in windows.axis_chunks_iter(Axis(0), batch_size.max(1)) {
            let len = chunk.len_of(Axis(0));
            let output = self.forward(&batch_to_sequence(chunk));
            predictions
                .slice_mut(s![start..start + len, ..])
                .assign(&output.t().mapv(|x| x as f32));
            start += len;
        }

        if was_training {
            self.train();
        }
        predictions
    }

    pub fn num_parameters(&self) -> usize {
        self.lstm.num_parameters() + self.head.num_parameters()
    }
}
