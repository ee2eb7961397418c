use ndarray::Array2;
use rand::Rng;

use crate::layers::lstm_cell::{LSTMCell, LSTMCellCache, LSTMCellGradients};
use crate::optimizers::Optimizer;

/// Holds cached values for all layers at one time step
#[derive(Clone, Debug)]
pub struct LSTMNetworkCache {
    pub cell_caches: Vec<LSTMCellCache>,
}

/// Multi-layer LSTM network for sequence modeling
///
/// Stacks multiple LSTM cells where the output of layer i becomes
/// the input to layer i+1. States are `(hidden_size, batch)` matrices.
#[derive(Clone, Debug)]
pub struct LSTMNetwork {
    cells: Vec<LSTMCell>,
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
}

impl LSTMNetwork {
    /// Creates a new multi-layer LSTM network
    ///
    /// First layer accepts `input_size` dimensions, subsequent layers
    /// accept `hidden_size` dimensions from the previous layer.
    pub fn new<R: Rng + ?Sized>(input_size: usize, hidden_size: usize, num_layers: usize, rng: &mut R) -> Self {
        let cells = (0..num_layers)
            .map(|i| {
                let layer_input_size = if i == 0 { input_size } else { hidden_size };
                LSTMCell::new(layer_input_size, hidden_size, &mut *rng)
            })
            .collect();

        LSTMNetwork {
            cells,
            input_size,
            hidden_size,
            num_layers,
        }
    }

    /// Creates a network from existing cells (used for deserialization)
    pub fn from_cells(cells: Vec<LSTMCell>, input_size: usize, hidden_size: usize) -> Self {
        let num_layers = cells.len();
        LSTMNetwork {
            cells,
            input_size,
            hidden_size,
            num_layers,
        }
    }

    /// Get reference to the cells (used for serialization)
    pub fn get_cells(&self) -> &[LSTMCell] {
        &self.cells
    }

    /// One time step through every layer, with the per-layer states
    pub fn forward_step(
        &self,
        input: &Array2<f64>,
        states: &[(Array2<f64>, Array2<f64>)],
    ) -> (Vec<(Array2<f64>, Array2<f64>)>, LSTMNetworkCache) {
        let mut current_input = input.clone();
        let mut new_states = Vec::with_capacity(self.num_layers);
        let mut cell_caches = Vec::with_capacity(self.num_layers);

        for (cell, (hx, cx)) in self.cells.iter().zip(states.iter()) {
            let (hy, cy, cache) = cell.forward_with_cache(&current_input, hx, cx);
            cell_caches.push(cache);

            // Layer i+1 input is layer i hidden output
            current_input = hy.clone();
            new_states.push((hy, cy));
        }

        (new_states, LSTMNetworkCache { cell_caches })
    }

    /// Zero hidden and cell state for every layer
    pub fn initial_states(&self, batch_size: usize) -> Vec<(Array2<f64>, Array2<f64>)> {
        (0..self.num_layers)
            .map(|_| {
                (
                    Array2::zeros((self.hidden_size, batch_size)),
                    Array2::zeros((self.hidden_size, batch_size)),
                )
            })
            .collect()
    }

    /// Process an entire sequence from zero state with caching for training
    ///
    /// Returns the top layer's hidden state after the last step and one cache per step.
    pub fn forward_sequence_with_cache(&self, sequence: &[Array2<f64>]) -> (Array2<f64>, Vec<LSTMNetworkCache>) {
        let batch_size = sequence.first().map(|step| step.ncols()).unwrap_or(0);
        let mut states = self.initial_states(batch_size);
        let mut caches = Vec::with_capacity(sequence.len());

        for input in sequence {
            let (new_states, cache) = self.forward_step(input, &states);
            caches.push(cache);
            states = new_states;
        }

        let last_hidden = states
            .pop()
            .map(|(hy, _)| hy)
            .unwrap_or_else(|| Array2::zeros((self.hidden_size, batch_size)));

        (last_hidden, caches)
    }

    /// Backpropagation through time from a gradient on the final top-layer hidden state
    ///
    /// Walks time steps in reverse and layers top-down, carrying hidden/cell gradients
    /// to the previous step and input gradients to the layer below. Returns the
    /// parameter gradients of each layer summed over all steps.
    pub fn backward_through_time(&self, d_last_hidden: &Array2<f64>, caches: &[LSTMNetworkCache]) -> Vec<LSTMCellGradients> {
        let batch_size = d_last_hidden.ncols();
        let mut gradients = self.zero_gradients();
        let mut dh_next: Vec<Array2<f64>> = (0..self.num_layers)
            .map(|_| Array2::zeros((self.hidden_size, batch_size)))
            .collect();
        let mut dc_next = dh_next.clone();

        if let Some(top) = dh_next.last_mut() {
            *top += d_last_hidden;
        }

        for cache in caches.iter().rev() {
            let mut from_above: Option<Array2<f64>> = None;

            for (layer, cell) in self.cells.iter().enumerate().rev() {
                let mut dh = dh_next[layer].clone();
                if let Some(dx) = from_above.take() {
                    dh += &dx;
                }

                let (step_gradients, dx, dhx, dcx) = cell.backward(&dh, &dc_next[layer], &cache.cell_caches[layer]);
                gradients[layer].accumulate(&step_gradients);

                dh_next[layer] = dhx;
                dc_next[layer] = dcx;
                from_above = Some(dx);
            }
        }

        gradients
    }

    /// Update parameters for all layers using computed gradients
    pub fn update_parameters<O: Optimizer + ?Sized>(&mut self, gradients: &[LSTMCellGradients], optimizer: &mut O) {
        for (i, (cell, cell_gradients)) in self.cells.iter_mut().zip(gradients.iter()).enumerate() {
            let prefix = format!("layer_{}", i);
            cell.update_parameters(cell_gradients, optimizer, &prefix);
        }
    }

    /// Initialize zero gradients for all layers
    pub fn zero_gradients(&self) -> Vec<LSTMCellGradients> {
        self.cells.iter().map(|cell| cell.zero_gradients()).collect()
    }

    pub fn num_parameters(&self) -> usize {
        self.cells.iter().map(|cell| cell.num_parameters()).sum()
    }
}
