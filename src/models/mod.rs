/// Module for stacked LSTM networks.
pub mod lstm_network;

/// Module for the sequence-to-one forecaster.
pub mod regressor;
