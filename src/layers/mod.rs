/// LSTM cell with full backpropagation.
pub mod lstm_cell;
/// Dense output layer.
pub mod linear;
/// Inverted dropout.
pub mod dropout;
