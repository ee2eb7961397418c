/// Synthetic series sampling.
pub mod series;
/// Sliding windows and shifted labels.
pub mod windowing;
/// Sequential train/val/test splitting.
pub mod split;
/// Fixed-size minibatch iteration.
pub mod batch;
/// Split window/label pairs ready for training.
pub mod dataset;

pub use batch::{next_batch, Batch, MinibatchIter, Minibatches};
pub use dataset::{generate_data, ForecastDataset};
pub use series::{linspace, sample};
pub use split::{split_data, Split, SplitFractions, Subset};
pub use windowing::{generate_windows, windows_from_pair, WindowedSeries};
