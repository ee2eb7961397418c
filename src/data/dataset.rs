use ndarray::{Array2, Array3};
use tracing::info;

use crate::data::batch::{next_batch, Minibatches};
use crate::data::split::{split_with, Split, SplitFractions, Subset};
use crate::data::windowing::{generate_windows, WindowedSeries};
use crate::error::Result;

/// Windows and labels split with the same fractions, so row `i` of a window
/// subset always pairs with row `i` of the matching label subset.
#[derive(Debug, Clone)]
pub struct ForecastDataset {
    pub windows: Split<Array3<f32>>,
    pub labels: Split<Array2<f32>>,
    pub time_steps: usize,
    pub time_shift: usize,
}

impl ForecastDataset {
    pub fn from_windows(data: &WindowedSeries, time_shift: usize, fractions: &SplitFractions) -> Result<Self> {
        fractions.validate()?;

        Ok(ForecastDataset {
            windows: split_with(&data.windows, fractions),
            labels: split_with(&data.labels, fractions),
            time_steps: data.time_steps,
            time_shift,
        })
    }

    /// Rows in one subset.
    pub fn len(&self, subset: Subset) -> usize {
        self.labels.get(subset).nrows()
    }

    pub fn batches(&self, subset: Subset, batch_size: usize) -> Result<Minibatches<'_>> {
        next_batch(
            self.windows.get(subset).view(),
            self.labels.get(subset).view(),
            batch_size,
        )
    }
}

/// Samples `f` over `domain`, cuts windows and splits them into train/val/test.
pub fn generate_data<F: Fn(f64) -> f64>(
    f: F,
    domain: &[f64],
    time_steps: usize,
    time_shift: usize,
    val_size: f64,
    test_size: f64,
) -> Result<ForecastDataset> {
    let fractions = SplitFractions::new(val_size, test_size)?;
    let windowed = generate_windows(f, domain, time_steps, time_shift)?;
    let dataset = ForecastDataset::from_windows(&windowed, time_shift, &fractions)?;

    info!(
        train = dataset.len(Subset::Train),
        val = dataset.len(Subset::Val),
        test = dataset.len(Subset::Test),
        "dataset ready"
    );

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::series::linspace;

    #[test]
    fn test_generate_data_splits_windows_and_labels_alike() {
        let domain = linspace(0.0, 10.0, 120);
        let dataset = generate_data(f64::sin, &domain, 5, 5, 0.1, 0.1).unwrap();

        // 110 windows: test_cut = 99, val_cut = 89
        for subset in Subset::ALL {
            assert_eq!(dataset.windows.get(subset).shape()[0], dataset.len(subset));
        }
        assert_eq!(dataset.len(Subset::Train), 89);
        assert_eq!(dataset.len(Subset::Val), 10);
        assert_eq!(dataset.len(Subset::Test), 11);
    }

    #[test]
    fn test_dataset_batches_per_subset() {
        let domain = linspace(0.0, 10.0, 120);
        let dataset = generate_data(f64::sin, &domain, 5, 5, 0.1, 0.1).unwrap();

        assert_eq!(dataset.batches(Subset::Train, 10).unwrap().len(), 8);
        assert_eq!(dataset.batches(Subset::Val, 10).unwrap().len(), 0);
        assert!(dataset.batches(Subset::Test, 0).is_err());
    }
}
