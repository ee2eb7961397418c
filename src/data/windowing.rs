use ndarray::{Array2, Array3};
use tracing::debug;

use crate::data::series::sample;
use crate::error::{ForecastError, Result};

/// Supervised windows cut from a series.
///
/// `windows` has shape `(count, time_steps, 1)` and `labels` has shape `(count, 1)`.
/// Label `i` is the shifted series value at index `i`, the same index the window
/// starts at, not the index following the window.
#[derive(Debug, Clone)]
pub struct WindowedSeries {
    pub windows: Array3<f32>,
    pub labels: Array2<f32>,
    pub time_steps: usize,
}

impl WindowedSeries {
    /// Number of window/label pairs.
    pub fn len(&self) -> usize {
        self.labels.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Samples `f` over `domain` and cuts windows predicting `time_shift` steps ahead.
///
/// The sampled series `s` is turned into the pair `a = s[..len - time_shift]`,
/// `b = s[time_shift..]` and handed to [`windows_from_pair`]. A series too short to
/// hold one window yields an empty result rather than an error.
pub fn generate_windows<F: Fn(f64) -> f64>(
    f: F,
    domain: &[f64],
    time_steps: usize,
    time_shift: usize,
) -> Result<WindowedSeries> {
    if time_shift == 0 {
        return Err(ForecastError::invalid("time_shift must be positive"));
    }

    let series = sample(f, domain);
    let shifted_len = series.len().saturating_sub(time_shift);
    let a = &series[..shifted_len];
    let b = if series.len() > time_shift { &series[time_shift..] } else { &series[..0] };

    windows_from_pair(a, b, time_steps)
}

/// Cuts windows from an already shifted input/target pair of equal length.
pub fn windows_from_pair(a: &[f64], b: &[f64], time_steps: usize) -> Result<WindowedSeries> {
    if time_steps == 0 {
        return Err(ForecastError::invalid("time_steps must be positive"));
    }
    if a.len() != b.len() {
        return Err(ForecastError::invalid(format!(
            "input series has {} samples but target series has {}",
            a.len(),
            b.len()
        )));
    }

    let count = a.len().saturating_sub(time_steps);
    let windows = Array3::from_shape_fn((count, time_steps, 1), |(i, t, _)| a[i + t] as f32);
    let labels = Array2::from_shape_fn((count, 1), |(i, _)| b[i] as f32);

    debug!(count, time_steps, "generated windows");

    Ok(WindowedSeries { windows, labels, time_steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::series::linspace;

    #[test]
    fn test_sine_window_shapes() {
        let domain = linspace(0.0, 100.0, 10000);
        let data = generate_windows(f64::sin, &domain, 5, 5).unwrap();
        assert_eq!(data.windows.shape(), &[9990, 5, 1]);
        assert_eq!(data.labels.shape(), &[9990, 1]);
    }

    #[test]
    fn test_label_uses_window_start_index() {
        let series: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let data = generate_windows(|x| x, &series, 5, 3).unwrap();

        assert_eq!(data.len(), 20 - 3 - 5);
        for i in 0..data.len() {
            assert_eq!(data.windows[[i, 4, 0]], series[i + 4] as f32);
            assert_eq!(data.labels[[i, 0]], series[i + 3] as f32);
        }
    }

    #[test]
    fn test_pair_windows() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [10.0, 20.0, 30.0, 40.0];
        let data = windows_from_pair(&a, &b, 2).unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.windows[[1, 0, 0]], 2.0);
        assert_eq!(data.windows[[1, 1, 0]], 3.0);
        assert_eq!(data.labels[[1, 0]], 20.0);
    }

    #[test]
    fn test_short_series_is_empty() {
        let data = generate_windows(f64::sin, &[0.0, 1.0, 2.0], 5, 2).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.windows.shape(), &[0, 5, 1]);

        let data = generate_windows(f64::sin, &[0.0], 1, 4).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let domain = linspace(0.0, 1.0, 50);
        assert!(generate_windows(f64::sin, &domain, 0, 1).unwrap_err().is_invalid_argument());
        assert!(generate_windows(f64::sin, &domain, 1, 0).unwrap_err().is_invalid_argument());
        assert!(windows_from_pair(&[1.0], &[1.0, 2.0], 1).unwrap_err().is_invalid_argument());
    }
}
