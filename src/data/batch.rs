use ndarray::{s, ArrayView2, ArrayView3, Axis};

use crate::error::{ForecastError, Result};

/// One contiguous group of windows with their parallel labels.
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    /// Shape `(batch_size, time_steps, features)`
    pub inputs: ArrayView3<'a, f32>,
    /// Shape `(batch_size, 1)`
    pub labels: ArrayView2<'a, f32>,
}

impl<'a> Batch<'a> {
    pub fn len(&self) -> usize {
        self.labels.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Restartable source of fixed-size minibatches over one subset.
///
/// Batch `k` covers rows `[k * batch_size, (k + 1) * batch_size)` and is produced
/// while `k * batch_size < len - batch_size`. The loop bound drops any short tail,
/// and a subset no longer than `batch_size` yields no batches at all.
#[derive(Debug, Clone)]
pub struct Minibatches<'a> {
    windows: ArrayView3<'a, f32>,
    labels: ArrayView2<'a, f32>,
    batch_size: usize,
}

/// Builds the minibatch source for parallel window and label arrays.
pub fn next_batch<'a>(
    windows: ArrayView3<'a, f32>,
    labels: ArrayView2<'a, f32>,
    batch_size: usize,
) -> Result<Minibatches<'a>> {
    if batch_size == 0 {
        return Err(ForecastError::invalid("batch_size must be positive"));
    }
    if windows.len_of(Axis(0)) != labels.nrows() {
        return Err(ForecastError::invalid(format!(
            "{} windows but {} labels",
            windows.len_of(Axis(0)),
            labels.nrows()
        )));
    }

    Ok(Minibatches { windows, labels, batch_size })
}

impl<'a> Minibatches<'a> {
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches one pass yields.
    pub fn len(&self) -> usize {
        let rows = self.labels.nrows();
        if rows <= self.batch_size {
            0
        } else {
            (rows - self.batch_size + self.batch_size - 1) / self.batch_size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a fresh pass from the first row.
    pub fn iter(&self) -> MinibatchIter<'a> {
        MinibatchIter {
            windows: self.windows,
            labels: self.labels,
            batch_size: self.batch_size,
            stop: self.labels.nrows().saturating_sub(self.batch_size),
            cursor: 0,
        }
    }
}

impl<'a, 'b> IntoIterator for &'b Minibatches<'a> {
    type Item = Batch<'a>;
    type IntoIter = MinibatchIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Single pass over a [`Minibatches`] source.
#[derive(Debug, Clone)]
pub struct MinibatchIter<'a> {
    windows: ArrayView3<'a, f32>,
    labels: ArrayView2<'a, f32>,
    batch_size: usize,
    stop: usize,
    cursor: usize,
}

impl<'a> Iterator for MinibatchIter<'a> {
    type Item = Batch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.stop {
            return None;
        }

        let start = self.cursor;
        let end = start + self.batch_size;
        self.cursor = end;

        Some(Batch {
            inputs: self.windows.slice_move(s![start..end, .., ..]),
            labels: self.labels.slice_move(s![start..end, ..]),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.cursor >= self.stop {
            0
        } else {
            (self.stop - self.cursor + self.batch_size - 1) / self.batch_size
        };
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for MinibatchIter<'a> {}
