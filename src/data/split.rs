use ndarray::{Array, ArrayBase, Axis, Data, RemoveAxis, Slice};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Names one part of a [`Split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subset {
    Train,
    Val,
    Test,
}

impl Subset {
    /// All subsets in slicing order.
    pub const ALL: [Subset; 3] = [Subset::Train, Subset::Val, Subset::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subset::Train => "train",
            Subset::Val => "val",
            Subset::Test => "test",
        }
    }
}

impl std::fmt::Display for Subset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sequential three-way partition of an ordered array.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub train: T,
    pub val: T,
    pub test: T,
}

impl<T> Split<T> {
    pub fn get(&self, subset: Subset) -> &T {
        match subset {
            Subset::Train => &self.train,
            Subset::Val => &self.val,
            Subset::Test => &self.test,
        }
    }
}

/// Validation and test fractions used by [`split_data`].
///
/// `test_size` is taken from the whole array, `val_size` from what remains after
/// the test tail is removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitFractions {
    pub val_size: f64,
    pub test_size: f64,
}

impl Default for SplitFractions {
    fn default() -> Self {
        SplitFractions {
            val_size: 0.1,
            test_size: 0.1,
        }
    }
}

impl SplitFractions {
    pub fn new(val_size: f64, test_size: f64) -> Result<Self> {
        let fractions = SplitFractions { val_size, test_size };
        fractions.validate()?;
        Ok(fractions)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("val_size", self.val_size), ("test_size", self.test_size)] {
            if !(0.0..1.0).contains(&value) {
                return Err(ForecastError::invalid(format!(
                    "{} must lie in [0, 1), got {}",
                    name, value
                )));
            }
        }
        if self.val_size + self.test_size >= 1.0 {
            return Err(ForecastError::invalid(format!(
                "val_size + test_size must be below 1, got {}",
                self.val_size + self.test_size
            )));
        }
        Ok(())
    }

    /// Cut points `(val_cut, test_cut)` for an array of `len` rows.
    pub fn cut_points(&self, len: usize) -> (usize, usize) {
        let test_cut = (len as f64 * (1.0 - self.test_size)).floor() as usize;
        let val_cut = (test_cut as f64 * (1.0 - self.val_size)).floor() as usize;
        (val_cut, test_cut)
    }
}

/// Splits `data` along its first axis into train/val/test without shuffling.
///
/// `test_cut = floor(len * (1 - test_size))`, `val_cut = floor(test_cut * (1 - val_size))`;
/// train is `[0, val_cut)`, val is `[val_cut, test_cut)` and test is `[test_cut, len)`.
pub fn split_data<S, A, D>(
    data: &ArrayBase<S, D>,
    val_size: f64,
    test_size: f64,
) -> Result<Split<Array<A, D>>>
where
    S: Data<Elem = A>,
    A: Clone,
    D: RemoveAxis,
{
    let fractions = SplitFractions::new(val_size, test_size)?;
    Ok(split_with(data, &fractions))
}

pub(crate) fn split_with<S, A, D>(data: &ArrayBase<S, D>, fractions: &SplitFractions) -> Split<Array<A, D>>
where
    S: Data<Elem = A>,
    A: Clone,
    D: RemoveAxis,
{
    let len = data.len_of(Axis(0));
    let (val_cut, test_cut) = fractions.cut_points(len);
    let part = |start: usize, end: usize| data.slice_axis(Axis(0), Slice::from(start..end)).to_owned();

    Split {
        train: part(0, val_cut),
        val: part(val_cut, test_cut),
        test: part(test_cut, len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{concatenate, Array1, Array2};

    #[test]
    fn test_split_lengths() {
        let data = Array1::from_iter((0..100).map(|i| i as f32));
        let split = split_data(&data, 0.1, 0.1).unwrap();
        assert_eq!(split.train.len(), 81);
        assert_eq!(split.val.len(), 9);
        assert_eq!(split.test.len(), 10);
    }

    #[test]
    fn test_split_reconstructs_order() {
        let data = Array2::from_shape_fn((57, 2), |(i, j)| (i * 2 + j) as f64);
        let split = split_data(&data, 0.25, 0.2).unwrap();
        let joined = concatenate(
            Axis(0),
            &[split.train.view(), split.val.view(), split.test.view()],
        )
        .unwrap();
        assert_eq!(joined, data);
    }

    #[test]
    fn test_zero_fractions() {
        let data = Array1::from_iter(0..10);
        let split = split_data(&data, 0.0, 0.0).unwrap();
        assert_eq!(split.train, data);
        assert!(split.val.is_empty());
        assert!(split.test.is_empty());
    }

    #[test]
    fn test_invalid_fractions() {
        let data = Array1::from_iter(0..10);
        assert!(split_data(&data, 0.5, 0.5).unwrap_err().is_invalid_argument());
        assert!(split_data(&data, -0.1, 0.1).unwrap_err().is_invalid_argument());
        assert!(split_data(&data, 0.1, 1.0).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_subset_lookup() {
        let split = Split { train: 1, val: 2, test: 3 };
        let values: Vec<i32> = Subset::ALL.iter().map(|s| *split.get(*s)).collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(Subset::Val.to_string(), "val");
    }
}
