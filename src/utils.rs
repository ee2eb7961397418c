//! Numeric helpers shared by the layers.
use ndarray::{Array2, ArrayView2, ArrayView3, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Sigmoid activation function: σ(x) = 1 / (1 + e^(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Seeded generator when `seed` is set, entropy-seeded otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Converts a `(batch, time_steps, features)` block into one `(features, batch)`
/// column matrix per time step, the layout the recurrent layers consume.
pub fn batch_to_sequence(inputs: ArrayView3<f32>) -> Vec<Array2<f64>> {
    inputs
        .axis_iter(Axis(1))
        .map(|step| step.t().mapv(f64::from))
        .collect()
}

/// `(batch, 1)` labels to a `(1, batch)` target row.
pub fn labels_to_targets(labels: ArrayView2<f32>) -> Array2<f64> {
    labels.t().mapv(f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array3};

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-10);
        assert!(sigmoid(1000.0) > 0.99);
        assert!(sigmoid(-1000.0) < 0.01);
    }

    #[test]
    fn test_batch_to_sequence_layout() {
        let inputs = Array3::from_shape_fn((2, 3, 1), |(b, t, _)| (b * 10 + t) as f32);
        let sequence = batch_to_sequence(inputs.view());

        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence[1], arr2(&[[1.0, 11.0]]));
    }

    #[test]
    fn test_labels_to_targets() {
        let labels = arr2(&[[0.5f32], [1.5]]);
        assert_eq!(labels_to_targets(labels.view()), arr2(&[[0.5, 1.5]]));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        use rand::Rng;
        let a: f64 = make_rng(Some(7)).gen();
        let b: f64 = make_rng(Some(7)).gen();
        assert_eq!(a, b);
    }
}
