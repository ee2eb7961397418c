/// Sampling helpers for building synthetic series.

/// Returns `num` evenly spaced points over `[start, end]`, both endpoints included.
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Evaluates `f` at every domain point, in order.
pub fn sample<F: Fn(f64) -> f64>(f: F, domain: &[f64]) -> Vec<f64> {
    domain.iter().map(|&x| f(x)).collect()
}
