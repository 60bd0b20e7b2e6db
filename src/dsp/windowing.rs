use std::f32::consts::PI;

/// Symmetric Hann window coefficients of length `n`.
///
/// Formula: w(i) = 0.5 * (1 - cos(2π * i / (n - 1)))
///
/// The window tapers a frame to zero at both edges, which keeps the
/// abrupt frame boundaries from leaking energy across the spectrum.
/// A length of 0 or 1 gives an all-pass window.
pub fn hann(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 2.0 * PI / (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (scale * i as f32).cos()))
        .collect()
}

/// Apply a Hann window to a slice of samples, returning a new Vec.
pub fn apply_hann(samples: &[f32]) -> Vec<f32> {
    samples
        .iter()
        .zip(hann(samples.len()))
        .map(|(&s, w)| s * w)
        .collect()
}
