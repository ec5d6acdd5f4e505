//! Hann window used by the WSOLA similarity search and the frequency
//! validator.

use std::f64::consts::PI;

/// Hann coefficient `0.5 * (1 - cos(2πi / (n - 1)))` for index `i` of an
/// `n`-point window. Degenerate windows (`n < 2`) are all ones.
#[inline]
pub fn hann_coefficient(i: usize, n: usize) -> f64 {
    if n < 2 {
        return 1.0;
    }
    let x = (2.0 * PI * i as f64) / (n as f64 - 1.0);
    0.5 * (1.0 - x.cos())
}

/// Fills `out` with a Hann window of length `out.len()`.
pub fn fill_hann(out: &mut [f32]) {
    let n = out.len();
    for (i, w) in out.iter_mut().enumerate() {
        *w = hann_coefficient(i, n) as f32;
    }
}

/// Multiplies `signal` in place by a Hann window of the same length.
pub fn apply_hann(signal: &mut [f64]) {
    let n = signal.len();
    for (i, s) in signal.iter_mut().enumerate() {
        *s *= hann_coefficient(i, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn hann_window(size: usize) -> Vec<f32> {
        let mut window = vec![0.0f32; size];
        fill_hann(&mut window);
        window
    }

    #[test]
    fn test_hann_endpoints_and_peak() {
        let w = hann_window(9);
        assert_abs_diff_eq!(w[0], 0.0, epsilon = 1e-7);
        assert_abs_diff_eq!(w[8], 0.0, epsilon = 1e-7);
        assert_abs_diff_eq!(w[4], 1.0, epsilon = 1e-7);
    }

    #[test]
    fn test_hann_symmetric() {
        let w = hann_window(64);
        for i in 0..32 {
            assert_abs_diff_eq!(w[i], w[63 - i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_degenerate_sizes() {
        assert!(hann_window(0).is_empty());
        assert_eq!(hann_window(1), vec![1.0]);
    }

    #[test]
    fn test_apply_hann_matches_coefficients() {
        let mut signal = vec![2.0f64; 5];
        apply_hann(&mut signal);
        assert_abs_diff_eq!(signal[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(signal[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(signal[2], 2.0, epsilon = 1e-12);
    }
}
