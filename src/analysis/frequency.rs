//! Dominant-frequency detection for verifying pitch shifts.
//!
//! The spectrum is a Hann-windowed naive DFT, so cost is O(N²). That is fine
//! for test buffers of up to 16384 samples and keeps the estimate free of any
//! FFT-size constraints. The peak bin is refined by fitting a parabola
//! through it and its two neighbours.

use rustfft::algorithm::Dft;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftDirection};

use crate::core::window::apply_hann;

/// RMS below which a signal is treated as silence.
pub const SILENCE_RMS: f64 = 1e-6;

/// Shortest signal the detector analyses.
pub const MIN_ANALYSIS_LEN: usize = 4;

/// Root-mean-square level of `signal`; 0 for an empty slice.
pub fn rms_energy(signal: &[f32]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    (sum_sq / signal.len() as f64).sqrt()
}

/// Magnitudes of the Hann-windowed DFT at bins `0..=N/2`.
///
/// Returns an empty vector when the signal is shorter than
/// [`MIN_ANALYSIS_LEN`].
pub fn compute_magnitude_spectrum(signal: &[f32]) -> Vec<f64> {
    let n = signal.len();
    if n < MIN_ANALYSIS_LEN {
        return Vec::new();
    }

    let mut windowed: Vec<f64> = signal.iter().map(|&s| s as f64).collect();
    apply_hann(&mut windowed);

    let mut buffer: Vec<Complex<f64>> = windowed.iter().map(|&s| Complex::new(s, 0.0)).collect();
    let dft = Dft::new(n, FftDirection::Forward);
    dft.process(&mut buffer);

    buffer[..=n / 2].iter().map(|c| c.norm()).collect()
}

/// Estimates the dominant frequency of `signal` in Hz.
///
/// Returns 0 for signals shorter than [`MIN_ANALYSIS_LEN`], a zero sample
/// rate, or silence.
pub fn detect_frequency(signal: &[f32], sample_rate: u32) -> f64 {
    let n = signal.len();
    if n < MIN_ANALYSIS_LEN || sample_rate == 0 || rms_energy(signal) < SILENCE_RMS {
        return 0.0;
    }

    let spectrum = compute_magnitude_spectrum(signal);
    let peak = find_peak_bin(&spectrum);
    refine_peak(&spectrum, peak) * sample_rate as f64 / n as f64
}

/// True when the detected frequency is positive and within `tolerance_hz`
/// of `expected_hz`.
pub fn is_frequency(signal: &[f32], sample_rate: u32, expected_hz: f64, tolerance_hz: f64) -> bool {
    let detected = detect_frequency(signal, sample_rate);
    detected > 0.0 && (detected - expected_hz).abs() <= tolerance_hz
}

/// True when `input` sits at `from_hz` and `output` at `to_hz`, both within
/// `tolerance_hz`.
pub fn validate_pitch_shift(
    input: &[f32],
    output: &[f32],
    sample_rate: u32,
    from_hz: f64,
    to_hz: f64,
    tolerance_hz: f64,
) -> bool {
    is_frequency(input, sample_rate, from_hz, tolerance_hz)
        && is_frequency(output, sample_rate, to_hz, tolerance_hz)
}

/// Largest bin in `1..=len-2`, skipping DC and the Nyquist bin. Ties keep the
/// lower bin.
fn find_peak_bin(spectrum: &[f64]) -> usize {
    let mut peak = 1;
    for k in 2..spectrum.len().saturating_sub(1) {
        if spectrum[k] > spectrum[peak] {
            peak = k;
        }
    }
    peak
}

/// Fractional bin of the parabola through the peak and its neighbours, or
/// the peak itself when the curvature is not concave or a neighbour is
/// missing.
fn refine_peak(spectrum: &[f64], peak: usize) -> f64 {
    if peak == 0 || peak + 1 >= spectrum.len() {
        return peak as f64;
    }
    let ym1 = spectrum[peak - 1];
    let y0 = spectrum[peak];
    let yp1 = spectrum[peak + 1];
    let denom = ym1 - 2.0 * y0 + yp1;
    if denom >= 0.0 {
        return peak as f64;
    }
    peak as f64 + 0.5 * (ym1 - yp1) / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(freq: f64, sample_rate: u32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (0.5 * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin()) as f32)
            .collect()
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms_energy(&[]), 0.0);
        assert_eq!(rms_energy(&[0.0; 16]), 0.0);
        assert!((rms_energy(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_spectrum_length() {
        assert!(compute_magnitude_spectrum(&[1.0, 0.0, -1.0]).is_empty());
        assert_eq!(compute_magnitude_spectrum(&tone(440.0, 48000, 1024)).len(), 513);
    }

    #[test]
    fn test_spectrum_peak_bin() {
        let n = 2048;
        let spectrum = compute_magnitude_spectrum(&tone(3000.0, 48000, n));
        // 3000 Hz lands exactly on bin 128 at this size.
        assert_eq!(find_peak_bin(&spectrum), 128);
    }

    #[test]
    fn test_refine_falls_back_on_flat_curvature() {
        assert_eq!(refine_peak(&[1.0, 1.0, 1.0, 1.0], 1), 1.0);
        assert_eq!(refine_peak(&[0.0, 1.0, 3.0], 2), 2.0);
    }

    #[test]
    fn test_refine_centres_symmetric_peak() {
        let bin = refine_peak(&[0.0, 0.5, 1.0, 0.5, 0.0], 2);
        assert!((bin - 2.0).abs() < 1e-12);
        let bin = refine_peak(&[0.0, 1.0, 1.0, 0.0], 1);
        assert!((bin - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_return_zero() {
        assert_eq!(detect_frequency(&[], 48000), 0.0);
        assert_eq!(detect_frequency(&[0.5, -0.5, 0.5], 48000), 0.0);
        assert_eq!(detect_frequency(&[0.0; 1024], 48000), 0.0);
        assert_eq!(detect_frequency(&tone(440.0, 48000, 1024), 0), 0.0);
    }
}
