//! Conversion between interleaved signed 16-bit PCM and float samples.
//!
//! Both directions scale by 32768 so that `i16::MIN` maps to exactly `-1.0`
//! and back. The float to integer direction saturates instead of wrapping.

/// Scale between the integer and float domains.
pub const PCM16_SCALE: f32 = 32768.0;

/// Converts one 16-bit sample to float in `[-1.0, 1.0)`.
#[inline]
pub fn pcm16_to_float(sample: i16) -> f32 {
    sample as f32 / PCM16_SCALE
}

/// Converts one float sample to 16-bit PCM with hard saturation.
///
/// The scaled value is clamped to the `i16` range and then truncated toward
/// zero.
#[inline]
pub fn float_to_pcm16(sample: f32) -> i16 {
    let scaled = sample * PCM16_SCALE;
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Converts an interleaved 16-bit buffer into `output`.
///
/// Converts `min(input.len(), output.len())` samples and returns that count.
pub fn pcm16_slice_to_float(input: &[i16], output: &mut [f32]) -> usize {
    let n = input.len().min(output.len());
    for (dst, &src) in output[..n].iter_mut().zip(&input[..n]) {
        *dst = pcm16_to_float(src);
    }
    n
}

/// Converts an interleaved float buffer into saturated 16-bit PCM.
///
/// Converts `min(input.len(), output.len())` samples and returns that count.
pub fn float_slice_to_pcm16(input: &[f32], output: &mut [i16]) -> usize {
    let n = input.len().min(output.len());
    for (dst, &src) in output[..n].iter_mut().zip(&input[..n]) {
        *dst = float_to_pcm16(src);
    }
    n
}
