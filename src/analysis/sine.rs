//! Phase-continuous reference tone generator.

use std::f64::consts::{PI, TAU};

use crate::error::ShiftError;

/// Largest channel count the generator accepts.
pub const MAX_GENERATOR_CHANNELS: u16 = 8;

/// Sine tone generator writing the same sample to every channel of a frame.
///
/// The phase accumulator survives between calls, so consecutive buffers
/// join without a discontinuity.
#[derive(Debug, Clone)]
pub struct SineGenerator {
    frequency: f64,
    sample_rate: u32,
    channels: u16,
    amplitude: f32,
    phase: f64,
    phase_increment: f64,
}

impl SineGenerator {
    /// Creates a generator.
    ///
    /// # Errors
    /// Returns `ShiftError::InvalidArgument` when the sample rate is zero,
    /// the frequency is not in `(0, sample_rate / 2)`, the channel count is
    /// not in `1..=8`, or the amplitude is not in `[0, 1]`.
    pub fn new(
        frequency: f64,
        sample_rate: u32,
        channels: u16,
        amplitude: f32,
    ) -> Result<Self, ShiftError> {
        if sample_rate == 0 {
            return Err(ShiftError::InvalidArgument("sample rate must be non-zero"));
        }
        validate_frequency(frequency, sample_rate)?;
        if channels == 0 || channels > MAX_GENERATOR_CHANNELS {
            return Err(ShiftError::InvalidArgument("channel count must be in 1..=8"));
        }
        if !(0.0..=1.0).contains(&amplitude) {
            return Err(ShiftError::InvalidArgument("amplitude must be in [0, 1]"));
        }
        Ok(Self {
            frequency,
            sample_rate,
            channels,
            amplitude,
            phase: 0.0,
            phase_increment: TAU * frequency / sample_rate as f64,
        })
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Restarts the tone at phase 0.
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    /// Changes the frequency while keeping the current phase.
    pub fn set_frequency(&mut self, frequency: f64) -> Result<(), ShiftError> {
        validate_frequency(frequency, self.sample_rate)?;
        self.frequency = frequency;
        self.phase_increment = TAU * frequency / self.sample_rate as f64;
        Ok(())
    }

    /// Generates `frames` interleaved float frames.
    pub fn generate_float(&mut self, frames: usize) -> Vec<f32> {
        let ch = self.channels as usize;
        let mut out = Vec::with_capacity(frames * ch);
        for _ in 0..frames {
            let value = self.amplitude * self.phase.sin() as f32;
            out.extend(std::iter::repeat(value).take(ch));
            self.advance();
        }
        out
    }

    /// Generates `frames` interleaved 16-bit frames, scaled by 32767.
    pub fn generate_pcm16(&mut self, frames: usize) -> Vec<i16> {
        self.generate_float(frames)
            .into_iter()
            .map(|s| (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
            .collect()
    }

    #[inline]
    fn advance(&mut self) {
        self.phase += self.phase_increment;
        if self.phase > PI {
            self.phase -= TAU;
        }
    }
}

fn validate_frequency(frequency: f64, sample_rate: u32) -> Result<(), ShiftError> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(ShiftError::InvalidArgument("frequency must be positive"));
    }
    if frequency >= sample_rate as f64 / 2.0 {
        return Err(ShiftError::InvalidArgument("frequency must be below Nyquist"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::frequency::rms_energy;

    #[test]
    fn test_rejects_invalid_construction() {
        assert!(SineGenerator::new(0.0, 48000, 1, 0.5).is_err());
        assert!(SineGenerator::new(-1.0, 48000, 1, 0.5).is_err());
        assert!(SineGenerator::new(24000.0, 48000, 1, 0.5).is_err());
        assert!(SineGenerator::new(440.0, 0, 1, 0.5).is_err());
        assert!(SineGenerator::new(440.0, 48000, 0, 0.5).is_err());
        assert!(SineGenerator::new(440.0, 48000, 9, 0.5).is_err());
        assert!(SineGenerator::new(440.0, 48000, 1, 1.5).is_err());
        assert!(SineGenerator::new(440.0, 48000, 1, -0.1).is_err());
        assert!(SineGenerator::new(440.0, 48000, 8, 1.0).is_ok());
    }

    #[test]
    fn test_lengths() {
        let mut g = SineGenerator::new(440.0, 48000, 2, 0.5).unwrap();
        assert_eq!(g.generate_float(480).len(), 960);
        assert_eq!(g.generate_pcm16(480).len(), 960);
        assert!(g.generate_float(0).is_empty());
    }

    #[test]
    fn test_rms_matches_amplitude() {
        let mut g = SineGenerator::new(1000.0, 48000, 1, 0.5).unwrap();
        let tone = g.generate_float(48000);
        let expected = 0.5 / 2f64.sqrt();
        assert!((rms_energy(&tone) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_phase_stays_bounded() {
        let mut g = SineGenerator::new(17_000.0, 48000, 1, 1.0).unwrap();
        g.generate_float(100_000);
        assert!(g.phase > -PI && g.phase <= PI);
    }

    #[test]
    fn test_reset_phase_restarts() {
        let mut g = SineGenerator::new(440.0, 48000, 1, 0.8).unwrap();
        let first = g.generate_float(64);
        g.generate_float(100);
        g.reset_phase();
        assert_eq!(g.generate_float(64), first);
    }

    #[test]
    fn test_set_frequency_keeps_phase() {
        let mut g = SineGenerator::new(440.0, 48000, 1, 1.0).unwrap();
        g.generate_float(10);
        let phase = g.phase;
        g.set_frequency(880.0).unwrap();
        assert_eq!(g.phase, phase);
        assert_eq!(g.frequency(), 880.0);
        assert!(g.set_frequency(30_000.0).is_err());
        assert_eq!(g.frequency(), 880.0);
    }

    #[test]
    fn test_pcm16_uses_full_scale() {
        let mut g = SineGenerator::new(12_000.0, 48000, 1, 1.0).unwrap();
        // Quarter-period steps hit the crest exactly.
        let pcm = g.generate_pcm16(4);
        assert_eq!(pcm[0], 0);
        assert_eq!(pcm[1], i16::MAX);
        assert_eq!(pcm[3], -i16::MAX);
    }
}
