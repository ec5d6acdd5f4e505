use crate::error::ShiftError;
use crate::stretch::params::WsolaParams;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single audio sample (32-bit float, range -1.0 to 1.0).
pub type Sample = f32;

/// Smallest pitch ratio the kernel accepts (two octaves down). The stretch
/// stage advances `1 / ratio` input frames per output frame, so the ratio
/// needs a floor.
pub const MIN_PITCH_RATIO: f64 = 0.25;
/// Largest pitch ratio the kernel accepts (two octaves up).
pub const MAX_PITCH_RATIO: f64 = 4.0;

/// Converts a semitone offset to a frequency ratio.
#[inline]
pub fn semitones_to_ratio(semitones: f64) -> f64 {
    (semitones / 12.0).exp2()
}

/// Converts a frequency ratio to a semitone offset.
#[inline]
pub fn ratio_to_semitones(ratio: f64) -> f64 {
    12.0 * ratio.log2()
}

/// Parameters of the streaming pitch shifter.
///
/// Tempo and rate stay at 1.0 inside the effect; they are kept so the kernel
/// exposes the usual pitch/tempo/rate triple.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShiftParams {
    /// Sample rate in Hz (default: 48000).
    pub sample_rate: u32,
    /// Number of interleaved channels (default: 2).
    pub channels: u16,
    /// Pitch offset in semitones (default: the 432 Hz offset).
    pub pitch_semitones: f64,
    /// Playback speed without pitch change (default: 1.0).
    pub tempo: f64,
    /// Playback speed with pitch change (default: 1.0).
    pub rate: f64,
    /// WSOLA tuning.
    pub tuning: WsolaParams,
}

impl Default for ShiftParams {
    fn default() -> Self {
        Self {
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
            channels: crate::DEFAULT_CHANNELS,
            pitch_semitones: crate::PITCH_SEMITONES_432_HZ as f64,
            tempo: 1.0,
            rate: 1.0,
            tuning: WsolaParams::default(),
        }
    }
}

impl ShiftParams {
    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the number of channels.
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Set the pitch offset in semitones.
    pub fn with_pitch_semitones(mut self, semitones: f64) -> Self {
        self.pitch_semitones = semitones;
        self
    }

    /// Set the WSOLA tuning.
    pub fn with_tuning(mut self, tuning: WsolaParams) -> Self {
        self.tuning = tuning;
        self
    }

    /// Pitch ratio applied by the kernel, `2^(semitones / 12)`.
    pub fn pitch_ratio(&self) -> f64 {
        semitones_to_ratio(self.pitch_semitones)
    }

    /// Input frames the stretch stage advances per output frame:
    /// `tempo / pitch_ratio`.
    pub fn stretch_tempo(&self) -> f64 {
        self.tempo / self.pitch_ratio()
    }

    /// Input frames the transposer reads per output frame:
    /// `rate * pitch_ratio`.
    pub fn transpose_rate(&self) -> f64 {
        self.rate * self.pitch_ratio()
    }

    /// Overall rate at which the stream is consumed relative to playback,
    /// `rate * tempo / pitch_ratio`.
    pub fn effective_rate(&self) -> f64 {
        self.rate * self.tempo / self.pitch_ratio()
    }

    /// Checks every field.
    ///
    /// # Errors
    /// Returns `ShiftError::InvalidArgument` for a zero sample rate, a channel
    /// count outside `1..=MAX_CHANNELS`, a pitch ratio outside
    /// [`MIN_PITCH_RATIO`]..=[`MAX_PITCH_RATIO`], non-positive tempo or rate,
    /// or invalid tuning.
    pub fn validate(&self) -> Result<(), ShiftError> {
        if self.sample_rate == 0 {
            return Err(ShiftError::InvalidArgument("sample rate must be non-zero"));
        }
        if self.channels == 0 || self.channels as usize > crate::MAX_CHANNELS {
            return Err(ShiftError::InvalidArgument("channel count must be 1 or 2"));
        }
        if !self.pitch_semitones.is_finite() {
            return Err(ShiftError::InvalidArgument("pitch must be finite"));
        }
        // Two octaves either way.
        let bound = ratio_to_semitones(MAX_PITCH_RATIO);
        if !(-bound..=bound).contains(&self.pitch_semitones) {
            return Err(ShiftError::InvalidArgument("pitch ratio must be within two octaves"));
        }
        if !(self.tempo.is_finite() && self.tempo > 0.0) {
            return Err(ShiftError::InvalidArgument("tempo must be positive"));
        }
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(ShiftError::InvalidArgument("rate must be positive"));
        }
        self.tuning.validate()
    }
}
