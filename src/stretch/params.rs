//! WSOLA tuning and the sample counts derived from it.

use crate::error::ShiftError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default sequence length in milliseconds.
pub const DEFAULT_SEQUENCE_MS: f64 = 40.0;
/// Default seek window length in milliseconds.
pub const DEFAULT_SEEKWINDOW_MS: f64 = 15.0;
/// Default overlap length in milliseconds.
pub const DEFAULT_OVERLAP_MS: f64 = 8.0;

/// WSOLA tuning expressed in milliseconds, independent of sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WsolaParams {
    /// Length of each processed sequence.
    pub sequence_ms: f64,
    /// Span searched for the best splice offset.
    pub seekwindow_ms: f64,
    /// Length of the cross-fade between consecutive sequences.
    pub overlap_ms: f64,
}

impl Default for WsolaParams {
    fn default() -> Self {
        Self {
            sequence_ms: DEFAULT_SEQUENCE_MS,
            seekwindow_ms: DEFAULT_SEEKWINDOW_MS,
            overlap_ms: DEFAULT_OVERLAP_MS,
        }
    }
}

impl WsolaParams {
    /// Set the sequence length.
    pub fn with_sequence_ms(mut self, sequence_ms: f64) -> Self {
        self.sequence_ms = sequence_ms;
        self
    }

    /// Set the seek window length.
    pub fn with_seekwindow_ms(mut self, seekwindow_ms: f64) -> Self {
        self.seekwindow_ms = seekwindow_ms;
        self
    }

    /// Set the overlap length.
    pub fn with_overlap_ms(mut self, overlap_ms: f64) -> Self {
        self.overlap_ms = overlap_ms;
        self
    }

    /// Checks that every length is finite and positive and that the overlap
    /// fits inside the sequence.
    pub fn validate(&self) -> Result<(), ShiftError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.sequence_ms) {
            return Err(ShiftError::InvalidArgument("sequence_ms must be positive"));
        }
        if !positive(self.seekwindow_ms) {
            return Err(ShiftError::InvalidArgument("seekwindow_ms must be positive"));
        }
        if !positive(self.overlap_ms) {
            return Err(ShiftError::InvalidArgument("overlap_ms must be positive"));
        }
        if self.overlap_ms * 2.0 >= self.sequence_ms {
            return Err(ShiftError::InvalidArgument(
                "overlap_ms must be shorter than half of sequence_ms",
            ));
        }
        Ok(())
    }
}

/// Frame counts derived from [`WsolaParams`] at a given sample rate and
/// stretch tempo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WsolaLayout {
    /// Frames per processed sequence.
    pub sequence: usize,
    /// Number of candidate splice offsets.
    pub seek_window: usize,
    /// Cross-fade frames.
    pub overlap: usize,
    /// Input frames advanced per sequence (fractional).
    pub nominal_skip: f64,
}

impl WsolaLayout {
    /// Derives frame counts. `tempo` is input frames consumed per output
    /// frame of the stretch stage.
    pub fn new(params: &WsolaParams, sample_rate: u32, tempo: f64) -> Self {
        let frames = |ms: f64| ((ms * sample_rate as f64 / 1000.0).round() as usize).max(1);
        let sequence = frames(params.sequence_ms).max(4);
        let overlap = frames(params.overlap_ms).min(sequence / 2).max(1);
        let seek_window = frames(params.seekwindow_ms);
        let nominal_skip = tempo * (sequence - overlap) as f64;
        Self {
            sequence,
            seek_window,
            overlap,
            nominal_skip,
        }
    }

    /// Frames emitted by each processed sequence.
    pub fn output_frames(&self) -> usize {
        self.sequence - self.overlap
    }

    /// Input frames that must be buffered before a sequence can run.
    pub fn required_input(&self) -> usize {
        let search = self.seek_window + self.sequence;
        let advance = self.nominal_skip.ceil() as usize + 1;
        search.max(advance)
    }
}
