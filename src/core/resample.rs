//! Streaming cubic resampler used to transpose pitch after time stretching.

use crate::core::ring_buffer::RingBuffer;
use crate::error::ShiftError;

/// Frames of context kept before the read position (one for the Hermite
/// kernel's left tap).
const LEFT_CONTEXT: usize = 1;

/// Frames that must exist after the integer read position (two right taps).
const RIGHT_CONTEXT: usize = 2;

/// Streaming 4-point Hermite resampler over interleaved frames.
///
/// Reads its input at `rate` frames per output frame, so a rate above 1.0
/// raises pitch and shortens the stream while a rate below 1.0 lowers pitch
/// and lengthens it. The interpolation position carries across calls, which
/// keeps block boundaries inaudible.
#[derive(Debug, Clone)]
pub struct RateTransposer {
    channels: usize,
    rate: f64,
    position: f64,
    history: Vec<f32>,
    frames: usize,
}

impl RateTransposer {
    /// Creates a transposer able to accept up to `max_block_frames` input
    /// frames per [`process`](Self::process) call.
    pub fn try_new(channels: usize, rate: f64, max_block_frames: usize) -> Result<Self, ShiftError> {
        if channels == 0 || channels > crate::MAX_CHANNELS {
            return Err(ShiftError::InvalidArgument("unsupported channel count"));
        }
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ShiftError::InvalidArgument("resampling rate must be positive"));
        }
        let capacity = (max_block_frames + LEFT_CONTEXT + RIGHT_CONTEXT + 1) * channels;
        let mut history = Vec::new();
        history.try_reserve_exact(capacity)?;
        history.resize(capacity, 0.0);
        let mut transposer = Self {
            channels,
            rate,
            position: 0.0,
            history,
            frames: 0,
        };
        transposer.reset();
        Ok(transposer)
    }

    /// Input frames consumed per output frame.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Largest input block accepted by a single call.
    pub fn max_block_frames(&self) -> usize {
        (self.history.len() / self.channels.max(1)).saturating_sub(LEFT_CONTEXT + RIGHT_CONTEXT + 1)
    }

    /// Upper bound on frames produced from `input_frames` new input frames.
    pub fn max_output_frames(&self, input_frames: usize) -> usize {
        ((input_frames + LEFT_CONTEXT + RIGHT_CONTEXT) as f64 / self.rate).ceil() as usize + 1
    }

    /// Drops buffered context and restarts with one frame of silence before
    /// the first input frame.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.frames = LEFT_CONTEXT;
        self.position = LEFT_CONTEXT as f64;
    }

    /// Resamples `input` (interleaved, whole frames) and appends the result
    /// to `output`.
    ///
    /// Returns the number of frames written. Output that does not fit in
    /// `output` is dropped, so callers size the ring with
    /// [`max_output_frames`](Self::max_output_frames).
    pub fn process(&mut self, input: &[f32], output: &mut RingBuffer<f32>) -> usize {
        let ch = self.channels;
        let in_frames = (input.len() / ch).min(self.max_block_frames());
        let start = self.frames * ch;
        self.history[start..start + in_frames * ch].copy_from_slice(&input[..in_frames * ch]);
        self.frames += in_frames;

        let mut written = 0;
        let mut frame = [0.0f32; crate::MAX_CHANNELS];
        loop {
            let idx = self.position as usize;
            if idx + RIGHT_CONTEXT >= self.frames {
                break;
            }
            let frac = (self.position - idx as f64) as f32;
            for (c, out) in frame.iter_mut().enumerate().take(ch) {
                let s0 = self.history[(idx - LEFT_CONTEXT) * ch + c];
                let s1 = self.history[idx * ch + c];
                let s2 = self.history[(idx + 1) * ch + c];
                let s3 = self.history[(idx + 2) * ch + c];

                // Hermite interpolation
                let c0 = s1;
                let c1 = 0.5 * (s2 - s0);
                let c2 = s0 - 2.5 * s1 + 2.0 * s2 - 0.5 * s3;
                let c3 = 0.5 * (s3 - s0) + 1.5 * (s1 - s2);

                *out = ((c3 * frac + c2) * frac + c1) * frac + c0;
            }
            if output.push_slice(&frame[..ch]) == ch {
                written += 1;
            }
            self.position += self.rate;
        }

        // Keep only the frames the next read position still needs.
        let keep_from = (self.position as usize)
            .saturating_sub(LEFT_CONTEXT)
            .min(self.frames);
        self.history.copy_within(keep_from * ch..self.frames * ch, 0);
        self.frames -= keep_from;
        self.position -= keep_from as f64;
        written
    }
}
