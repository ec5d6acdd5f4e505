//! Streaming WSOLA (Waveform Similarity Overlap-Add) time stretching.

use crate::core::ring_buffer::RingBuffer;
use crate::core::window::fill_hann;
use crate::error::ShiftError;
use crate::stretch::params::WsolaLayout;

/// Allocates a zeroed vector, reporting failure instead of aborting.
pub(crate) fn try_zeroed(len: usize) -> Result<Vec<f32>, ShiftError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, 0.0);
    Ok(v)
}

/// Streaming WSOLA stage.
///
/// Buffers interleaved input and, once enough frames are queued, emits
/// sequences of `sequence - overlap` frames while advancing the input by
/// `nominal_skip` frames per sequence. Each sequence starts at the offset
/// inside the seek window whose waveform best matches the tail left over
/// from the previous sequence, and is cross-faded into that tail.
#[derive(Debug, Clone)]
pub struct Wsola {
    channels: usize,
    layout: WsolaLayout,
    input: RingBuffer<f32>,
    window: Vec<f32>,
    tail: Vec<f32>,
    reference: Vec<f32>,
    taper: Vec<f32>,
    skip_fract: f64,
}

impl Wsola {
    /// Creates a WSOLA stage whose input ring holds `input_capacity` frames
    /// on top of the frames required to run one sequence.
    pub fn try_new(
        channels: usize,
        layout: WsolaLayout,
        input_capacity: usize,
    ) -> Result<Self, ShiftError> {
        if channels == 0 {
            return Err(ShiftError::InvalidArgument("channel count must be non-zero"));
        }
        let required = layout.required_input();
        let mut taper = try_zeroed(layout.overlap)?;
        fill_hann(&mut taper);
        Ok(Self {
            channels,
            layout,
            input: RingBuffer::try_with_capacity((required + input_capacity) * channels)?,
            window: try_zeroed(required * channels)?,
            tail: try_zeroed(layout.overlap * channels)?,
            reference: try_zeroed(layout.overlap * channels)?,
            taper,
            skip_fract: 0.0,
        })
    }

    /// Frame counts this stage runs with.
    #[inline]
    pub fn layout(&self) -> &WsolaLayout {
        &self.layout
    }

    /// Frames currently queued in the input ring.
    #[inline]
    pub fn input_frames(&self) -> usize {
        self.input.len() / self.channels
    }

    /// Frames that can be pushed before the input ring is full.
    #[inline]
    pub fn free_frames(&self) -> usize {
        self.input.available() / self.channels
    }

    /// True when a full sequence plus its seek window is queued.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.input_frames() >= self.layout.required_input()
    }

    /// Queues as many whole frames of `samples` as fit.
    ///
    /// Returns the number of samples (not frames) consumed.
    pub fn push(&mut self, samples: &[f32]) -> usize {
        let frames = (samples.len() / self.channels).min(self.free_frames());
        self.input.push_slice(&samples[..frames * self.channels])
    }

    /// Queues up to `frames` frames of silence. Returns the frames queued.
    pub fn push_silence(&mut self, frames: usize) -> usize {
        let frames = frames.min(self.free_frames());
        self.input.push_default(frames * self.channels) / self.channels
    }

    /// Drops all queued input and the retained tail.
    pub fn clear(&mut self) {
        self.input.clear();
        self.tail.fill(0.0);
        self.skip_fract = 0.0;
    }

    /// Runs one sequence, writing `layout().output_frames()` frames to `out`.
    ///
    /// Returns the number of frames written, or 0 when not enough input is
    /// queued or `out` is too small.
    pub fn process_sequence(&mut self, out: &mut [f32]) -> usize {
        let ch = self.channels;
        let WsolaLayout {
            sequence, overlap, ..
        } = self.layout;
        let out_frames = self.layout.output_frames();
        if !self.is_ready() || out.len() < out_frames * ch {
            return 0;
        }

        self.input.peek_slice(&mut self.window);

        for (i, w) in self.taper.iter().enumerate() {
            for c in 0..ch {
                self.reference[i * ch + c] = self.tail[i * ch + c] * w;
            }
        }
        let offset = find_best_offset(
            &self.reference,
            &self.window,
            ch,
            self.layout.seek_window,
        );

        let block = &self.window[offset * ch..(offset + sequence) * ch];
        cross_fade(&self.tail, &block[..overlap * ch], &mut out[..overlap * ch], ch);
        out[overlap * ch..out_frames * ch].copy_from_slice(&block[overlap * ch..out_frames * ch]);
        self.tail.copy_from_slice(&block[out_frames * ch..]);

        self.skip_fract += self.layout.nominal_skip;
        let skip = self.skip_fract as usize;
        self.skip_fract -= skip as f64;
        self.input.discard(skip * ch);

        out_frames
    }
}

/// Returns the offset in `0..seek_window` whose region of `window` has the
/// greatest dot product with `reference`. Ties go to the lower offset, so a
/// silent reference selects offset 0.
fn find_best_offset(reference: &[f32], window: &[f32], channels: usize, seek_window: usize) -> usize {
    let len = reference.len();
    let candidates = seek_window.min(window.len().saturating_sub(len) / channels + 1);
    let mut best_offset = 0;
    let mut best_corr = f64::NEG_INFINITY;
    for offset in 0..candidates {
        let start = offset * channels;
        let corr = dot(reference, &window[start..start + len]);
        if corr > best_corr {
            best_corr = corr;
            best_offset = offset;
        }
    }
    best_offset
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f64 {
    let sum: f32 = a.iter().zip(b).map(|(&x, &y)| x * y).sum();
    sum as f64
}

/// Linearly fades `history` out while fading `incoming` in, per channel.
fn cross_fade(history: &[f32], incoming: &[f32], out: &mut [f32], channels: usize) {
    let frames = out.len() / channels;
    let step = 1.0 / frames as f32;
    for i in 0..frames {
        let fade_in = i as f32 * step;
        let fade_out = 1.0 - fade_in;
        for c in 0..channels {
            let idx = i * channels + c;
            out[idx] = history[idx] * fade_out + incoming[idx] * fade_in;
        }
    }
}
