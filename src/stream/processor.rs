use log::{debug, warn};

use crate::core::resample::RateTransposer;
use crate::core::ring_buffer::RingBuffer;
use crate::core::types::ShiftParams;
use crate::error::ShiftError;
use crate::stretch::params::{WsolaLayout, WsolaParams};
use crate::stretch::wsola::{try_zeroed, Wsola};

/// Extra input frames the WSOLA ring accepts beyond one sequence window.
const INPUT_CHUNK_FRAMES: usize = 1024;

/// Frames of priming beyond the WSOLA requirement, covering the
/// transposer's interpolation context at the lowest supported pitch ratio.
const PRIMING_MARGIN_FRAMES: usize = 16;

/// Streaming pitch shifter.
///
/// A WSOLA stage first stretches the stream by `1 / pitch_ratio` without
/// changing pitch, then a cubic transposer resamples it by `pitch_ratio`,
/// which restores the original duration and moves every frequency by the
/// pitch ratio. Output frames therefore track input frames one for one.
///
/// After [`clear`](Self::clear) the next [`put_samples`](Self::put_samples)
/// primes the stages with [`latency_frames`](Self::latency_frames) frames of
/// silence. From then on a caller that puts and receives equal block sizes
/// always finds a full block waiting.
#[derive(Debug, Clone)]
pub struct StreamProcessor {
    params: ShiftParams,
    max_block_frames: usize,
    wsola: Wsola,
    transposer: RateTransposer,
    stretched: Vec<f32>,
    output: RingBuffer<f32>,
    priming_frames: usize,
    pending_priming: usize,
}

impl StreamProcessor {
    /// Creates a processor sized for blocks of up to [`crate::MAX_FRAMES`]
    /// frames.
    ///
    /// # Errors
    /// `InvalidArgument` for invalid parameters, `OutOfMemory` when the
    /// stage buffers cannot be allocated.
    pub fn new(params: ShiftParams) -> Result<Self, ShiftError> {
        Self::with_max_block(params, crate::MAX_FRAMES)
    }

    /// Creates a processor sized for blocks of up to `max_block_frames`.
    pub fn with_max_block(params: ShiftParams, max_block_frames: usize) -> Result<Self, ShiftError> {
        params.validate()?;
        let channels = params.channels as usize;
        let layout = WsolaLayout::new(&params.tuning, params.sample_rate, params.stretch_tempo());
        let wsola = Wsola::try_new(channels, layout, INPUT_CHUNK_FRAMES)?;
        let transposer =
            RateTransposer::try_new(channels, params.transpose_rate(), layout.output_frames())?;
        let priming_frames = layout.required_input() + PRIMING_MARGIN_FRAMES;
        let output_frames = priming_frames
            + max_block_frames
            + transposer.max_output_frames(layout.output_frames())
            + PRIMING_MARGIN_FRAMES;

        debug!(
            "pitch shifter: {} Hz, {} ch, {:.4} semitones, sequence {} / seek {} / overlap {} frames",
            params.sample_rate,
            channels,
            params.pitch_semitones,
            layout.sequence,
            layout.seek_window,
            layout.overlap
        );

        Ok(Self {
            params,
            max_block_frames,
            wsola,
            transposer,
            stretched: try_zeroed(layout.output_frames() * channels)?,
            output: RingBuffer::try_with_capacity(output_frames * channels)?,
            priming_frames,
            pending_priming: priming_frames,
        })
    }

    /// Current parameters.
    pub fn params(&self) -> &ShiftParams {
        &self.params
    }

    /// Number of interleaved channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.params.channels as usize
    }

    /// Pitch ratio in effect.
    pub fn pitch_ratio(&self) -> f64 {
        self.params.pitch_ratio()
    }

    /// WSOLA frame counts in effect.
    pub fn layout(&self) -> &WsolaLayout {
        self.wsola.layout()
    }

    /// Frames of delay between input and output.
    pub fn latency_frames(&self) -> usize {
        self.priming_frames
    }

    /// Delay between input and output in milliseconds.
    pub fn latency_ms(&self) -> f64 {
        self.priming_frames as f64 * 1000.0 / self.params.sample_rate as f64
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), ShiftError> {
        self.apply(ShiftParams {
            sample_rate,
            ..self.params
        })
    }

    pub fn set_channels(&mut self, channels: u16) -> Result<(), ShiftError> {
        self.apply(ShiftParams {
            channels,
            ..self.params
        })
    }

    pub fn set_pitch_semitones(&mut self, pitch_semitones: f64) -> Result<(), ShiftError> {
        self.apply(ShiftParams {
            pitch_semitones,
            ..self.params
        })
    }

    pub fn set_tempo(&mut self, tempo: f64) -> Result<(), ShiftError> {
        self.apply(ShiftParams {
            tempo,
            ..self.params
        })
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<(), ShiftError> {
        self.apply(ShiftParams { rate, ..self.params })
    }

    pub fn set_tuning(
        &mut self,
        sequence_ms: f64,
        seekwindow_ms: f64,
        overlap_ms: f64,
    ) -> Result<(), ShiftError> {
        let tuning = WsolaParams {
            sequence_ms,
            seekwindow_ms,
            overlap_ms,
        };
        self.apply(ShiftParams {
            tuning,
            ..self.params
        })
    }

    /// Replaces the parameters. Any change rebuilds the stages, which leaves
    /// the processor cleared. On error nothing changes.
    pub fn apply(&mut self, params: ShiftParams) -> Result<(), ShiftError> {
        params.validate()?;
        if params == self.params {
            return Ok(());
        }
        *self = Self::with_max_block(params, self.max_block_frames)?;
        Ok(())
    }

    /// Appends interleaved samples and runs every sequence that becomes
    /// ready. A trailing partial frame is ignored.
    pub fn put_samples(&mut self, samples: &[f32]) {
        self.prime();
        let ch = self.channels();
        let mut remaining = &samples[..samples.len() / ch * ch];
        while !remaining.is_empty() {
            let used = self.wsola.push(remaining);
            remaining = &remaining[used..];
            let ran = self.run_sequences();
            if used == 0 && ran == 0 {
                break;
            }
        }
    }

    /// Moves up to `out.len() / channels` processed frames into `out`.
    ///
    /// Returns the number of frames moved.
    pub fn receive_samples(&mut self, out: &mut [f32]) -> usize {
        let ch = self.channels();
        let frames = (out.len() / ch).min(self.num_frames());
        self.output.pop_slice(&mut out[..frames * ch]) / ch
    }

    /// Processed samples waiting in the output ring (frames × channels).
    pub fn num_samples(&self) -> usize {
        self.output.len()
    }

    /// Processed frames waiting in the output ring.
    pub fn num_frames(&self) -> usize {
        self.output.len() / self.channels()
    }

    /// Drops all buffered audio. The next `put_samples` primes again.
    pub fn clear(&mut self) {
        self.wsola.clear();
        self.transposer.reset();
        self.output.clear();
        self.pending_priming = self.priming_frames;
    }

    /// Pushes silence until every frame put so far has reached the output
    /// ring. Used at end of stream; the output then ends with silence.
    pub fn flush(&mut self) {
        self.prime();
        let layout = *self.wsola.layout();
        let mut silence = layout.required_input() + layout.sequence;
        while silence > 0 {
            let pushed = self.wsola.push_silence(silence);
            silence -= pushed;
            let ran = self.run_sequences();
            if pushed == 0 && ran == 0 {
                break;
            }
        }
    }

    fn prime(&mut self) {
        while self.pending_priming > 0 {
            let pushed = self.wsola.push_silence(self.pending_priming);
            self.pending_priming -= pushed;
            let ran = self.run_sequences();
            if pushed == 0 && ran == 0 {
                break;
            }
        }
    }

    /// Runs every ready WSOLA sequence through the transposer. Returns the
    /// number of sequences run.
    fn run_sequences(&mut self) -> usize {
        let ch = self.channels();
        let mut ran = 0;
        while self.wsola.is_ready() {
            let frames = self.wsola.process_sequence(&mut self.stretched);
            if frames == 0 {
                break;
            }
            let needed = self.transposer.max_output_frames(frames) * ch;
            if self.output.available() < needed {
                // Only reached when the caller stops draining the output.
                let grown = self.output.len() + needed + self.max_block_frames * ch;
                if let Err(err) = self.output.grow(grown) {
                    warn!("pitch shifter output ring could not grow: {err}");
                }
            }
            self.transposer.process(&self.stretched[..frames * ch], &mut self.output);
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn stereo_sine(freq: f32, sample_rate: u32, frames: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let s = 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin();
            out.push(s);
            out.push(s);
        }
        out
    }

    #[test]
    fn test_default_latency_at_48k() {
        let p = StreamProcessor::new(ShiftParams::default()).unwrap();
        assert_eq!(p.latency_frames(), 2640 + PRIMING_MARGIN_FRAMES);
        assert!(p.latency_ms() > 50.0 && p.latency_ms() < 60.0);
    }

    #[test]
    fn test_priming_covers_one_full_window_at_every_rate() {
        for &sr in &crate::SUPPORTED_SAMPLE_RATES {
            let p = StreamProcessor::new(ShiftParams::default().with_sample_rate(sr)).unwrap();
            let layout = *p.layout();
            assert_eq!(p.latency_frames(), layout.required_input() + PRIMING_MARGIN_FRAMES);
            assert!(layout.required_input() >= layout.sequence + layout.seek_window);
            assert!(p.latency_ms() > p.params().tuning.sequence_ms);
        }
    }

    #[test]
    fn test_full_blocks_after_first_put() {
        let mut p = StreamProcessor::new(ShiftParams::default()).unwrap();
        let input = stereo_sine(440.0, 48000, 480);
        let mut out = vec![0.0f32; 480 * 2];
        for _ in 0..200 {
            p.put_samples(&input);
            assert_eq!(p.receive_samples(&mut out), 480);
        }
    }

    #[test]
    fn test_output_tracks_input_for_odd_block_sizes() {
        for &block in &[1usize, 37, 256, 1000, 4096, 8192] {
            let mut p = StreamProcessor::new(ShiftParams::default()).unwrap();
            let input = stereo_sine(440.0, 48000, block);
            let mut out = vec![0.0f32; block * 2];
            for _ in 0..(48000 / block).max(4) {
                p.put_samples(&input);
                assert_eq!(p.receive_samples(&mut out), block, "block size {block}");
            }
        }
    }

    #[test]
    fn test_clear_empties_output() {
        let mut p = StreamProcessor::new(ShiftParams::default()).unwrap();
        p.put_samples(&stereo_sine(440.0, 48000, 4800));
        assert!(p.num_samples() > 0);
        p.clear();
        assert_eq!(p.num_samples(), 0);
        assert_eq!(p.num_frames(), 0);
    }

    #[test]
    fn test_output_starts_silent_after_clear() {
        let mut p = StreamProcessor::new(ShiftParams::default()).unwrap();
        p.put_samples(&stereo_sine(440.0, 48000, 9600));
        p.clear();
        p.put_samples(&stereo_sine(440.0, 48000, 480));
        let mut out = vec![1.0f32; 480 * 2];
        assert_eq!(p.receive_samples(&mut out), 480);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_setters_validate_and_keep_state_on_error() {
        let mut p = StreamProcessor::new(ShiftParams::default()).unwrap();
        assert!(p.set_sample_rate(0).is_err());
        assert!(p.set_channels(3).is_err());
        assert!(p.set_tempo(-1.0).is_err());
        assert!(p.set_rate(0.0).is_err());
        assert!(p.set_tuning(0.0, 15.0, 8.0).is_err());
        assert_eq!(p.params(), &ShiftParams::default());

        p.set_sample_rate(44100).unwrap();
        p.set_channels(1).unwrap();
        p.set_pitch_semitones(0.0).unwrap();
        p.set_tuning(50.0, 20.0, 10.0).unwrap();
        assert_eq!(p.channels(), 1);
        assert_eq!(p.layout().sequence, 2205);
        assert_eq!(p.pitch_ratio(), 1.0);
    }

    #[test]
    fn test_flush_emits_buffered_input() {
        let mut p = StreamProcessor::new(ShiftParams::default().with_channels(1)).unwrap();
        let input: Vec<f32> = (0..2000)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 48000.0).sin())
            .collect();
        p.put_samples(&input);
        assert!(p.num_frames() < p.latency_frames() + input.len());
        p.flush();
        assert!(p.num_frames() >= p.latency_frames() + input.len());
    }

    #[test]
    fn test_trailing_partial_frame_ignored() {
        let mut a = StreamProcessor::new(ShiftParams::default()).unwrap();
        let mut b = StreamProcessor::new(ShiftParams::default()).unwrap();
        let input = stereo_sine(440.0, 48000, 480);
        let mut odd = input.clone();
        odd.push(0.9);
        a.put_samples(&input);
        b.put_samples(&odd);
        assert_eq!(a.num_samples(), b.num_samples());
    }
}
