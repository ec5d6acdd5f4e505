//! The effect instance behind every host handle.

use std::time::Instant;

use log::{debug, info, warn};

use crate::core::pcm::{float_slice_to_pcm16, pcm16_slice_to_float};
use crate::core::types::{ratio_to_semitones, ShiftParams, MIN_PITCH_RATIO};
use crate::effect::abi::{
    channel_count_from_mask, EffectConfig, EffectDescriptor, EffectInterface,
    AUDIO_CHANNEL_OUT_STEREO, AUDIO_FORMAT_PCM_16_BIT, EFFECT_DESCRIPTOR,
};
use crate::effect::command::{Command, Reply};
use crate::effect::stats::ProcessStats;
use crate::error::ShiftError;
use crate::stream::StreamProcessor;
use crate::stretch::wsola::try_zeroed;

/// Lifecycle state of an instance. Release is not a state; the instance is
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    Allocated,
    Configured,
    Enabled,
    Disabled,
}

/// One effect instance.
///
/// The host casts the handle to `effect_interface_s **` and calls through
/// the first word, so `interface` must stay the first field of this
/// `#[repr(C)]` struct.
#[repr(C)]
pub struct EffectInstance {
    interface: &'static EffectInterface,
    state: EffectState,
    config: EffectConfig,
    pitch_semitones: f32,
    kernel: StreamProcessor,
    scratch: Vec<f32>,
    stats: ProcessStats,
}

const _: () = assert!(std::mem::offset_of!(EffectInstance, interface) == 0);
const _: () = assert!(
    std::mem::size_of::<&'static EffectInterface>() == std::mem::size_of::<*const ()>()
);

impl EffectInstance {
    /// Allocates an instance in the `Allocated` state, preconfigured for
    /// 48 kHz stereo at the 432 Hz offset.
    ///
    /// # Errors
    /// `OutOfMemory` when the kernel or scratch storage cannot be allocated.
    pub fn new() -> Result<Box<Self>, ShiftError> {
        let params = ShiftParams::default();
        let kernel = StreamProcessor::new(params)?;
        let scratch = try_zeroed(crate::MAX_FRAMES * crate::MAX_CHANNELS)?;
        Ok(Box::new(Self {
            interface: &crate::ffi::EFFECT_INTERFACE,
            state: EffectState::Allocated,
            config: EffectConfig::pcm16(params.sample_rate, AUDIO_CHANNEL_OUT_STEREO),
            pitch_semitones: crate::PITCH_SEMITONES_432_HZ,
            kernel,
            scratch,
            stats: ProcessStats::default(),
        }))
    }

    /// Dispatch table this instance publishes to the host.
    pub fn interface(&self) -> &'static EffectInterface {
        self.interface
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == EffectState::Enabled
    }

    /// Configuration last accepted by SET_CONFIG.
    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    /// Interleaved channel count of the configured stream.
    pub fn channels(&self) -> usize {
        self.kernel.channels()
    }

    pub fn pitch_semitones(&self) -> f32 {
        self.pitch_semitones
    }

    pub fn stats(&self) -> ProcessStats {
        self.stats
    }

    /// The pitch-shift kernel, for inspection.
    pub fn kernel(&self) -> &StreamProcessor {
        &self.kernel
    }

    pub fn descriptor(&self) -> EffectDescriptor {
        EFFECT_DESCRIPTOR
    }

    /// Validates `config` and reconfigures the kernel for it.
    ///
    /// # Errors
    /// `InvalidArgument` for an unsupported sample rate, channel count or
    /// sample format. Nothing changes on error.
    pub fn set_config(&mut self, config: EffectConfig) -> Result<(), ShiftError> {
        let input = &config.input_cfg;
        let sample_rate = input.sampling_rate;
        let channels = channel_count_from_mask(input.channels);
        if !crate::SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            warn!("rejecting config with sample rate {sample_rate}");
            return Err(ShiftError::InvalidArgument("unsupported sample rate"));
        }
        if channels == 0 || channels as usize > crate::MAX_CHANNELS {
            warn!("rejecting config with channel mask {:#x}", input.channels);
            return Err(ShiftError::InvalidArgument("channel count must be 1 or 2"));
        }
        if input.format != AUDIO_FORMAT_PCM_16_BIT {
            warn!("rejecting config with format {:#x}", input.format);
            return Err(ShiftError::InvalidArgument("format must be 16-bit PCM"));
        }

        self.kernel.apply(ShiftParams {
            sample_rate,
            channels: channels as u16,
            pitch_semitones: self.pitch_semitones as f64,
            ..*self.kernel.params()
        })?;
        self.kernel.clear();
        self.config = config;
        if self.state != EffectState::Enabled {
            self.state = EffectState::Configured;
        }
        info!("config: {sample_rate} Hz, {channels} ch");
        Ok(())
    }

    /// Starts pitch shifting on the next `process` call.
    ///
    /// # Errors
    /// `InvalidArgument` before the first successful SET_CONFIG.
    pub fn enable(&mut self) -> Result<(), ShiftError> {
        if self.state == EffectState::Allocated {
            return Err(ShiftError::InvalidArgument("effect is not configured"));
        }
        self.state = EffectState::Enabled;
        info!("enabled: 440 Hz -> 432 Hz active");
        Ok(())
    }

    /// Switches to pass-through and clears the kernel, so the next enable
    /// starts from silence.
    pub fn disable(&mut self) {
        if self.state == EffectState::Enabled {
            self.state = EffectState::Disabled;
        }
        self.kernel.clear();
        info!("disabled: pass-through");
    }

    /// Clears the kernel and zeroes the statistics.
    pub fn reset(&mut self) {
        self.kernel.clear();
        self.stats.reset();
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Sets the pitch as a frequency ratio in `[0.25, 2]`.
    ///
    /// # Errors
    /// `InvalidArgument` for a ratio outside `[0.25, 2]` or not finite. The
    /// reported pitch is always the one the kernel runs at.
    pub fn set_pitch_ratio(&mut self, ratio: f32) -> Result<(), ShiftError> {
        if !(ratio as f64 >= MIN_PITCH_RATIO && ratio <= 2.0) {
            warn!("rejecting pitch ratio {ratio}");
            return Err(ShiftError::InvalidArgument("pitch ratio must be in [0.25, 2]"));
        }
        let semitones = ratio_to_semitones(ratio as f64);
        self.kernel.set_pitch_semitones(semitones)?;
        self.pitch_semitones = semitones as f32;
        debug!("pitch ratio {ratio:.6} -> {semitones:.4} semitones");
        Ok(())
    }

    /// Runs one decoded command.
    ///
    /// # Errors
    /// Whatever the command's operation reports. A failed command leaves
    /// the instance unchanged.
    pub fn execute(&mut self, command: Command) -> Result<Reply, ShiftError> {
        let reply = match command {
            Command::Init => Reply::Status(0),
            Command::SetConfig(config) => {
                self.set_config(config)?;
                Reply::Status(0)
            }
            Command::GetConfig => Reply::Config(self.config),
            Command::Reset => {
                self.reset();
                Reply::None
            }
            Command::Enable => {
                self.enable()?;
                Reply::Status(0)
            }
            Command::Disable => {
                self.disable();
                Reply::Status(0)
            }
            Command::GetDescriptor => Reply::Descriptor(self.descriptor()),
            Command::SetPitchRatio(ratio) => {
                self.set_pitch_ratio(ratio)?;
                Reply::Status(0)
            }
            Command::GetLatencyMs => Reply::Float(self.stats.last_latency_ms),
            Command::GetCpuUsage => Reply::Float(self.stats.last_cpu_percent),
            Command::ResetStats => {
                self.reset_stats();
                Reply::None
            }
            Command::GetTotalFrames => Reply::Count(self.stats.total_frames),
            Command::GetPitchSemitones => Reply::Float(self.pitch_semitones),
            Command::GetKernelLatencyMs => Reply::Float(self.kernel.latency_ms() as f32),
            Command::GetFramesDropped => Reply::Count(self.stats.frames_dropped),
        };
        Ok(reply)
    }

    /// Processes interleaved 16-bit frames from `input` into `output`.
    ///
    /// While not enabled the input is copied unchanged. Only whole frames
    /// of `input` are processed.
    ///
    /// # Errors
    /// `InvalidArgument` when `output` is shorter than `input`, or when
    /// enabled and the frame count is outside `1..=MAX_FRAMES`.
    pub fn process(&mut self, input: &[i16], output: &mut [i16]) -> Result<(), ShiftError> {
        if output.len() < input.len() {
            return Err(ShiftError::InvalidArgument("output buffer shorter than input"));
        }
        if !self.is_enabled() {
            output[..input.len()].copy_from_slice(input);
            return Ok(());
        }
        let frames = self.check_frames(input.len())?;
        let samples = frames * self.channels();
        let start = Instant::now();
        pcm16_slice_to_float(&input[..samples], &mut self.scratch[..samples]);
        let dropped = self.run_kernel(frames);
        float_slice_to_pcm16(&self.scratch[..samples], &mut output[..samples]);
        let sample_rate = self.kernel.params().sample_rate;
        self.stats.record(frames, dropped, sample_rate, start.elapsed());
        Ok(())
    }

    /// Processes interleaved 16-bit frames in place.
    ///
    /// # Errors
    /// As [`process`](Self::process).
    pub fn process_in_place(&mut self, buffer: &mut [i16]) -> Result<(), ShiftError> {
        if !self.is_enabled() {
            return Ok(());
        }
        let frames = self.check_frames(buffer.len())?;
        let samples = frames * self.channels();
        let start = Instant::now();
        pcm16_slice_to_float(&buffer[..samples], &mut self.scratch[..samples]);
        let dropped = self.run_kernel(frames);
        float_slice_to_pcm16(&self.scratch[..samples], &mut buffer[..samples]);
        let sample_rate = self.kernel.params().sample_rate;
        self.stats.record(frames, dropped, sample_rate, start.elapsed());
        Ok(())
    }

    fn check_frames(&self, samples: usize) -> Result<usize, ShiftError> {
        let frames = samples / self.channels();
        if frames == 0 || frames > crate::MAX_FRAMES {
            warn!("process: unexpected frame count {frames}");
            return Err(ShiftError::InvalidArgument("frame count out of range"));
        }
        Ok(frames)
    }

    /// Pushes `frames` frames of scratch through the kernel and replaces
    /// them with the same number of output frames, zero-filling any
    /// shortfall. Returns the number of zero-filled frames.
    fn run_kernel(&mut self, frames: usize) -> usize {
        let ch = self.channels();
        let block = &mut self.scratch[..frames * ch];
        self.kernel.put_samples(block);
        let received = self.kernel.receive_samples(block);
        block[received * ch..].fill(0.0);
        frames - received
    }
}

impl std::fmt::Debug for EffectInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectInstance")
            .field("state", &self.state)
            .field("pitch_semitones", &self.pitch_semitones)
            .field("channels", &self.channels())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
