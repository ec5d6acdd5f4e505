#![deny(unsafe_op_in_unsafe_fn)]
//! Real-time 440 Hz to 432 Hz retuning as an Android audio effect.
//!
//! `audioshift` lowers the pitch of a PCM stream by `432 / 440` (about a
//! third of a semitone) without changing its duration. A streaming WSOLA
//! stage stretches the audio by the inverse ratio, a cubic transposer then
//! resamples it back, and the effect wraps both behind the C ABI the Android
//! effect framework loads from a shared library.
//!
//! # Quick Start
//!
//! ```
//! use audioshift::{ShiftParams, StreamProcessor};
//!
//! // 100 ms of stereo 440 Hz at 48 kHz
//! let input: Vec<f32> = (0..4800)
//!     .flat_map(|i| {
//!         let s = 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin();
//!         [s, s]
//!     })
//!     .collect();
//!
//! let mut kernel = StreamProcessor::new(ShiftParams::default()).unwrap();
//! let mut output = vec![0.0f32; input.len()];
//! kernel.put_samples(&input);
//! let frames = kernel.receive_samples(&mut output);
//! assert_eq!(frames, 4800);
//! ```
//!
//! # Effect
//!
//! The host drives [`EffectInstance`] through the exported `AELI` library
//! descriptor and the `Effect*` entry points in [`ffi`]. The same instance can
//! be driven directly from Rust:
//!
//! ```
//! use audioshift::effect::abi::{EffectConfig, AUDIO_CHANNEL_OUT_STEREO};
//! use audioshift::EffectInstance;
//!
//! let mut fx = EffectInstance::new().unwrap();
//! fx.set_config(EffectConfig::pcm16(48000, AUDIO_CHANNEL_OUT_STEREO)).unwrap();
//! fx.enable().unwrap();
//!
//! let input = vec![0i16; 480 * 2];
//! let mut output = vec![0i16; 480 * 2];
//! fx.process(&input, &mut output).unwrap();
//! assert_eq!(fx.stats().total_frames, 480);
//! ```

pub mod analysis;
pub mod core;
pub mod effect;
pub mod error;
pub mod ffi;
pub mod stream;
pub mod stretch;

pub use analysis::SineGenerator;
pub use core::types::{ratio_to_semitones, semitones_to_ratio, Sample, ShiftParams};
pub use effect::{EffectInstance, EffectState, ProcessStats};
pub use error::ShiftError;
pub use stream::StreamProcessor;
pub use stretch::WsolaParams;

/// Frequency ratio that moves A4 from 440 Hz to 432 Hz.
pub const PITCH_RATIO_432_HZ: f32 = 432.0 / 440.0;

/// `12 * log2(432 / 440)`, the same shift in semitones.
pub const PITCH_SEMITONES_432_HZ: f32 = -0.317_667;

/// Largest host buffer, in frames, the effect processes in one call.
pub const MAX_FRAMES: usize = 8192;

/// Largest supported channel count.
pub const MAX_CHANNELS: usize = 2;

/// Sample rates accepted by SET_CONFIG.
pub const SUPPORTED_SAMPLE_RATES: [u32; 4] = [22050, 44100, 48000, 96000];

pub const DEFAULT_SAMPLE_RATE: u32 = 48000;
pub const DEFAULT_CHANNELS: u16 = 2;
