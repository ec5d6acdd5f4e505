//! The Android audio effect: host ABI structures, command decoding and the
//! per-handle effect instance.

pub mod abi;
pub mod command;
pub mod instance;
pub mod stats;

pub use abi::{EffectConfig, EffectDescriptor, EffectUuid, EFFECT_DESCRIPTOR};
pub use command::{Command, Reply};
pub use instance::{EffectInstance, EffectState};
pub use stats::ProcessStats;
