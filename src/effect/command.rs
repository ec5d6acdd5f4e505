//! Command opcodes and byte-level payload marshalling.

use std::ffi::c_void;
use std::mem::size_of;

use log::warn;

use crate::effect::abi::{EffectConfig, EffectDescriptor};
use crate::error::ShiftError;

pub const EFFECT_CMD_INIT: u32 = 0;
pub const EFFECT_CMD_SET_CONFIG: u32 = 1;
pub const EFFECT_CMD_RESET: u32 = 2;
pub const EFFECT_CMD_ENABLE: u32 = 3;
pub const EFFECT_CMD_DISABLE: u32 = 4;
pub const EFFECT_CMD_GET_CONFIG: u32 = 14;
/// Returns the effect descriptor. Numbered after the last host opcode.
pub const EFFECT_CMD_GET_DESCRIPTOR: u32 = 22;

/// First opcode of the vendor range.
pub const EFFECT_CMD_FIRST_PROPRIETARY: u32 = 0x10000;

pub const CMD_SET_ENABLED: u32 = EFFECT_CMD_FIRST_PROPRIETARY;
pub const CMD_SET_PITCH_RATIO: u32 = EFFECT_CMD_FIRST_PROPRIETARY + 1;
pub const CMD_GET_LATENCY_MS: u32 = EFFECT_CMD_FIRST_PROPRIETARY + 2;
pub const CMD_GET_CPU_USAGE: u32 = EFFECT_CMD_FIRST_PROPRIETARY + 3;
pub const CMD_RESET_STATS: u32 = EFFECT_CMD_FIRST_PROPRIETARY + 4;
pub const CMD_GET_TOTAL_FRAMES: u32 = EFFECT_CMD_FIRST_PROPRIETARY + 5;
pub const CMD_GET_PITCH_SEMITONES: u32 = EFFECT_CMD_FIRST_PROPRIETARY + 6;
pub const CMD_GET_KERNEL_LATENCY_MS: u32 = EFFECT_CMD_FIRST_PROPRIETARY + 7;
pub const CMD_GET_FRAMES_DROPPED: u32 = EFFECT_CMD_FIRST_PROPRIETARY + 8;

/// A decoded host command.
#[derive(Debug, Clone, Copy)]
pub enum Command {
    Init,
    SetConfig(EffectConfig),
    GetConfig,
    Reset,
    Enable,
    Disable,
    GetDescriptor,
    SetPitchRatio(f32),
    GetLatencyMs,
    GetCpuUsage,
    ResetStats,
    GetTotalFrames,
    GetPitchSemitones,
    GetKernelLatencyMs,
    GetFramesDropped,
}

impl Command {
    /// Decodes `code` and its input payload of `size` bytes at `data`.
    ///
    /// # Errors
    /// `InvalidArgument` for an unknown opcode, or a null or undersized
    /// payload where the opcode needs one.
    ///
    /// # Safety
    /// `data` must be null or valid for reads of `size` bytes.
    pub unsafe fn decode(code: u32, data: *const c_void, size: usize) -> Result<Self, ShiftError> {
        let command = match code {
            EFFECT_CMD_INIT => Command::Init,
            // SAFETY: caller guarantees `size` readable bytes at `data`.
            EFFECT_CMD_SET_CONFIG => Command::SetConfig(unsafe { read_payload(data, size) }?),
            EFFECT_CMD_GET_CONFIG => Command::GetConfig,
            EFFECT_CMD_RESET => Command::Reset,
            EFFECT_CMD_ENABLE | CMD_SET_ENABLED => Command::Enable,
            EFFECT_CMD_DISABLE => Command::Disable,
            EFFECT_CMD_GET_DESCRIPTOR => Command::GetDescriptor,
            CMD_SET_PITCH_RATIO => Command::SetPitchRatio(unsafe { read_payload(data, size) }?),
            CMD_GET_LATENCY_MS => Command::GetLatencyMs,
            CMD_GET_CPU_USAGE => Command::GetCpuUsage,
            CMD_RESET_STATS => Command::ResetStats,
            CMD_GET_TOTAL_FRAMES => Command::GetTotalFrames,
            CMD_GET_PITCH_SEMITONES => Command::GetPitchSemitones,
            CMD_GET_KERNEL_LATENCY_MS => Command::GetKernelLatencyMs,
            CMD_GET_FRAMES_DROPPED => Command::GetFramesDropped,
            other => {
                warn!("unknown effect command {other:#x}");
                return Err(ShiftError::InvalidArgument("unknown command"));
            }
        };
        Ok(command)
    }

    /// Size in bytes of the reply this command writes, if any.
    pub fn reply_size(&self) -> Option<usize> {
        match self {
            Command::Init
            | Command::SetConfig(_)
            | Command::Enable
            | Command::Disable
            | Command::SetPitchRatio(_) => Some(size_of::<i32>()),
            Command::GetConfig => Some(size_of::<EffectConfig>()),
            Command::GetDescriptor => Some(size_of::<EffectDescriptor>()),
            Command::GetLatencyMs
            | Command::GetCpuUsage
            | Command::GetPitchSemitones
            | Command::GetKernelLatencyMs => Some(size_of::<f32>()),
            Command::GetTotalFrames | Command::GetFramesDropped => Some(size_of::<u64>()),
            Command::Reset | Command::ResetStats => None,
        }
    }
}

/// A command result ready to be written to the host's reply buffer.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    None,
    Status(i32),
    Config(EffectConfig),
    Descriptor(EffectDescriptor),
    Float(f32),
    Count(u64),
}

impl Reply {
    /// Writes the reply to `out`, returning the bytes written.
    ///
    /// # Errors
    /// `InvalidArgument` when `out` is null or `capacity` is too small.
    ///
    /// # Safety
    /// `out` must be null or valid for writes of `capacity` bytes.
    pub unsafe fn write_to(&self, out: *mut c_void, capacity: usize) -> Result<usize, ShiftError> {
        // SAFETY: caller guarantees `capacity` writable bytes at `out`.
        unsafe {
            match *self {
                Reply::None => Ok(0),
                Reply::Status(status) => write_payload(out, capacity, status),
                Reply::Float(value) => write_payload(out, capacity, value),
                Reply::Count(value) => write_payload(out, capacity, value),
                Reply::Config(config) => write_payload(out, capacity, config),
                Reply::Descriptor(descriptor) => write_payload(out, capacity, descriptor),
            }
        }
    }
}

/// Reads a `T` from a host payload.
///
/// # Safety
/// `data` must be null or valid for reads of `size` bytes, and every bit
/// pattern must be a valid `T`.
unsafe fn read_payload<T: Copy>(data: *const c_void, size: usize) -> Result<T, ShiftError> {
    if data.is_null() || size < size_of::<T>() {
        return Err(ShiftError::InvalidArgument("command payload missing or too small"));
    }
    // SAFETY: non-null and at least `size_of::<T>()` readable bytes.
    Ok(unsafe { std::ptr::read_unaligned(data.cast::<T>()) })
}

/// Writes a `T` to a host reply buffer.
///
/// # Safety
/// `out` must be null or valid for writes of `capacity` bytes.
unsafe fn write_payload<T: Copy>(out: *mut c_void, capacity: usize, value: T) -> Result<usize, ShiftError> {
    if out.is_null() || capacity < size_of::<T>() {
        return Err(ShiftError::InvalidArgument("reply buffer missing or too small"));
    }
    // SAFETY: non-null and at least `size_of::<T>()` writable bytes.
    unsafe { std::ptr::write_unaligned(out.cast::<T>(), value) };
    Ok(size_of::<T>())
}
