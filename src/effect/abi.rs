//! Android audio effect framework structures.
//!
//! These mirror `hardware/audio_effect.h` field for field. The host casts
//! the handle it receives from `EffectCreate` to `effect_interface_s **`, so
//! every struct here is `#[repr(C)]` and the layouts are checked below.

use std::ffi::{c_char, c_void};

// =============================================================================
// Identifiers
// =============================================================================

/// `effect_uuid_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectUuid {
    pub time_low: u32,
    pub time_mid: u16,
    pub time_hi_and_version: u16,
    pub clock_seq: u16,
    pub node: [u8; 6],
}

/// Effect type UUID shared by every 432 Hz retuning implementation.
pub const EFFECT_TYPE_UUID: EffectUuid = EffectUuid {
    time_low: 0x7b49_1460,
    time_mid: 0x8d4d,
    time_hi_and_version: 0x11e0,
    clock_seq: 0xbd6a,
    node: [0x00, 0x02, 0xa5, 0xd5, 0xc5, 0x1b],
};

/// UUID of this implementation.
pub const EFFECT_IMPL_UUID: EffectUuid = EffectUuid {
    time_low: 0xf1a2_b3c4,
    time_mid: 0x5678,
    time_hi_and_version: 0x90ab,
    clock_seq: 0xcdef,
    node: [0x01, 0x23, 0x45, 0x67, 0x89, 0xab],
};

// =============================================================================
// Descriptor
// =============================================================================

pub const EFFECT_STRING_LEN_MAX: usize = 64;

/// Control API version reported in the descriptor.
pub const EFFECT_CONTROL_API_VERSION: u32 = 0x0003;

pub const EFFECT_FLAG_TYPE_INSERT: u32 = 0x0000_0001;
pub const EFFECT_FLAG_INSERT_LAST: u32 = 0x0000_0040;
pub const EFFECT_FLAG_DEVICE_IND: u32 = 0x0000_0800;
pub const EFFECT_FLAG_AUDIO_MODE_IND: u32 = 0x0000_1000;

pub const EFFECT_NAME: &str = "AudioShift 432Hz Converter";
pub const EFFECT_IMPLEMENTOR: &str = "AudioShift Project";

/// `effect_descriptor_t`. Strings are NUL-terminated `char[64]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectDescriptor {
    pub type_uuid: EffectUuid,
    pub uuid: EffectUuid,
    pub api_version: u32,
    pub flags: u32,
    /// Tenths of a MIPS.
    pub cpu_load: u16,
    /// Kilobytes.
    pub memory_usage: u16,
    pub name: [u8; EFFECT_STRING_LEN_MAX],
    pub implementor: [u8; EFFECT_STRING_LEN_MAX],
}

impl EffectDescriptor {
    /// Name up to the first NUL.
    pub fn name(&self) -> &str {
        fixed_str_value(&self.name)
    }

    /// Implementor up to the first NUL.
    pub fn implementor(&self) -> &str {
        fixed_str_value(&self.implementor)
    }
}

/// The one descriptor this library publishes.
pub const EFFECT_DESCRIPTOR: EffectDescriptor = EffectDescriptor {
    type_uuid: EFFECT_TYPE_UUID,
    uuid: EFFECT_IMPL_UUID,
    api_version: EFFECT_CONTROL_API_VERSION,
    flags: EFFECT_FLAG_TYPE_INSERT
        | EFFECT_FLAG_INSERT_LAST
        | EFFECT_FLAG_DEVICE_IND
        | EFFECT_FLAG_AUDIO_MODE_IND,
    cpu_load: 500,
    memory_usage: 32,
    name: fixed_str(EFFECT_NAME),
    implementor: fixed_str(EFFECT_IMPLEMENTOR),
};

/// Copies `s` into a NUL-padded fixed buffer, truncating to leave room for
/// the terminator.
const fn fixed_str(s: &str) -> [u8; EFFECT_STRING_LEN_MAX] {
    let bytes = s.as_bytes();
    let mut out = [0u8; EFFECT_STRING_LEN_MAX];
    let mut i = 0;
    while i < bytes.len() && i < EFFECT_STRING_LEN_MAX - 1 {
        out[i] = bytes[i];
        i += 1;
    }
    out
}

fn fixed_str_value(buf: &[u8]) -> &str {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    std::str::from_utf8(&buf[..end]).unwrap_or("")
}

// =============================================================================
// Buffers and configuration
// =============================================================================

pub const AUDIO_FORMAT_PCM_16_BIT: u8 = 0x1;

pub const AUDIO_CHANNEL_OUT_MONO: u32 = 0x1;
pub const AUDIO_CHANNEL_OUT_STEREO: u32 = 0x3;

pub const EFFECT_BUFFER_ACCESS_WRITE: u8 = 0;
pub const EFFECT_BUFFER_ACCESS_READ: u8 = 1;
pub const EFFECT_BUFFER_ACCESS_ACCUMULATE: u8 = 2;

pub const EFFECT_CONFIG_BUFFER: u16 = 0x0001;
pub const EFFECT_CONFIG_SMP_RATE: u16 = 0x0002;
pub const EFFECT_CONFIG_CHANNELS: u16 = 0x0004;
pub const EFFECT_CONFIG_FORMAT: u16 = 0x0008;
pub const EFFECT_CONFIG_ACC_MODE: u16 = 0x0010;
pub const EFFECT_CONFIG_PROVIDER: u16 = 0x0020;
pub const EFFECT_CONFIG_ALL: u16 = EFFECT_CONFIG_BUFFER
    | EFFECT_CONFIG_SMP_RATE
    | EFFECT_CONFIG_CHANNELS
    | EFFECT_CONFIG_FORMAT
    | EFFECT_CONFIG_ACC_MODE
    | EFFECT_CONFIG_PROVIDER;

/// Number of channels named by a positional output channel mask.
pub fn channel_count_from_mask(mask: u32) -> u32 {
    // Bits 30-31 select the mask representation, not channels.
    (mask & 0x3FFF_FFFF).count_ones()
}

/// `audio_buffer_t`: a frame count and an interleaved sample pointer.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AudioBuffer {
    pub frame_count: usize,
    pub raw: *mut c_void,
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self {
            frame_count: 0,
            raw: std::ptr::null_mut(),
        }
    }
}

/// `buffer_provider_t`. The effect never calls these; they are stored and
/// echoed back.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferProvider {
    pub get_buffer: *mut c_void,
    pub release_buffer: *mut c_void,
    pub cookie: *mut c_void,
}

impl Default for BufferProvider {
    fn default() -> Self {
        Self {
            get_buffer: std::ptr::null_mut(),
            release_buffer: std::ptr::null_mut(),
            cookie: std::ptr::null_mut(),
        }
    }
}

/// `buffer_config_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferConfig {
    pub buffer: AudioBuffer,
    pub sampling_rate: u32,
    pub channels: u32,
    pub buffer_provider: BufferProvider,
    pub format: u8,
    pub access_mode: u8,
    pub mask: u16,
}

impl BufferConfig {
    /// A 16-bit PCM stream description.
    pub fn pcm16(sampling_rate: u32, channel_mask: u32, access_mode: u8) -> Self {
        Self {
            sampling_rate,
            channels: channel_mask,
            format: AUDIO_FORMAT_PCM_16_BIT,
            access_mode,
            mask: EFFECT_CONFIG_ALL,
            ..Self::default()
        }
    }
}

/// `effect_config_t`, the SET_CONFIG / GET_CONFIG payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectConfig {
    pub input_cfg: BufferConfig,
    pub output_cfg: BufferConfig,
}

impl EffectConfig {
    /// Matching input and output descriptions at `sampling_rate`.
    pub fn pcm16(sampling_rate: u32, channel_mask: u32) -> Self {
        Self {
            input_cfg: BufferConfig::pcm16(sampling_rate, channel_mask, EFFECT_BUFFER_ACCESS_READ),
            output_cfg: BufferConfig::pcm16(
                sampling_rate,
                channel_mask,
                EFFECT_BUFFER_ACCESS_ACCUMULATE,
            ),
        }
    }
}

// =============================================================================
// Interface and library
// =============================================================================

/// `effect_handle_t`: pointer to the instance, whose first word points at
/// the [`EffectInterface`].
pub type EffectHandle = *mut *const EffectInterface;

pub type ProcessFn =
    unsafe extern "C" fn(EffectHandle, *mut AudioBuffer, *mut AudioBuffer) -> i32;
pub type CommandFn =
    unsafe extern "C" fn(EffectHandle, u32, u32, *mut c_void, *mut u32, *mut c_void) -> i32;
pub type GetDescriptorFn = unsafe extern "C" fn(EffectHandle, *mut EffectDescriptor) -> i32;

/// `struct effect_interface_s`, the per-instance dispatch table.
#[repr(C)]
pub struct EffectInterface {
    pub process: Option<ProcessFn>,
    pub command: Option<CommandFn>,
    pub get_descriptor: Option<GetDescriptorFn>,
    pub process_reverse: Option<ProcessFn>,
}

/// `AUDIO_EFFECT_LIBRARY_TAG`: `'AELT'`.
pub const AUDIO_EFFECT_LIBRARY_TAG: u32 =
    ((b'A' as u32) << 24) | ((b'E' as u32) << 16) | ((b'L' as u32) << 8) | b'T' as u32;

/// Library API version 3.0.
pub const EFFECT_LIBRARY_API_VERSION: u32 = 3 << 16;

pub type CreateEffectFn =
    unsafe extern "C" fn(*const EffectUuid, i32, i32, *mut EffectHandle) -> i32;
pub type ReleaseEffectFn = unsafe extern "C" fn(EffectHandle) -> i32;
pub type LibraryGetDescriptorFn =
    unsafe extern "C" fn(*const EffectUuid, *mut EffectDescriptor) -> i32;

/// `audio_effect_library_t`, exported under the `AELI` symbol.
#[repr(C)]
pub struct AudioEffectLibrary {
    pub tag: u32,
    pub version: u32,
    pub name: *const c_char,
    pub implementor: *const c_char,
    pub create_effect: Option<CreateEffectFn>,
    pub release_effect: Option<ReleaseEffectFn>,
    pub get_descriptor: Option<LibraryGetDescriptorFn>,
}

// SAFETY: the string pointers refer to 'static C string literals and the
// struct is never mutated.
unsafe impl Sync for AudioEffectLibrary {}
