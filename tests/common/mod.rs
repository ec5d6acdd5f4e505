#![allow(dead_code)]

use std::ffi::c_void;
use std::mem::size_of;
use std::ptr;

use audioshift::effect::abi::{
    AudioBuffer, EffectConfig, EffectDescriptor, EffectHandle, EffectInterface,
    EFFECT_IMPL_UUID,
};
use audioshift::effect::command::{
    CMD_SET_PITCH_RATIO, EFFECT_CMD_ENABLE, EFFECT_CMD_SET_CONFIG,
};
use audioshift::ffi::{EffectCreate, EffectRelease};
use audioshift::SineGenerator;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Interleaved 16-bit tone with the same sample on every channel.
pub fn sine_pcm16(freq_hz: f64, sr: u32, channels: u16, frames: usize, amp: f32) -> Vec<i16> {
    let mut gen = SineGenerator::new(freq_hz, sr, channels, amp).unwrap();
    gen.generate_pcm16(frames)
}

/// First channel of interleaved 16-bit audio, as float.
pub fn first_channel(samples: &[i16], channels: usize) -> Vec<f32> {
    samples
        .iter()
        .step_by(channels)
        .map(|&s| s as f32 / 32768.0)
        .collect()
}

/// An effect instance created and released through the C entry points.
pub struct Effect {
    handle: EffectHandle,
}

impl Effect {
    pub fn create() -> Self {
        let mut handle: EffectHandle = ptr::null_mut();
        let rc = unsafe { EffectCreate(&EFFECT_IMPL_UUID, 0, 0, &mut handle) };
        assert_eq!(rc, 0, "EffectCreate failed");
        assert!(!handle.is_null());
        Self { handle }
    }

    /// Created, configured for 16-bit PCM at `sr` with `channel_mask`, and
    /// enabled.
    pub fn enabled(sr: u32, channel_mask: u32) -> Self {
        let mut fx = Self::create();
        assert_eq!(fx.set_config(&EffectConfig::pcm16(sr, channel_mask)), (0, 0));
        assert_eq!(fx.command_status(EFFECT_CMD_ENABLE), (0, 0));
        fx
    }

    pub fn handle(&self) -> EffectHandle {
        self.handle
    }

    pub fn interface(&self) -> &'static EffectInterface {
        unsafe { &**self.handle }
    }

    /// Sends `code` with raw payload and reply pointers.
    pub fn command_raw(
        &mut self,
        code: u32,
        cmd_size: u32,
        cmd_data: *mut c_void,
        reply_size: *mut u32,
        reply_data: *mut c_void,
    ) -> i32 {
        let command = self.interface().command.unwrap();
        unsafe { command(self.handle, code, cmd_size, cmd_data, reply_size, reply_data) }
    }

    /// Sends `code` with an optional payload, reading a `R` reply.
    pub fn command_with<T, R: Copy>(&mut self, code: u32, payload: Option<&T>, reply: &mut R) -> i32 {
        let (size, data) = match payload {
            Some(p) => (size_of::<T>() as u32, p as *const T as *mut c_void),
            None => (0, ptr::null_mut()),
        };
        let mut reply_size = size_of::<R>() as u32;
        self.command_raw(code, size, data, &mut reply_size, (reply as *mut R).cast())
    }

    /// Sends a command without payload and returns `(rc, status reply)`.
    pub fn command_status(&mut self, code: u32) -> (i32, i32) {
        let mut status = -1i32;
        let rc = self.command_with::<(), i32>(code, None, &mut status);
        (rc, status)
    }

    /// Sends a command that has no reply.
    pub fn command_no_reply(&mut self, code: u32) -> i32 {
        self.command_raw(code, 0, ptr::null_mut(), ptr::null_mut(), ptr::null_mut())
    }

    pub fn set_config(&mut self, config: &EffectConfig) -> (i32, i32) {
        let mut status = -1i32;
        let rc = self.command_with(EFFECT_CMD_SET_CONFIG, Some(config), &mut status);
        (rc, status)
    }

    pub fn set_pitch_ratio(&mut self, ratio: f32) -> (i32, i32) {
        let mut status = -1i32;
        let rc = self.command_with(CMD_SET_PITCH_RATIO, Some(&ratio), &mut status);
        (rc, status)
    }

    pub fn get_f32(&mut self, code: u32) -> f32 {
        let mut value = f32::NAN;
        assert_eq!(self.command_with::<(), f32>(code, None, &mut value), 0);
        value
    }

    pub fn get_u64(&mut self, code: u32) -> u64 {
        let mut value = u64::MAX;
        assert_eq!(self.command_with::<(), u64>(code, None, &mut value), 0);
        value
    }

    pub fn get_descriptor(&mut self) -> (i32, EffectDescriptor) {
        let get = self.interface().get_descriptor.unwrap();
        let mut desc: EffectDescriptor = unsafe { std::mem::zeroed() };
        let rc = unsafe { get(self.handle, &mut desc) };
        (rc, desc)
    }

    /// Processes `frames` frames from `input` into `output`.
    pub fn process(&mut self, input: &[i16], output: &mut [i16], frames: usize) -> i32 {
        let mut in_buf = AudioBuffer {
            frame_count: frames,
            raw: input.as_ptr().cast_mut().cast(),
        };
        let mut out_buf = AudioBuffer {
            frame_count: frames,
            raw: output.as_mut_ptr().cast(),
        };
        let process = self.interface().process.unwrap();
        unsafe { process(self.handle, &mut in_buf, &mut out_buf) }
    }

    /// Processes `frames` frames of `buffer` in place.
    pub fn process_in_place(&mut self, buffer: &mut [i16], frames: usize) -> i32 {
        let mut buf = AudioBuffer {
            frame_count: frames,
            raw: buffer.as_mut_ptr().cast(),
        };
        let shared: *mut AudioBuffer = &mut buf;
        let process = self.interface().process.unwrap();
        unsafe { process(self.handle, shared, shared) }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        let rc = unsafe { EffectRelease(self.handle) };
        assert_eq!(rc, 0, "EffectRelease failed");
    }
}
