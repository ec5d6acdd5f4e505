//! C entry points the Android effect framework resolves from the library.
//!
//! Every exported function catches panics so none unwinds into the host,
//! and maps [`ShiftError`] to a negative errno.

use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{error, info, warn};

use crate::effect::abi::{
    AudioBuffer, AudioEffectLibrary, EffectDescriptor, EffectHandle, EffectInterface, EffectUuid,
    AUDIO_EFFECT_LIBRARY_TAG, EFFECT_DESCRIPTOR, EFFECT_IMPL_UUID, EFFECT_LIBRARY_API_VERSION,
};
use crate::effect::command::Command;
use crate::effect::instance::EffectInstance;
use crate::error::ShiftError;

/// Dispatch table shared by every instance.
pub static EFFECT_INTERFACE: EffectInterface = EffectInterface {
    process: Some(effect_process),
    command: Some(effect_command),
    get_descriptor: Some(effect_get_descriptor),
    process_reverse: Some(effect_process_reverse),
};

/// Library descriptor the host looks up by symbol name.
#[no_mangle]
pub static AELI: AudioEffectLibrary = AudioEffectLibrary {
    tag: AUDIO_EFFECT_LIBRARY_TAG,
    version: EFFECT_LIBRARY_API_VERSION,
    name: c"AudioShift 432Hz Converter".as_ptr(),
    implementor: c"AudioShift Project".as_ptr(),
    create_effect: Some(EffectCreate),
    release_effect: Some(EffectRelease),
    get_descriptor: Some(EffectGetDescriptor),
};

/// Runs `f`, turning its error or a panic into a status code.
fn guarded(name: &str, f: impl FnOnce() -> Result<(), ShiftError>) -> i32 {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => 0,
        Ok(Err(err)) => err.status(),
        Err(_) => {
            error!("{name}: panic caught at the library boundary");
            ShiftError::InvalidArgument("panic").status()
        }
    }
}

/// Recovers the instance behind a handle.
///
/// # Safety
/// `handle` must be null or a pointer returned by [`EffectCreate`] and not
/// yet released, with no other live reference to the instance.
unsafe fn instance<'a>(handle: EffectHandle) -> Result<&'a mut EffectInstance, ShiftError> {
    // SAFETY: the handle is the Box pointer handed out by EffectCreate.
    unsafe { handle.cast::<EffectInstance>().as_mut() }
        .ok_or(ShiftError::InvalidArgument("null effect handle"))
}

/// Creates an instance for `uuid` and stores its handle in `handle`.
///
/// # Safety
/// `uuid` must be null or point to a valid UUID; `handle` must be null or
/// valid for one pointer write.
#[no_mangle]
pub unsafe extern "C" fn EffectCreate(
    uuid: *const EffectUuid,
    session_id: i32,
    io_id: i32,
    handle: *mut EffectHandle,
) -> i32 {
    guarded("EffectCreate", || {
        // SAFETY: caller guarantees `uuid` is null or valid.
        let uuid = unsafe { uuid.as_ref() }.ok_or(ShiftError::InvalidArgument("null uuid"))?;
        if handle.is_null() {
            return Err(ShiftError::InvalidArgument("null handle out-pointer"));
        }
        if *uuid != EFFECT_IMPL_UUID {
            warn!("EffectCreate: unknown uuid");
            return Err(ShiftError::InvalidArgument("unknown effect uuid"));
        }
        let fx = EffectInstance::new()?;
        let raw = Box::into_raw(fx);
        // SAFETY: checked non-null above; caller guarantees it is writable.
        unsafe { handle.write(raw.cast()) };
        info!("created effect instance (session {session_id}, io {io_id})");
        Ok(())
    })
}

/// Frees an instance created by [`EffectCreate`].
///
/// # Safety
/// `handle` must be null or a live handle from [`EffectCreate`]; it must not
/// be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn EffectRelease(handle: EffectHandle) -> i32 {
    guarded("EffectRelease", || {
        if handle.is_null() {
            return Err(ShiftError::InvalidArgument("null effect handle"));
        }
        // SAFETY: the handle came from Box::into_raw in EffectCreate.
        let fx = unsafe { Box::from_raw(handle.cast::<EffectInstance>()) };
        info!("released effect instance after {} frames", fx.stats().total_frames);
        drop(fx);
        Ok(())
    })
}

/// Copies the descriptor of the effect named by `uuid` to `descriptor`.
///
/// # Safety
/// `uuid` must be null or point to a valid UUID; `descriptor` must be null or
/// valid for one descriptor write.
#[no_mangle]
pub unsafe extern "C" fn EffectGetDescriptor(
    uuid: *const EffectUuid,
    descriptor: *mut EffectDescriptor,
) -> i32 {
    guarded("EffectGetDescriptor", || {
        // SAFETY: caller guarantees `uuid` is null or valid.
        let uuid = unsafe { uuid.as_ref() }.ok_or(ShiftError::InvalidArgument("null uuid"))?;
        if *uuid != EFFECT_IMPL_UUID {
            return Err(ShiftError::InvalidArgument("unknown effect uuid"));
        }
        // SAFETY: caller guarantees `descriptor` is null or writable.
        unsafe { write_descriptor(descriptor) }
    })
}

/// Stores the number of effects in this library.
///
/// # Safety
/// `count` must be null or valid for one write.
#[no_mangle]
pub unsafe extern "C" fn EffectQueryNumberEffects(count: *mut u32) -> i32 {
    guarded("EffectQueryNumberEffects", || {
        // SAFETY: caller guarantees `count` is null or writable.
        let count = unsafe { count.as_mut() }.ok_or(ShiftError::InvalidArgument("null count"))?;
        *count = 1;
        Ok(())
    })
}

/// Copies the descriptor of effect `index` to `descriptor`.
///
/// # Safety
/// `descriptor` must be null or valid for one descriptor write.
#[no_mangle]
pub unsafe extern "C" fn EffectQueryEffect(index: u32, descriptor: *mut EffectDescriptor) -> i32 {
    guarded("EffectQueryEffect", || {
        if index != 0 {
            return Err(ShiftError::NotFound);
        }
        // SAFETY: caller guarantees `descriptor` is null or writable.
        unsafe { write_descriptor(descriptor) }
    })
}

/// # Safety
/// `descriptor` must be null or valid for one descriptor write.
unsafe fn write_descriptor(descriptor: *mut EffectDescriptor) -> Result<(), ShiftError> {
    // SAFETY: caller guarantees `descriptor` is null or writable.
    let out = unsafe { descriptor.as_mut() }
        .ok_or(ShiftError::InvalidArgument("null descriptor"))?;
    *out = EFFECT_DESCRIPTOR;
    Ok(())
}

unsafe extern "C" fn effect_process(
    handle: EffectHandle,
    in_buf: *mut AudioBuffer,
    out_buf: *mut AudioBuffer,
) -> i32 {
    guarded("process", || {
        // SAFETY: the host passes the handle it got from EffectCreate.
        let fx = unsafe { instance(handle) }?;
        // SAFETY: the host passes valid buffer descriptors or null.
        let (input, output) = unsafe { (in_buf.as_ref(), out_buf.as_ref()) };
        let (Some(input), Some(output)) = (input, output) else {
            return Err(ShiftError::InvalidArgument("null audio buffer"));
        };
        if input.raw.is_null() || output.raw.is_null() {
            return Err(ShiftError::InvalidArgument("null audio data"));
        }
        if output.frame_count < input.frame_count {
            return Err(ShiftError::InvalidArgument("output buffer shorter than input"));
        }
        let samples = input.frame_count * fx.channels();
        if input.raw == output.raw {
            // SAFETY: the host owns `frame_count * channels` interleaved
            // samples at `raw` for the duration of the call.
            let buffer = unsafe { std::slice::from_raw_parts_mut(input.raw.cast::<i16>(), samples) };
            return fx.process_in_place(buffer);
        }
        // SAFETY: as above; distinct pointers to host buffers do not overlap.
        let (src, dst) = unsafe {
            (
                std::slice::from_raw_parts(input.raw.cast::<i16>(), samples),
                std::slice::from_raw_parts_mut(output.raw.cast::<i16>(), samples),
            )
        };
        fx.process(src, dst)
    })
}

unsafe extern "C" fn effect_command(
    handle: EffectHandle,
    code: u32,
    cmd_size: u32,
    cmd_data: *mut c_void,
    reply_size: *mut u32,
    reply_data: *mut c_void,
) -> i32 {
    guarded("command", || {
        // SAFETY: the host passes the handle it got from EffectCreate.
        let fx = unsafe { instance(handle) }?;
        // SAFETY: the host passes `cmd_size` readable bytes at `cmd_data`.
        let command = unsafe { Command::decode(code, cmd_data, cmd_size as usize) }?;

        // Check the reply buffer before running anything so a rejected
        // command leaves the instance untouched.
        let capacity = match command.reply_size() {
            Some(needed) => {
                // SAFETY: the host passes null or a valid size pointer.
                let capacity = unsafe { reply_size.as_ref() }.map_or(0, |&n| n as usize);
                if reply_data.is_null() || capacity < needed {
                    warn!("command {code:#x}: reply buffer missing or too small");
                    return Err(ShiftError::InvalidArgument("reply buffer missing or too small"));
                }
                capacity
            }
            None => 0,
        };

        let reply = fx.execute(command)?;
        // SAFETY: `reply_data` holds `capacity` writable bytes, checked above.
        let written = unsafe { reply.write_to(reply_data, capacity) }?;
        if written > 0 {
            // SAFETY: non-null whenever a reply was written.
            unsafe { reply_size.write(written as u32) };
        }
        Ok(())
    })
}

unsafe extern "C" fn effect_get_descriptor(
    handle: EffectHandle,
    descriptor: *mut EffectDescriptor,
) -> i32 {
    guarded("get_descriptor", || {
        // SAFETY: the host passes the handle it got from EffectCreate.
        let fx = unsafe { instance(handle) }?;
        // SAFETY: the host passes null or a writable descriptor.
        let out = unsafe { descriptor.as_mut() }
            .ok_or(ShiftError::InvalidArgument("null descriptor"))?;
        *out = fx.descriptor();
        Ok(())
    })
}

unsafe extern "C" fn effect_process_reverse(
    _handle: EffectHandle,
    _in_buf: *mut AudioBuffer,
    _out_buf: *mut AudioBuffer,
) -> i32 {
    ShiftError::NotImplemented.status()
}
