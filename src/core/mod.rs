#![forbid(unsafe_code)]
//! Core types, PCM conversion, ring buffer, window and resampling utilities.

pub mod pcm;
pub mod resample;
pub mod ring_buffer;
pub mod types;
pub mod window;

pub use types::*;
