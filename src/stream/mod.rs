#![forbid(unsafe_code)]
//! Streaming pitch-shift kernel.

pub mod processor;

pub use processor::StreamProcessor;
