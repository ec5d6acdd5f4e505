//! Error types for the audioshift crate.

use thiserror::Error;

/// Errors reported by the effect, the pitch-shift kernel and the analysis
/// utilities.
///
/// Payloads are static strings so an error raised on the audio thread never
/// touches the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShiftError {
    /// A null pointer, undersized payload, out-of-range value or unknown
    /// command was supplied.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Instance or kernel storage could not be allocated.
    #[error("out of memory")]
    OutOfMemory,
    /// The requested operation is not supported by this effect.
    #[error("not implemented")]
    NotImplemented,
    /// No effect exists at the requested index.
    #[error("no effect at the requested index")]
    NotFound,
}

impl ShiftError {
    /// Negative errno value returned across the C ABI for this error.
    pub fn status(self) -> i32 {
        match self {
            ShiftError::InvalidArgument(_) => -libc::EINVAL,
            ShiftError::OutOfMemory => -libc::ENOMEM,
            ShiftError::NotImplemented => -libc::ENOSYS,
            ShiftError::NotFound => -libc::ENOENT,
        }
    }
}

impl From<std::collections::TryReserveError> for ShiftError {
    fn from(_: std::collections::TryReserveError) -> Self {
        ShiftError::OutOfMemory
    }
}
