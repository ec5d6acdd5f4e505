#![forbid(unsafe_code)]
//! Reference tone generation and frequency verification.

pub mod frequency;
pub mod sine;

pub use frequency::{
    compute_magnitude_spectrum, detect_frequency, is_frequency, rms_energy, validate_pitch_shift,
};
pub use sine::SineGenerator;
