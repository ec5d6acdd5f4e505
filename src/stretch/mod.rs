#![forbid(unsafe_code)]
//! WSOLA time stretching.

pub mod params;
pub mod wsola;

pub use params::{WsolaLayout, WsolaParams};
pub use wsola::Wsola;
