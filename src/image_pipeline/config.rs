//! Conversion configuration
//!
//! Holds the immutable settings of one conversion run and the closed
//! enumerations for dithering and frame disposal.

pub mod types;

pub use types::{ConversionConfig, ConversionConfigBuilder, DisposalMode, DitherMode};
