//! Shared pieces of the frame pipeline
//!
//! Every stage reports failures through the one error type defined here.

pub mod error;

pub use error::{ConversionError, Result};
