//! Animation writing module
//!
//! This module serializes frame sequences into looping GIF animations, with
//! an optional lossy pass that trades exactness for size.

mod writer;
mod standard_gif_writer;
pub mod lossy;

pub use writer::AnimationWriter;
pub use standard_gif_writer::{StandardGifWriter, disposal_method};
