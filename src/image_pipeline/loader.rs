//! Frame loading module
//!
//! This module reads still images from storage into RGBA rasters and finds
//! the frame files of a sequence folder.

mod reader;
mod image_crate_loader;
mod discovery;
pub mod types;

pub use reader::FrameLoader;
pub use image_crate_loader::ImageCrateLoader;
pub use discovery::{discover_frames, is_supported_frame, SUPPORTED_EXTENSIONS};
pub use types::{ColorModel, RasterImage};
