use std::path::Path;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::loader::types::RasterImage;

pub trait FrameLoader {
    /// Loads one frame file as an RGBA raster.
    fn load(&self, path: &Path) -> Result<RasterImage>;
}
