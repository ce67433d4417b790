use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::config::ConversionConfig;
use crate::image_pipeline::sequence::FrameSequence;

pub trait AnimationWriter {
    fn write_animation(
        &self,
        sequence: &FrameSequence,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()>;
}
