use std::borrow::Cow;
use std::io::{BufWriter, Write};

use gif::{DisposalMethod, Encoder, Frame, Repeat};
use tracing::debug;

use crate::image_pipeline::animation::lossy;
use crate::image_pipeline::animation::writer::AnimationWriter;
use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::config::{ConversionConfig, DisposalMode};
use crate::image_pipeline::quantize::IndexedFrame;
use crate::image_pipeline::sequence::FrameSequence;

/// GIF89a writer using the `gif` crate.
///
/// Every frame covers the full canvas and carries its own local color table;
/// the global color table is left empty.
pub struct StandardGifWriter;

pub fn disposal_method(mode: DisposalMode) -> DisposalMethod {
    match mode {
        DisposalMode::None => DisposalMethod::Any,
        DisposalMode::Keep => DisposalMethod::Keep,
        DisposalMode::Clear => DisposalMethod::Background,
        DisposalMode::Previous => DisposalMethod::Previous,
    }
}

fn encode_error(e: impl ToString) -> ConversionError {
    ConversionError::EncodeError(e.to_string())
}

fn check_dimensions(sequence: &FrameSequence) -> Result<(u16, u16)> {
    let (width, height) = sequence.dimensions();

    if let Some((index, frame)) = sequence
        .frames()
        .iter()
        .enumerate()
        .find(|(_, f)| (f.width(), f.height()) != (width, height))
    {
        return Err(ConversionError::EncodeError(format!(
            "frame {} is {}x{}, expected {}x{}",
            index,
            frame.width(),
            frame.height(),
            width,
            height
        )));
    }

    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(ConversionError::EncodeError(format!(
            "{width}x{height} exceeds the GIF maximum of 65535x65535"
        ))),
    }
}

impl AnimationWriter for StandardGifWriter {
    fn write_animation(
        &self,
        sequence: &FrameSequence,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()> {
        let (width, height) = check_dimensions(sequence)?;
        let delay = config.delay_centiseconds();
        let dispose = disposal_method(config.disposal);
        debug!(
            "Encoding GIF: {}x{}, {} frames, delay {}cs, dispose {:?}, lossy {}",
            width,
            height,
            sequence.len(),
            delay,
            dispose,
            config.lossy
        );

        let mut encoder =
            Encoder::new(BufWriter::new(output), width, height, &[]).map_err(encode_error)?;
        encoder.set_repeat(Repeat::Infinite).map_err(encode_error)?;

        for (index, frame) in sequence.frames().iter().enumerate() {
            let frame: Cow<'_, IndexedFrame> = if config.lossy {
                Cow::Owned(lossy::approximate(frame)?)
            } else {
                Cow::Borrowed(frame)
            };

            let gif_frame = Frame {
                width,
                height,
                delay,
                dispose,
                transparent: Some(frame.transparent_index()),
                palette: Some(frame.palette_bytes()),
                buffer: Cow::Borrowed(frame.indices()),
                ..Frame::default()
            };
            encoder.write_frame(&gif_frame).map_err(encode_error)?;
            debug!("Wrote frame {} ({} colors)", index, frame.palette().len());
        }

        let mut writer = encoder.into_inner().map_err(encode_error)?;
        writer.flush().map_err(encode_error)?;

        debug!("GIF encoding complete");
        Ok(())
    }
}
