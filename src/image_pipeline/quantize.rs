//! Palette quantization module
//!
//! Reduces a premultiplied RGBA raster to an indexed frame. Palette slot 0 is
//! reserved for transparency; the remaining slots come from an octree built
//! over the visible pixels.

mod octree;
mod mapping;
pub mod types;

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::config::DitherMode;
use crate::image_pipeline::config::types::COLOR_COUNT_RANGE;
use crate::image_pipeline::loader::RasterImage;

pub use mapping::PaletteMapper;
pub use octree::Octree;
pub use types::{ALPHA_CUTOFF, IndexedFrame, TRANSPARENT_INDEX};

/// Quantizes `image` to at most `color_count` palette entries.
///
/// Slot 0 is the transparent slot, leaving `color_count - 1` entries for
/// visible colors. Pixels with alpha below [`ALPHA_CUTOFF`] map to slot 0.
pub fn quantize(image: &RasterImage, color_count: u16, dither: DitherMode) -> Result<IndexedFrame> {
    if !COLOR_COUNT_RANGE.contains(&color_count) {
        return Err(ConversionError::QuantizeError(format!(
            "color count {color_count} outside {}..={}",
            COLOR_COUNT_RANGE.start(),
            COLOR_COUNT_RANGE.end()
        )));
    }

    let channels = image.color_model().channels();
    let pixels = image.data();

    let mut octree = Octree::new(color_count as usize - 1);
    let mut visible = 0usize;
    for px in pixels.chunks_exact(channels) {
        let alpha = if channels == 4 { px[3] } else { u8::MAX };
        if alpha >= ALPHA_CUTOFF {
            octree.insert([px[0], px[1], px[2]], alpha as u64);
            visible += 1;
        }
    }

    let mut palette = Vec::with_capacity(color_count as usize);
    palette.push([0, 0, 0]);
    palette.extend(octree.palette());
    // A lone transparent slot still needs a partner color
    if palette.len() < 2 {
        palette.push([0, 0, 0]);
    }

    debug!(
        "Octree palette: {} colors for {} visible of {} pixels",
        palette.len() - 1,
        visible,
        image.pixel_count()
    );

    let mut mapper = PaletteMapper::new(&palette);
    let indices = match dither {
        DitherMode::None => mapper.map_direct(pixels, channels),
        DitherMode::FloydSteinberg => {
            mapper.map_floyd_steinberg(pixels, channels, image.width() as usize)
        }
    };

    IndexedFrame::new(image.width(), image.height(), palette, indices, TRANSPARENT_INDEX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::loader::ColorModel;

    fn gradient(width: u32, height: u32) -> RasterImage {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[
                    (x * 255 / width.max(2).saturating_sub(1).max(1)) as u8,
                    (y * 255 / height.max(2).saturating_sub(1).max(1)) as u8,
                    ((x + y) * 7 % 256) as u8,
                    if (x + y) % 5 == 0 { 0 } else { 255 },
                ]);
            }
        }
        RasterImage::new(width, height, ColorModel::Rgba, data).unwrap()
    }

    #[test]
    fn test_palette_bounded_and_indices_valid_for_every_count() {
        let image = gradient(24, 16);
        for count in 2..=256u16 {
            for dither in [DitherMode::None, DitherMode::FloydSteinberg] {
                let frame = quantize(&image, count, dither).unwrap();
                assert!(frame.palette().len() <= count as usize, "count {count}");
                assert!(
                    frame.indices().iter().all(|&i| (i as usize) < frame.palette().len()),
                    "count {count}"
                );
            }
        }
    }

    #[test]
    fn test_transparent_pixels_use_transparent_index() {
        let image = gradient(16, 16);
        for dither in [DitherMode::None, DitherMode::FloydSteinberg] {
            let frame = quantize(&image, 16, dither).unwrap();
            for (px, &index) in image.data().chunks_exact(4).zip(frame.indices()) {
                if px[3] == 0 {
                    assert_eq!(index, TRANSPARENT_INDEX);
                } else {
                    assert_ne!(index, TRANSPARENT_INDEX);
                }
            }
        }
    }

    #[test]
    fn test_solid_color_is_exact() {
        let image = RasterImage::filled(10, 10, [255, 0, 0, 255]).unwrap();
        let frame = quantize(&image, 256, DitherMode::FloydSteinberg).unwrap();
        assert_eq!(frame.palette(), &[[0, 0, 0], [255, 0, 0]]);
        assert!(frame.indices().iter().all(|&i| i == 1));
    }

    #[test]
    fn test_fully_transparent_frame() {
        let image = RasterImage::filled(3, 3, [0, 0, 0, 0]).unwrap();
        let frame = quantize(&image, 2, DitherMode::None).unwrap();
        assert_eq!(frame.palette().len(), 2);
        assert!(frame.indices().iter().all(|&i| i == TRANSPARENT_INDEX));
    }

    #[test]
    fn test_near_zero_alpha_is_transparent() {
        let data = vec![200, 200, 200, ALPHA_CUTOFF - 1, 200, 200, 200, ALPHA_CUTOFF];
        let image = RasterImage::new(2, 1, ColorModel::Rgba, data).unwrap();
        let frame = quantize(&image, 4, DitherMode::None).unwrap();
        assert_eq!(frame.indices()[0], TRANSPARENT_INDEX);
        assert_ne!(frame.indices()[1], TRANSPARENT_INDEX);
    }

    #[test]
    fn test_rgb_input_is_opaque() {
        let image = RasterImage::new(2, 1, ColorModel::Rgb, vec![0, 0, 0, 255, 255, 255]).unwrap();
        let frame = quantize(&image, 4, DitherMode::None).unwrap();
        assert!(frame.indices().iter().all(|&i| i != TRANSPARENT_INDEX));
    }

    #[test]
    fn test_color_count_out_of_range() {
        let image = RasterImage::filled(2, 2, [1, 2, 3, 255]).unwrap();
        for count in [0, 1, 257] {
            assert!(matches!(
                quantize(&image, count, DitherMode::None),
                Err(ConversionError::QuantizeError(_))
            ));
        }
    }

    #[test]
    fn test_two_colors_keep_one_visible_color() {
        let image = gradient(8, 8);
        let frame = quantize(&image, 2, DitherMode::FloydSteinberg).unwrap();
        assert_eq!(frame.palette().len(), 2);
        assert!(frame.indices().iter().all(|&i| i <= 1));
    }
}
