//! Alpha premultiplication
//!
//! Attenuates color channels toward black as alpha drops, so that palette
//! reduction cannot produce bright fringes around partially transparent
//! edges. Alpha itself passes through unchanged.

use tracing::debug;

use crate::image_pipeline::loader::RasterImage;

/// Premultiplies every pixel of `image` by its normalized alpha.
///
/// RGB input is promoted to opaque RGBA first, which makes the operation an
/// identity on its color values.
pub fn premultiply(image: RasterImage) -> RasterImage {
    let mut image = image.into_rgba();
    premultiply_rgba8_in_place(image.data_mut());
    debug!("Premultiplied {}x{} frame", image.width(), image.height());
    image
}

/// `round(channel * alpha / 255)` for R, G and B of each RGBA pixel.
pub fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        match a {
            0 => {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
            }
            255 => {}
            _ => {
                px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
                px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
                px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::loader::ColorModel;

    fn reference(channel: u8, alpha: u8) -> u8 {
        (channel as f64 * (alpha as f64 / 255.0)).round() as u8
    }

    #[test]
    fn test_matches_float_rounding_for_all_inputs() {
        for alpha in 0..=255u8 {
            for channel in 0..=255u8 {
                let mut px = [channel, channel, channel, alpha];
                premultiply_rgba8_in_place(&mut px);
                let expected = reference(channel, alpha);
                assert_eq!(px, [expected, expected, expected, alpha], "c={channel} a={alpha}");
            }
        }
    }

    #[test]
    fn test_alpha_is_preserved() {
        let data: Vec<u8> = (0..=255u8).flat_map(|a| [255, 128, 7, a]).collect();
        let image = RasterImage::new(256, 1, ColorModel::Rgba, data.clone()).unwrap();
        let out = premultiply(image);

        for (before, after) in data.chunks_exact(4).zip(out.data().chunks_exact(4)) {
            let derived = after[3] as f64 / 255.0;
            let original = before[3] as f64 / 255.0;
            assert!(((derived - original) * 255.0).abs() <= 1.0);
        }
    }

    #[test]
    fn test_transparent_pixels_become_black() {
        let image = RasterImage::filled(2, 2, [250, 40, 90, 0]).unwrap();
        let out = premultiply(image);
        assert!(out.data().chunks_exact(4).all(|px| px == [0, 0, 0, 0]));
    }

    #[test]
    fn test_rgb_input_is_unchanged_apart_from_alpha() {
        let image = RasterImage::new(1, 1, ColorModel::Rgb, vec![9, 99, 199]).unwrap();
        let out = premultiply(image);
        assert_eq!(out.color_model(), ColorModel::Rgba);
        assert_eq!(out.data(), &[9, 99, 199, 255]);
    }
}
