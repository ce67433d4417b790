//! Uniform frame scaling

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::loader::{ColorModel, RasterImage};

/// Target dimensions for a scale factor, `(round(w*s), round(h*s))`.
pub fn scaled_dimensions(width: u32, height: u32, factor: f32) -> (u32, u32) {
    let scale = |v: u32| (v as f64 * factor as f64).round().max(0.0) as u32;
    (scale(width), scale(height))
}

/// Scales `image` by `factor` with a Lanczos3 filter.
///
/// A factor of exactly 1.0 returns the input untouched.
pub fn resize(image: RasterImage, factor: f32) -> Result<RasterImage> {
    if factor == 1.0 {
        return Ok(image);
    }

    let (target_width, target_height) = scaled_dimensions(image.width(), image.height(), factor);
    if target_width < 1 || target_height < 1 {
        return Err(ConversionError::ResizeError(format!(
            "{}x{} scaled by {} collapses to {}x{}",
            image.width(),
            image.height(),
            factor,
            target_width,
            target_height
        )));
    }

    let image = image.into_rgba();
    let (width, height) = (image.width(), image.height());
    let source = RgbaImage::from_raw(width, height, image.into_data()).ok_or_else(|| {
        ConversionError::ResizeError(format!("raster buffer does not match {width}x{height}"))
    })?;

    let resized = imageops::resize(&source, target_width, target_height, FilterType::Lanczos3);
    debug!(
        "Resized {}x{} -> {}x{}",
        width, height, target_width, target_height
    );

    RasterImage::new(target_width, target_height, ColorModel::Rgba, resized.into_raw())
        .map_err(|e| ConversionError::ResizeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_at_one() {
        let image = RasterImage::filled(7, 3, [1, 2, 3, 4]).unwrap();
        let out = resize(image.clone(), 1.0).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn test_dimensions_round() {
        assert_eq!(scaled_dimensions(10, 10, 0.5), (5, 5));
        assert_eq!(scaled_dimensions(15, 9, 0.5), (8, 5));
        assert_eq!(scaled_dimensions(100, 30, 0.1), (10, 3));
    }

    #[test]
    fn test_downscale_keeps_flat_color() {
        let image = RasterImage::filled(20, 10, [255, 0, 0, 255]).unwrap();
        let out = resize(image, 0.5).unwrap();
        assert_eq!((out.width(), out.height()), (10, 5));
        assert!(out.data().chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
    }

    #[test]
    fn test_minimum_factor_succeeds() {
        let image = RasterImage::filled(10, 10, [0, 0, 255, 255]).unwrap();
        let out = resize(image, 0.1).unwrap();
        assert_eq!((out.width(), out.height()), (1, 1));
    }

    #[test]
    fn test_degenerate_target_fails() {
        let image = RasterImage::filled(4, 4, [0, 0, 0, 255]).unwrap();
        assert!(matches!(
            resize(image, 0.1),
            Err(ConversionError::ResizeError(_))
        ));
    }
}
