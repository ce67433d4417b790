//! Frame loader backed by the `image` crate.
//!
//! Decodes PNG, JPEG, BMP and TIFF files. The format is sniffed from the
//! file contents rather than trusted from the extension.

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::loader::reader::FrameLoader;
use crate::image_pipeline::loader::types::{ColorModel, RasterImage};

/// Frame loader that decodes any still format the `image` crate was built with.
pub struct ImageCrateLoader;

impl FrameLoader for ImageCrateLoader {
    fn load(&self, path: &Path) -> Result<RasterImage> {
        let bytes = std::fs::read(path).map_err(|e| ConversionError::load(path, e))?;
        debug!("Decoding {}, {} bytes", path.display(), bytes.len());

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ConversionError::load(path, e))?;

        let Some(format) = reader.format() else {
            return Err(ConversionError::load(path, "unrecognized image format"));
        };

        let decoded = reader
            .decode()
            .map_err(|e| ConversionError::load(path, e))?;

        debug!(
            "Decoded {:?} frame: {}x{}, source alpha: {}",
            format,
            decoded.width(),
            decoded.height(),
            decoded.color().has_alpha()
        );

        // Sources without alpha come back fully opaque
        let rgba = decoded.into_rgba8();
        let (width, height) = rgba.dimensions();

        RasterImage::new(width, height, ColorModel::Rgba, rgba.into_raw())
            .map_err(|e| ConversionError::load(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_png_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 40]))
            .save(&path)
            .unwrap();

        let raster = ImageCrateLoader.load(&path).unwrap();
        assert_eq!((raster.width(), raster.height()), (3, 2));
        assert_eq!(raster.color_model(), ColorModel::Rgba);
        assert_eq!(&raster.data()[..4], &[10, 20, 30, 40]);
    }

    #[test]
    fn test_bmp_without_alpha_is_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.bmp");
        RgbImage::from_pixel(2, 2, Rgb([200, 100, 50]))
            .save(&path)
            .unwrap();

        let raster = ImageCrateLoader.load(&path).unwrap();
        assert!(raster.data().chunks_exact(4).all(|px| px == [200, 100, 50, 255]));
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");

        match ImageCrateLoader.load(&path) {
            Err(ConversionError::LoadError { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected LoadError, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        assert!(matches!(
            ImageCrateLoader.load(&path),
            Err(ConversionError::LoadError { .. })
        ));
    }

    #[test]
    fn test_truncated_png_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.png");
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 4])))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes.truncate(bytes.len() / 2);
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            ImageCrateLoader.load(&path),
            Err(ConversionError::LoadError { .. })
        ));
    }
}
