//! Raster image types

use crate::image_pipeline::common::error::{ConversionError, Result};

/// Channel layout of a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    Rgb,
    Rgba,
}

impl ColorModel {
    pub fn channels(self) -> usize {
        match self {
            ColorModel::Rgb => 3,
            ColorModel::Rgba => 4,
        }
    }
}

/// Decoded 8-bit raster, row-major and tightly packed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    color_model: ColorModel,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wraps a pixel buffer, checking that its length matches the dimensions.
    pub fn new(width: u32, height: u32, color_model: ColorModel, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * color_model.channels();
        if width == 0 || height == 0 || data.len() != expected {
            return Err(ConversionError::InvalidRaster(format!(
                "raster buffer of {} bytes does not match {}x{} {:?}",
                data.len(),
                width,
                height,
                color_model
            )));
        }

        Ok(Self {
            width,
            height,
            color_model,
            data,
        })
    }

    /// Solid-color RGBA raster.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let data = rgba.repeat(width as usize * height as usize);
        Self::new(width, height, ColorModel::Rgba, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_model(&self) -> ColorModel {
        self.color_model
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the raster in RGBA, adding an opaque alpha channel to RGB input.
    pub fn into_rgba(self) -> RasterImage {
        match self.color_model {
            ColorModel::Rgba => self,
            ColorModel::Rgb => {
                let mut data = Vec::with_capacity(self.pixel_count() * 4);
                for px in self.data.chunks_exact(3) {
                    data.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]);
                }
                RasterImage {
                    width: self.width,
                    height: self.height,
                    color_model: ColorModel::Rgba,
                    data,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_length_is_checked() {
        assert!(RasterImage::new(2, 2, ColorModel::Rgba, vec![0; 16]).is_ok());
        assert!(RasterImage::new(2, 2, ColorModel::Rgb, vec![0; 12]).is_ok());
        assert!(RasterImage::new(2, 2, ColorModel::Rgba, vec![0; 12]).is_err());
        assert!(RasterImage::new(0, 2, ColorModel::Rgba, Vec::new()).is_err());
    }

    #[test]
    fn test_mismatch_is_invalid_raster() {
        let result = RasterImage::new(3, 3, ColorModel::Rgb, vec![0; 10]);
        assert!(matches!(result, Err(ConversionError::InvalidRaster(_))));
        assert!(matches!(
            RasterImage::filled(0, 4, [1, 2, 3, 255]),
            Err(ConversionError::InvalidRaster(_))
        ));
    }

    #[test]
    fn test_rgb_gains_opaque_alpha() {
        let rgb = RasterImage::new(2, 1, ColorModel::Rgb, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let rgba = rgb.into_rgba();
        assert_eq!(rgba.color_model(), ColorModel::Rgba);
        assert_eq!(rgba.data(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
