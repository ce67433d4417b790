//! Indexed frame types

use crate::image_pipeline::common::error::{ConversionError, Result};

/// Palette slot rendered as fully transparent in every frame
pub const TRANSPARENT_INDEX: u8 = 0;

/// Composited pixels with alpha below this value are treated as transparent
pub const ALPHA_CUTOFF: u8 = 8;

/// Palette-indexed frame ready for encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    width: u32,
    height: u32,
    palette: Vec<[u8; 3]>,
    indices: Vec<u8>,
    transparent_index: u8,
}

impl IndexedFrame {
    /// Builds a frame, checking that every index refers into the palette.
    pub fn new(
        width: u32,
        height: u32,
        palette: Vec<[u8; 3]>,
        indices: Vec<u8>,
        transparent_index: u8,
    ) -> Result<Self> {
        if palette.is_empty() || palette.len() > 256 {
            return Err(ConversionError::QuantizeError(format!(
                "palette of {} entries, expected 1-256",
                palette.len()
            )));
        }

        if indices.len() != width as usize * height as usize {
            return Err(ConversionError::QuantizeError(format!(
                "{} indices for a {}x{} frame",
                indices.len(),
                width,
                height
            )));
        }

        if transparent_index as usize >= palette.len() {
            return Err(ConversionError::QuantizeError(format!(
                "transparent index {} outside palette of {}",
                transparent_index,
                palette.len()
            )));
        }

        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= palette.len()) {
            return Err(ConversionError::QuantizeError(format!(
                "index {} outside palette of {}",
                bad,
                palette.len()
            )));
        }

        Ok(Self {
            width,
            height,
            palette,
            indices,
            transparent_index,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> &[[u8; 3]] {
        &self.palette
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn transparent_index(&self) -> u8 {
        self.transparent_index
    }

    /// Palette flattened to `[r, g, b, r, g, b, ...]`.
    pub fn palette_bytes(&self) -> Vec<u8> {
        self.palette.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_outside_palette_rejected() {
        let result = IndexedFrame::new(2, 1, vec![[0, 0, 0], [1, 1, 1]], vec![0, 2], 0);
        assert!(matches!(result, Err(ConversionError::QuantizeError(_))));
    }

    #[test]
    fn test_index_count_must_match() {
        let result = IndexedFrame::new(2, 2, vec![[0, 0, 0]], vec![0, 0, 0], 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_palette_bytes_are_flat() {
        let frame = IndexedFrame::new(1, 1, vec![[1, 2, 3], [4, 5, 6]], vec![1], 0).unwrap();
        assert_eq!(frame.palette_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }
}
