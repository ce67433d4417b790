//! Pixel to palette mapping, with optional Floyd–Steinberg error diffusion.

use std::collections::HashMap;

use crate::image_pipeline::quantize::types::{ALPHA_CUTOFF, TRANSPARENT_INDEX};

fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// Nearest-color lookup over the visible slots of a palette.
///
/// Slot [`TRANSPARENT_INDEX`] is never returned for a color query.
pub struct PaletteMapper<'a> {
    palette: &'a [[u8; 3]],
    cache: HashMap<[u8; 3], u8>,
}

impl<'a> PaletteMapper<'a> {
    pub fn new(palette: &'a [[u8; 3]]) -> Self {
        Self {
            palette,
            cache: HashMap::new(),
        }
    }

    pub fn nearest(&mut self, color: [u8; 3]) -> u8 {
        if let Some(&index) = self.cache.get(&color) {
            return index;
        }

        let mut best = (TRANSPARENT_INDEX, u32::MAX);
        for (index, &entry) in self.palette.iter().enumerate() {
            if index == TRANSPARENT_INDEX as usize {
                continue;
            }
            let distance = distance_sq(color, entry);
            if distance < best.1 {
                best = (index as u8, distance);
                if distance == 0 {
                    break;
                }
            }
        }

        self.cache.insert(color, best.0);
        best.0
    }

    /// Maps each pixel straight to its nearest palette entry.
    pub fn map_direct(&mut self, pixels: &[u8], channels: usize) -> Vec<u8> {
        pixels
            .chunks_exact(channels)
            .map(|px| {
                let alpha = if channels == 4 { px[3] } else { u8::MAX };
                if alpha < ALPHA_CUTOFF {
                    TRANSPARENT_INDEX
                } else {
                    self.nearest([px[0], px[1], px[2]])
                }
            })
            .collect()
    }

    /// Maps pixels in raster order, spreading each pixel's quantization error
    /// onto its unprocessed neighbours with the 7/3/5/1 kernel.
    ///
    /// Transparent pixels neither receive nor pass on error.
    pub fn map_floyd_steinberg(&mut self, pixels: &[u8], channels: usize, width: usize) -> Vec<u8> {
        let mut indices = Vec::with_capacity(pixels.len() / channels);
        if width == 0 {
            return indices;
        }

        // One guard cell on each side so x-1 and x+1 never go out of bounds
        let mut current = vec![[0f32; 3]; width + 2];
        let mut next = vec![[0f32; 3]; width + 2];

        for row in pixels.chunks_exact(width * channels) {
            for (x, px) in row.chunks_exact(channels).enumerate() {
                let alpha = if channels == 4 { px[3] } else { u8::MAX };
                if alpha < ALPHA_CUTOFF {
                    indices.push(TRANSPARENT_INDEX);
                    continue;
                }

                let carried = current[x + 1];
                let wanted = [
                    (px[0] as f32 + carried[0]).clamp(0.0, 255.0),
                    (px[1] as f32 + carried[1]).clamp(0.0, 255.0),
                    (px[2] as f32 + carried[2]).clamp(0.0, 255.0),
                ];
                let index = self.nearest(wanted.map(|c| c.round() as u8));
                indices.push(index);

                let chosen = self.palette[index as usize];
                for channel in 0..3 {
                    let error = wanted[channel] - chosen[channel] as f32;
                    current[x + 2][channel] += error * 7.0 / 16.0;
                    next[x][channel] += error * 3.0 / 16.0;
                    next[x + 1][channel] += error * 5.0 / 16.0;
                    next[x + 2][channel] += error * 1.0 / 16.0;
                }
            }

            std::mem::swap(&mut current, &mut next);
            next.fill([0.0; 3]);
        }

        indices
    }
}
