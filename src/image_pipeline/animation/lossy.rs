//! Lossy palette and pixel approximation.
//!
//! Palette entries are snapped to five bits per channel and merged when they
//! collide, then runs of near-identical neighbours within a row are folded
//! onto one index so the LZW stage finds longer matches. The transparent
//! slot is never merged with a color and no visible pixel is moved onto it.

use std::collections::HashMap;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::quantize::IndexedFrame;

/// Squared RGB distance under which a pixel adopts its left neighbour's index.
pub const RUN_DISTANCE_SQ: u32 = 300;

fn snap(channel: u8) -> u8 {
    (channel & 0xF8) | (channel >> 5)
}

fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as i32 - y as i32).pow(2) as u32)
        .sum()
}

/// Returns an approximated copy of `frame` whose transparent slot is 0.
pub fn approximate(frame: &IndexedFrame) -> Result<IndexedFrame> {
    let transparent = frame.transparent_index();
    let width = frame.width() as usize;

    // Snap and deduplicate visible palette entries
    let snapped: Vec<[u8; 3]> = frame.palette().iter().map(|c| c.map(snap)).collect();
    let mut first_with_color: HashMap<[u8; 3], u8> = HashMap::new();
    let canonical: Vec<u8> = snapped
        .iter()
        .enumerate()
        .map(|(index, &color)| {
            let index = index as u8;
            if index == transparent {
                index
            } else {
                *first_with_color.entry(color).or_insert(index)
            }
        })
        .collect();

    let mut indices: Vec<u8> = frame
        .indices()
        .iter()
        .map(|&i| canonical[i as usize])
        .collect();

    if width > 0 {
        for row in indices.chunks_mut(width) {
            for x in 1..row.len() {
                let (left, current) = (row[x - 1], row[x]);
                if left == transparent || current == transparent || left == current {
                    continue;
                }
                if distance_sq(snapped[left as usize], snapped[current as usize]) <= RUN_DISTANCE_SQ {
                    row[x] = left;
                }
            }
        }
    }

    // Compact: transparent slot first, then used colors in palette order
    let mut used = vec![false; snapped.len()];
    for &i in &indices {
        used[i as usize] = true;
    }

    let mut remap = vec![0u8; snapped.len()];
    let mut palette = vec![snapped[transparent as usize]];
    for (index, &color) in snapped.iter().enumerate() {
        if index as u8 != transparent && used[index] {
            remap[index] = palette.len() as u8;
            palette.push(color);
        }
    }
    if palette.len() < 2 {
        palette.push([0, 0, 0]);
    }

    let indices = indices.into_iter().map(|i| remap[i as usize]).collect();
    IndexedFrame::new(frame.width(), frame.height(), palette, indices, 0)
}
