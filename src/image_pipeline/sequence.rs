//! Frame sequencing
//!
//! Frames may finish processing in any order. The assembler collects them
//! keyed by source path and only releases them, sorted, once all are in.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::quantize::IndexedFrame;

/// Case-insensitive ordering key for a frame's source path.
pub fn sort_key(path: &Path) -> (String, PathBuf) {
    (path.to_string_lossy().to_lowercase(), path.to_path_buf())
}

/// Ordered, non-empty list of frames ready for encoding
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<IndexedFrame>,
}

impl FrameSequence {
    pub fn new(frames: Vec<IndexedFrame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(ConversionError::EmptySequenceError(
                "no frames were produced".to_string(),
            ));
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[IndexedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Dimensions of the first frame.
    pub fn dimensions(&self) -> (u32, u32) {
        let first = &self.frames[0];
        (first.width(), first.height())
    }

    pub fn into_frames(self) -> Vec<IndexedFrame> {
        self.frames
    }
}

/// Sorting barrier between per-frame processing and encoding
#[derive(Debug, Default)]
pub struct FrameAssembler {
    entries: Vec<(PathBuf, IndexedFrame)>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, source: impl Into<PathBuf>, frame: IndexedFrame) {
        self.entries.push((source.into(), frame));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorts the collected frames by source path and hands them over.
    pub fn finish(self) -> Result<FrameSequence> {
        let mut entries = self.entries;
        if entries.is_empty() {
            return Err(ConversionError::EmptySequenceError(
                "no eligible input files".to_string(),
            ));
        }

        entries.sort_by_cached_key(|(path, _)| sort_key(path));
        debug!(
            "Assembled {} frames, first {}",
            entries.len(),
            entries[0].0.display()
        );

        FrameSequence::new(entries.into_iter().map(|(_, frame)| frame).collect())
    }
}

impl Extend<(PathBuf, IndexedFrame)> for FrameAssembler {
    fn extend<T: IntoIterator<Item = (PathBuf, IndexedFrame)>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(value: u8) -> IndexedFrame {
        IndexedFrame::new(1, 1, vec![[0, 0, 0], [value, value, value]], vec![1], 0).unwrap()
    }

    fn marker_of(frame: &IndexedFrame) -> u8 {
        frame.palette()[1][0]
    }

    #[test]
    fn test_order_independent_of_arrival() {
        let names = ["Frame_03.png", "frame_01.png", "FRAME_02.png", "frame_10.png"];
        let expected = [1, 2, 3, 10];

        let arrivals: [[usize; 4]; 3] = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1]];
        for order in arrivals {
            let mut assembler = FrameAssembler::new();
            for &i in &order {
                let number: u8 = names[i][6..8].parse().unwrap();
                assembler.insert(PathBuf::from("/frames").join(names[i]), marker(number));
            }
            let sequence = assembler.finish().unwrap();
            let got: Vec<u8> = sequence.frames().iter().map(marker_of).collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_case_insensitive_lexicographic() {
        let mut assembler = FrameAssembler::new();
        assembler.insert("dir/b.png", marker(2));
        assembler.insert("dir/A.png", marker(1));
        assembler.insert("dir/c.png", marker(3));
        let sequence = assembler.finish().unwrap();
        let got: Vec<u8> = sequence.frames().iter().map(marker_of).collect();
        assert_eq!(got, [1, 2, 3]);
    }

    #[test]
    fn test_empty_assembler_fails() {
        assert!(matches!(
            FrameAssembler::new().finish(),
            Err(ConversionError::EmptySequenceError(_))
        ));
        assert!(matches!(
            FrameSequence::new(Vec::new()),
            Err(ConversionError::EmptySequenceError(_))
        ));
    }
}
