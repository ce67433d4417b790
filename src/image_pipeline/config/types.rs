//! Conversion configuration types

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::image_pipeline::common::error::{ConversionError, Result};

pub const FRAME_DURATION_RANGE_MS: RangeInclusive<u32> = 1..=1000;
pub const COLOR_COUNT_RANGE: RangeInclusive<u16> = 2..=256;
pub const RESIZE_FACTOR_RANGE: RangeInclusive<f32> = 0.1..=1.0;

/// Error diffusion applied while mapping pixels onto the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    /// Direct nearest-color mapping
    None,
    /// Floyd–Steinberg error diffusion in raster order
    #[default]
    FloydSteinberg,
}

/// What happens to a frame's pixels before the next frame is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisposalMode {
    /// No disposal specified; the viewer decides
    None,
    /// Leave the frame in place
    Keep,
    /// Restore the frame area to the background (transparent)
    #[default]
    Clear,
    /// Restore the canvas to what it was before the frame
    Previous,
}

fn normalize_token(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for DitherMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "none" => Ok(DitherMode::None),
            "floyd_steinberg" => Ok(DitherMode::FloydSteinberg),
            _ => Err(ConversionError::ConfigValidationError(format!(
                "unknown dither mode '{s}' (expected none or floyd-steinberg)"
            ))),
        }
    }
}

impl fmt::Display for DitherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DitherMode::None => f.write_str("none"),
            DitherMode::FloydSteinberg => f.write_str("floyd-steinberg"),
        }
    }
}

impl FromStr for DisposalMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "none" => Ok(DisposalMode::None),
            "keep" => Ok(DisposalMode::Keep),
            "clear" => Ok(DisposalMode::Clear),
            "previous" => Ok(DisposalMode::Previous),
            _ => Err(ConversionError::ConfigValidationError(format!(
                "unknown disposal mode '{s}' (expected none, keep, clear or previous)"
            ))),
        }
    }
}

/// Legacy GIF disposal codes, 0 through 3.
impl TryFrom<u8> for DisposalMode {
    type Error = ConversionError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(DisposalMode::None),
            1 => Ok(DisposalMode::Keep),
            2 => Ok(DisposalMode::Clear),
            3 => Ok(DisposalMode::Previous),
            other => Err(ConversionError::ConfigValidationError(format!(
                "unknown disposal code {other} (expected 0-3)"
            ))),
        }
    }
}

impl fmt::Display for DisposalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisposalMode::None => f.write_str("none"),
            DisposalMode::Keep => f.write_str("keep"),
            DisposalMode::Clear => f.write_str("clear"),
            DisposalMode::Previous => f.write_str("previous"),
        }
    }
}

/// Configuration for a frame sequence to GIF conversion
///
/// The animation always loops forever; there is no loop-count field.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    /// Display time of every frame in milliseconds (1-1000)
    pub frame_duration_ms: u32,
    /// Palette size per frame including the transparent slot (2-256)
    pub color_count: u16,
    /// Uniform scale applied to every frame (0.1-1.0)
    pub resize_factor: f32,
    pub dither: DitherMode,
    pub disposal: DisposalMode,
    /// Trade exactness for size in the encoder
    pub lossy: bool,
    /// Process frames on the rayon pool
    pub parallel: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            frame_duration_ms: 40,
            color_count: 256,
            resize_factor: 1.0,
            dither: DitherMode::FloydSteinberg,
            disposal: DisposalMode::Clear,
            lossy: false,
            parallel: true,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }

    /// Checks every numeric field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !FRAME_DURATION_RANGE_MS.contains(&self.frame_duration_ms) {
            return Err(ConversionError::ConfigValidationError(format!(
                "frame_duration_ms must be within {}..={}, got {}",
                FRAME_DURATION_RANGE_MS.start(),
                FRAME_DURATION_RANGE_MS.end(),
                self.frame_duration_ms
            )));
        }

        if !COLOR_COUNT_RANGE.contains(&self.color_count) {
            return Err(ConversionError::ConfigValidationError(format!(
                "color_count must be within {}..={}, got {}",
                COLOR_COUNT_RANGE.start(),
                COLOR_COUNT_RANGE.end(),
                self.color_count
            )));
        }

        // NaN fails `contains` as well
        if !RESIZE_FACTOR_RANGE.contains(&self.resize_factor) {
            return Err(ConversionError::ConfigValidationError(format!(
                "resize_factor must be within {}..={}, got {}",
                RESIZE_FACTOR_RANGE.start(),
                RESIZE_FACTOR_RANGE.end(),
                self.resize_factor
            )));
        }

        Ok(())
    }

    /// Frame delay in GIF centiseconds, never zero.
    pub fn delay_centiseconds(&self) -> u16 {
        let cs = (self.frame_duration_ms + 5) / 10;
        cs.clamp(1, u16::MAX as u32) as u16
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    frame_duration_ms: Option<u32>,
    color_count: Option<u16>,
    resize_factor: Option<f32>,
    dither: Option<DitherMode>,
    disposal: Option<DisposalMode>,
    lossy: Option<bool>,
    parallel: Option<bool>,
}

impl ConversionConfigBuilder {
    pub fn frame_duration_ms(mut self, duration: u32) -> Self {
        self.frame_duration_ms = Some(duration);
        self
    }

    pub fn color_count(mut self, colors: u16) -> Self {
        self.color_count = Some(colors);
        self
    }

    pub fn resize_factor(mut self, factor: f32) -> Self {
        self.resize_factor = Some(factor);
        self
    }

    pub fn dither(mut self, dither: DitherMode) -> Self {
        self.dither = Some(dither);
        self
    }

    pub fn disposal(mut self, disposal: DisposalMode) -> Self {
        self.disposal = Some(disposal);
        self
    }

    pub fn lossy(mut self, enable: bool) -> Self {
        self.lossy = Some(enable);
        self
    }

    pub fn parallel(mut self, enable: bool) -> Self {
        self.parallel = Some(enable);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            frame_duration_ms: self.frame_duration_ms.unwrap_or(default.frame_duration_ms),
            color_count: self.color_count.unwrap_or(default.color_count),
            resize_factor: self.resize_factor.unwrap_or(default.resize_factor),
            dither: self.dither.unwrap_or(default.dither),
            disposal: self.disposal.unwrap_or(default.disposal),
            lossy: self.lossy.unwrap_or(default.lossy),
            parallel: self.parallel.unwrap_or(default.parallel),
        }
    }
}
