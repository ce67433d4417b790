//! Frame sequence to animated GIF pipeline
//!
//! Each frame file is loaded, optionally scaled, premultiplied by its alpha
//! and reduced to a palette with a reserved transparent slot. The frames are
//! then sorted by file name and encoded as one looping GIF.

pub mod animation;
pub mod common;
pub mod composite;
pub mod config;
pub mod conversions;
pub mod loader;
pub mod quantize;
pub mod resize;
pub mod sequence;

pub use common::{
    ConversionError,
    Result,
};

pub use config::{
    ConversionConfig,
    ConversionConfigBuilder,
    DisposalMode,
    DitherMode,
};

pub use loader::{
    ColorModel,
    FrameLoader,
    ImageCrateLoader,
    RasterImage,
};

pub use quantize::IndexedFrame;

pub use sequence::{
    FrameAssembler,
    FrameSequence,
};

pub use animation::{
    AnimationWriter,
    StandardGifWriter,
};

pub use conversions::{
    CancelToken,
    ConversionSummary,
    ConversionTask,
    FrameSource,
    FramesToGifPipeline,
    ProgressEvent,
    ProgressReporter,
    ProgressStage,
};
