//! Pipeline conversions module
//!
//! Orchestrates frame sequence to GIF runs: per-frame processing, the
//! sorting barrier, encoding, progress and background execution.

mod frames_to_gif;
mod progress;
mod task;
mod timing;


pub use frames_to_gif::{CancelToken, ConversionSummary, FrameSource, FramesToGifPipeline};
pub use progress::{ProgressEvent, ProgressReporter, ProgressStage};
pub use task::ConversionTask;
pub use timing::{PipelineTimings, Stage, Timer};
