//! Background conversion runs.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

use tracing::{debug, error};

use crate::image_pipeline::animation::AnimationWriter;
use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::conversions::frames_to_gif::{
    CancelToken, ConversionSummary, FrameSource, FramesToGifPipeline,
};
use crate::image_pipeline::conversions::progress::{ProgressEvent, ProgressReporter};
use crate::image_pipeline::loader::FrameLoader;

/// A conversion running on its own thread
///
/// Progress arrives on the receiver returned by [`ConversionTask::spawn`];
/// the final result comes from [`ConversionTask::wait`].
pub struct ConversionTask {
    handle: JoinHandle<Result<ConversionSummary>>,
    cancel: CancelToken,
}

impl ConversionTask {
    pub fn spawn<L, W>(
        pipeline: FramesToGifPipeline<L, W>,
        source: FrameSource,
        output_path: impl Into<PathBuf>,
    ) -> Result<(Self, Receiver<ProgressEvent>)>
    where
        L: FrameLoader + Send + Sync + 'static,
        W: AnimationWriter + Send + Sync + 'static,
    {
        let output_path = output_path.into();
        let (progress, events) = ProgressReporter::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        let handle = std::thread::Builder::new()
            .name("alphagif-conversion".to_string())
            .spawn(move || {
                debug!("Conversion worker started");
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    pipeline.run(&source, &output_path, &progress, &worker_cancel)
                }));
                outcome.unwrap_or_else(|_| {
                    error!("Conversion worker panicked");
                    let err = ConversionError::WorkerPanicked;
                    progress.failed(&err);
                    Err(err)
                })
            })?;

        Ok((Self { handle, cancel }, events))
    }

    /// Asks the worker to stop before its next frame.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the worker is done and returns its result.
    pub fn wait(self) -> Result<ConversionSummary> {
        self.handle
            .join()
            .map_err(|_| ConversionError::WorkerPanicked)?
    }
}
