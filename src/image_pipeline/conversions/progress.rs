//! Progress notifications for a conversion run.
//!
//! A run reports once before processing, once per frame, once before
//! encoding and exactly once at the end, either success at 100% or a
//! failure carrying the error. Percentages never go backwards and nothing
//! is delivered after the terminal event.

use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver};

use tracing::debug;

use crate::image_pipeline::common::error::ConversionError;

const FRAMES_START_PERCENT: u8 = 5;
const FRAMES_SPAN_PERCENT: u8 = 85;
const ENCODING_PERCENT: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Started,
    FrameProcessed,
    Encoding,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    /// 0-100, non-decreasing within one run
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self.stage, ProgressStage::Completed | ProgressStage::Failed)
    }
}

type Sink = Box<dyn FnMut(ProgressEvent) + Send>;

struct ReporterState {
    sink: Sink,
    last_percent: u8,
    frames_done: usize,
    finished: bool,
}

/// Serializes progress events from any number of frame workers into one sink
pub struct ProgressReporter {
    state: Mutex<ReporterState>,
}

impl ProgressReporter {
    pub fn new(sink: impl FnMut(ProgressEvent) + Send + 'static) -> Self {
        Self {
            state: Mutex::new(ReporterState {
                sink: Box::new(sink),
                last_percent: 0,
                frames_done: 0,
                finished: false,
            }),
        }
    }

    /// Reporter that only logs.
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    /// Reporter feeding a channel. Events sent after the receiver is gone are dropped.
    pub fn channel() -> (Self, Receiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::channel();
        let reporter = Self::new(move |event| {
            let _ = sender.send(event);
        });
        (reporter, receiver)
    }

    fn emit(&self, stage: ProgressStage, percent: Option<u8>, message: String) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.finished {
            return;
        }

        let percent = percent.unwrap_or(state.last_percent).min(100).max(state.last_percent);
        state.last_percent = percent;

        let event = ProgressEvent {
            stage,
            percent,
            message,
        };
        if event.is_terminal() {
            state.finished = true;
        }

        debug!(percent = event.percent, "{}", event.message);
        (state.sink)(event);
    }

    pub fn started(&self, total_frames: usize) {
        self.emit(
            ProgressStage::Started,
            Some(0),
            format!("Found {total_frames} frames"),
        );
    }

    pub fn frame_processed(&self, source: &Path, total_frames: usize) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.frames_done += 1;
        let done = state.frames_done;
        drop(state);

        let percent = FRAMES_START_PERCENT as usize
            + FRAMES_SPAN_PERCENT as usize * done / total_frames.max(1);
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());
        self.emit(
            ProgressStage::FrameProcessed,
            Some(percent.min(100) as u8),
            format!("Processed frame {done}/{total_frames}: {name}"),
        );
    }

    pub fn encoding(&self, frame_count: usize) {
        self.emit(
            ProgressStage::Encoding,
            Some(ENCODING_PERCENT),
            format!("Encoding {frame_count} frames"),
        );
    }

    pub fn completed(&self, message: impl Into<String>) {
        self.emit(ProgressStage::Completed, Some(100), message.into());
    }

    pub fn failed(&self, error: &ConversionError) {
        self.emit(ProgressStage::Failed, None, format!("Conversion failed: {error}"));
    }

    pub fn is_finished(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .finished
    }
}
