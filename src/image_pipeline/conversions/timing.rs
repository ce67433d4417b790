use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

/// Timed phases of a conversion run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    ProcessFrames,
    Encode,
    WriteOutput,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Discover,
        Stage::ProcessFrames,
        Stage::Encode,
        Stage::WriteOutput,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Stage::Discover => "discover",
            Stage::ProcessFrames => "process frames",
            Stage::Encode => "encode",
            Stage::WriteOutput => "write output",
        })
    }
}

/// Wall-clock time spent in each stage of one run.
///
/// Stages that never ran (a stream conversion has no discover or write
/// step) report `None`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PipelineTimings {
    stages: [Option<Duration>; Stage::ALL.len()],
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops `timer` and adds its elapsed time to its stage.
    pub fn record(&mut self, timer: Timer) {
        self.add(timer.stage, timer.start.elapsed());
    }

    pub fn add(&mut self, stage: Stage, elapsed: Duration) {
        let slot = &mut self.stages[stage.slot()];
        *slot = Some(slot.unwrap_or_default() + elapsed);
    }

    pub fn get(&self, stage: Stage) -> Option<Duration> {
        self.stages[stage.slot()]
    }

    pub fn total(&self) -> Duration {
        self.stages.iter().flatten().sum()
    }

    pub fn log_summary(&self) {
        let total = self.total().as_secs_f64();
        for stage in Stage::ALL {
            let Some(elapsed) = self.get(stage) else {
                continue;
            };
            let share = if total > 0.0 {
                elapsed.as_secs_f64() / total * 100.0
            } else {
                0.0
            };
            debug!(
                "{:<16} {:>10.3}ms ({:>5.1}%)",
                stage,
                elapsed.as_secs_f64() * 1000.0,
                share
            );
        }
        debug!("{:<16} {:>10.3}ms", "total", total * 1000.0);
    }
}

/// Running measurement of one stage
pub struct Timer {
    stage: Stage,
    start: Instant,
}

impl Timer {
    pub fn start(stage: Stage) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_stage_accumulates() {
        let mut timings = PipelineTimings::new();
        timings.add(Stage::Encode, Duration::from_millis(5));
        timings.add(Stage::ProcessFrames, Duration::from_millis(10));
        timings.add(Stage::Encode, Duration::from_millis(3));

        assert_eq!(timings.get(Stage::Encode), Some(Duration::from_millis(8)));
        assert_eq!(timings.get(Stage::Discover), None);
        assert_eq!(timings.total(), Duration::from_millis(18));
    }

    #[test]
    fn test_timer_lands_in_its_stage() {
        let mut timings = PipelineTimings::new();
        timings.record(Timer::start(Stage::Discover));
        assert!(timings.get(Stage::Discover).is_some());
        assert!(timings.get(Stage::WriteOutput).is_none());
    }
}
