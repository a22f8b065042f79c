use std::path::PathBuf;

use super::progress::ProgressEstimate;
use super::segment_planner::SegmentWindow;

/// Terminal result for one window. A failure abandons that window for good;
/// the run carries on with the next one.
#[derive(Clone, Debug, PartialEq)]
pub enum SegmentOutcome {
    /// Transcript written to the given path.
    Transcribed(PathBuf),
    /// Decoding the audio slice failed; no transient file was created.
    ExtractionFailed(String),
    /// Inference or output writing failed; the transient audio was removed.
    TranscriptionFailed(String),
}

#[derive(Clone, Debug)]
pub struct SegmentReport {
    pub window: SegmentWindow,
    pub outcome: SegmentOutcome,
    pub wall_secs: f64,
    pub progress: ProgressEstimate,
}

/// Accumulated per-segment results for a whole segmented run.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<SegmentReport>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn transcribed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, SegmentOutcome::Transcribed(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.transcribed()
    }
}
