/// One planned transcription window.
///
/// Indices are 1-based and derived from the absolute timeline position, so a
/// run resumed at `start_from` produces the same numbering as an uninterrupted
/// run reaching the same offset.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentWindow {
    pub index: usize,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl SegmentWindow {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Plan the ordered windows covering `[start_from, total_duration)`.
///
/// The first index is `floor(start_from / segment_duration) + 1`; each window
/// advances by `segment_duration` and the final one is clamped to the
/// remaining tail. An exhausted or invalid range yields an empty plan.
pub fn plan_segments(
    total_duration: f64,
    segment_duration: f64,
    start_from: f64,
) -> Vec<SegmentWindow> {
    if segment_duration <= 0.0 || start_from < 0.0 {
        return Vec::new();
    }

    let mut windows = Vec::new();
    let mut index = (start_from / segment_duration).floor() as usize + 1;
    let mut start = start_from;

    while start < total_duration {
        let duration = segment_duration.min(total_duration - start);
        windows.push(SegmentWindow {
            index,
            start_secs: start,
            duration_secs: duration,
        });
        index += 1;
        start += segment_duration;
    }

    windows
}
