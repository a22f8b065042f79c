use std::path::Path;

use crate::shared::media_info::MediaInfo;
use crate::transcription::domain::audio_segment::AudioSegment;

/// Domain interface for probing and decoding audio from a video file.
pub trait AudioReader: Send {
    /// Open the container, read its total duration and audio presence, close it.
    fn probe(&self, path: &Path) -> Result<MediaInfo, Box<dyn std::error::Error>>;

    /// Decode the entire audio track to a mono PCM segment at the given
    /// sample rate. Returns None if the file has no audio track.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>>;

    /// Decode the audio in `[start_secs, start_secs + duration_secs)` to a
    /// mono PCM segment at the given sample rate. Returns None if the file
    /// has no audio track.
    fn read_audio_range(
        &self,
        path: &Path,
        start_secs: f64,
        duration_secs: f64,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>>;
}
