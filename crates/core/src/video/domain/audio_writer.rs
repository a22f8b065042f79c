use std::path::Path;

use crate::transcription::domain::audio_segment::AudioSegment;

/// Domain interface for persisting decoded audio to a file.
pub trait AudioWriter: Send {
    fn write_audio(
        &self,
        path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
