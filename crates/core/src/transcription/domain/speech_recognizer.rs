use std::path::Path;

/// Domain interface for speech-to-text inference.
///
/// Implementations take a WAV file on disk and a language hint and return the
/// recognized text for the whole input; there are no partial results.
pub trait SpeechRecognizer: Send {
    fn transcribe_file(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, Box<dyn std::error::Error>>;
}
