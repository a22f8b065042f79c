use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::transcription::domain::speech_recognizer::SpeechRecognizer;
use crate::video::domain::audio_reader::AudioReader;
use crate::video::domain::audio_writer::AudioWriter;

/// Transcribes a video's entire audio track in one pass.
///
/// The extracted `<base>.wav` is written next to the transcript and kept;
/// only the segmented pipeline treats extracted audio as transient.
pub struct TranscribeVideoUseCase {
    reader: Box<dyn AudioReader>,
    wav_writer: Box<dyn AudioWriter>,
    recognizer: Box<dyn SpeechRecognizer>,
    language: String,
}

impl TranscribeVideoUseCase {
    pub fn new(
        reader: Box<dyn AudioReader>,
        wav_writer: Box<dyn AudioWriter>,
        recognizer: Box<dyn SpeechRecognizer>,
        language: String,
    ) -> Self {
        Self {
            reader,
            wav_writer,
            recognizer,
            language,
        }
    }

    /// Returns the path of the transcript file.
    pub fn execute(
        &self,
        input: &Path,
        output_dir: &Path,
        base: &str,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let info = self.reader.probe(input)?;
        log::info!(
            "Transcribing {} ({:.1}s) in one pass",
            input.display(),
            info.duration_secs
        );

        let audio = self
            .reader
            .read_audio(input, WHISPER_SAMPLE_RATE)?
            .ok_or_else(|| format!("No audio track in {}", input.display()))?;

        fs::create_dir_all(output_dir)?;
        let wav_path = output_dir.join(format!("{base}.wav"));
        self.wav_writer.write_audio(&wav_path, &audio)?;

        let start = Instant::now();
        let text = self.recognizer.transcribe_file(&wav_path, &self.language)?;

        let out_path = output_dir.join(format!("{base}.txt"));
        fs::write(&out_path, text)?;

        log::info!(
            "Transcription completed in {:.1}s, result saved to {}",
            start.elapsed().as_secs_f64(),
            out_path.display()
        );
        Ok(out_path)
    }
}
