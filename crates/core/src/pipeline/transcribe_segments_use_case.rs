use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::transcription::domain::progress::ProgressEstimate;
use crate::transcription::domain::run_report::{RunSummary, SegmentOutcome, SegmentReport};
use crate::transcription::domain::segment_planner::{plan_segments, SegmentWindow};
use crate::transcription::domain::speech_recognizer::SpeechRecognizer;
use crate::transcription::domain::transcript_merger::segment_file_name;
use crate::video::domain::audio_reader::AudioReader;
use crate::video::domain::audio_writer::AudioWriter;

/// Invoked after each window completes, successfully or not.
pub type SegmentProgressFn = Box<dyn Fn(&SegmentReport) + Send>;

/// Orchestrates segmented transcription of one video.
///
/// Probes total duration, plans fixed-size windows, and for each window
/// decodes the audio slice to a transient WAV, transcribes it, and writes
/// `<base>_segment_<n>.txt`. Windows run strictly one after another; a
/// failed window is reported and abandoned, never retried, and the loop
/// moves on to the next.
pub struct TranscribeSegmentsUseCase {
    reader: Box<dyn AudioReader>,
    wav_writer: Box<dyn AudioWriter>,
    recognizer: Box<dyn SpeechRecognizer>,
    segment_duration: f64,
    start_from: f64,
    language: String,
    on_progress: Option<SegmentProgressFn>,
}

impl TranscribeSegmentsUseCase {
    pub fn new(
        reader: Box<dyn AudioReader>,
        wav_writer: Box<dyn AudioWriter>,
        recognizer: Box<dyn SpeechRecognizer>,
        segment_duration: f64,
        start_from: f64,
        language: String,
        on_progress: Option<SegmentProgressFn>,
    ) -> Self {
        Self {
            reader,
            wav_writer,
            recognizer,
            segment_duration,
            start_from,
            language,
            on_progress,
        }
    }

    pub fn execute(
        &self,
        input: &Path,
        output_dir: &Path,
        base: &str,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let info = self.reader.probe(input)?;
        if !info.has_audio {
            return Err(format!("No audio track in {}", input.display()).into());
        }
        if info.duration_secs <= 0.0 {
            return Err(format!("Could not determine duration of {}", input.display()).into());
        }

        let windows = plan_segments(info.duration_secs, self.segment_duration, self.start_from);
        if windows.is_empty() {
            log::warn!(
                "Nothing to do: start offset {:.1}s is at or past the {:.1}s duration",
                self.start_from,
                info.duration_secs
            );
            return Ok(RunSummary::default());
        }

        fs::create_dir_all(output_dir)?;
        log::info!(
            "Transcribing {} windows of {:.0}s from {} ({:.1}s total)",
            windows.len(),
            self.segment_duration,
            input.display(),
            info.duration_secs
        );

        let run_start = Instant::now();
        let mut reports = Vec::with_capacity(windows.len());

        for window in windows {
            let window_start = Instant::now();
            let outcome = self.process_window(input, output_dir, base, &window);
            let wall_secs = window_start.elapsed().as_secs_f64();
            let progress = ProgressEstimate::after_window(info.duration_secs, &window, wall_secs);

            match &outcome {
                SegmentOutcome::Transcribed(path) => {
                    log::info!("Segment {} written to {}", window.index, path.display());
                }
                SegmentOutcome::ExtractionFailed(reason) => {
                    log::warn!("Segment {}: audio extraction failed: {reason}", window.index);
                }
                SegmentOutcome::TranscriptionFailed(reason) => {
                    log::warn!("Segment {}: transcription failed: {reason}", window.index);
                }
            }

            let report = SegmentReport {
                window,
                outcome,
                wall_secs,
                progress,
            };
            if let Some(ref on_progress) = self.on_progress {
                on_progress(&report);
            }
            reports.push(report);
        }

        Ok(RunSummary {
            reports,
            elapsed_secs: run_start.elapsed().as_secs_f64(),
        })
    }

    fn process_window(
        &self,
        input: &Path,
        output_dir: &Path,
        base: &str,
        window: &SegmentWindow,
    ) -> SegmentOutcome {
        let audio = match self.reader.read_audio_range(
            input,
            window.start_secs,
            window.duration_secs,
            WHISPER_SAMPLE_RATE,
        ) {
            Ok(Some(audio)) => audio,
            Ok(None) => return SegmentOutcome::ExtractionFailed("no audio track".to_string()),
            Err(e) => return SegmentOutcome::ExtractionFailed(e.to_string()),
        };

        let temp_wav = output_dir.join(format!("{base}_segment_{}.tmp.wav", window.index));
        if let Err(e) = self.wav_writer.write_audio(&temp_wav, &audio) {
            return SegmentOutcome::ExtractionFailed(e.to_string());
        }

        // The transient WAV exists from here on; both exits below remove it.
        let transcribed = self.recognizer.transcribe_file(&temp_wav, &self.language);
        if let Err(e) = fs::remove_file(&temp_wav) {
            log::warn!("Could not remove {}: {e}", temp_wav.display());
        }

        let text = match transcribed {
            Ok(text) => text,
            Err(e) => return SegmentOutcome::TranscriptionFailed(e.to_string()),
        };

        let out_path = output_dir.join(segment_file_name(base, window.index));
        match fs::write(&out_path, text) {
            Ok(()) => SegmentOutcome::Transcribed(out_path),
            Err(e) => SegmentOutcome::TranscriptionFailed(e.to_string()),
        }
    }
}
