use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use vidscribe_core::pipeline::transcribe_segments_use_case::{
    SegmentProgressFn, TranscribeSegmentsUseCase,
};
use vidscribe_core::pipeline::transcribe_video_use_case::TranscribeVideoUseCase;
use vidscribe_core::shared::constants::{
    DEFAULT_LANGUAGE, DEFAULT_SEGMENT_DURATION, WHISPER_MODEL_NAME,
};
use vidscribe_core::transcription::domain::run_report::{RunSummary, SegmentOutcome};
use vidscribe_core::transcription::domain::speech_recognizer::SpeechRecognizer;
use vidscribe_core::transcription::domain::transcript_merger::TranscriptMerger;
use vidscribe_core::transcription::infrastructure::model_resolver;
use vidscribe_core::transcription::infrastructure::whisper_recognizer::WhisperRecognizer;
use vidscribe_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use vidscribe_core::video::infrastructure::wav_audio_writer::WavAudioWriter;

/// Extract audio from a video file and transcribe it to text.
#[derive(Parser)]
#[command(name = "vidscribe")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Directory for output files (defaults to the input's directory).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Base name for output files (defaults to the input file stem).
    #[arg(long)]
    base: Option<String>,

    /// Target language code passed to the model.
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Segment length in seconds.
    #[arg(long, default_value_t = DEFAULT_SEGMENT_DURATION)]
    segment_duration: f64,

    /// Offset in seconds to resume transcription from.
    #[arg(long, default_value_t = 0.0)]
    start_from: f64,

    /// Transcribe the whole file in one pass instead of segments.
    #[arg(long)]
    whole: bool,

    /// Path to a ggml Whisper model (resolved from the cache or downloaded
    /// if omitted).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Merge existing segment transcripts without transcribing anything.
    #[arg(long)]
    merge_only: bool,

    /// First segment index for the merge pass (defaults to the first
    /// segment this run produced, or 1 under --merge-only).
    #[arg(long)]
    start_segment: Option<usize>,

    /// Last segment index for the merge pass (detected from existing files
    /// if omitted).
    #[arg(long)]
    end_segment: Option<usize>,

    /// Skip the merge pass after segmented transcription.
    #[arg(long)]
    no_merge: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&cli.input));
    let base = cli.base.clone().unwrap_or_else(|| default_base(&cli.input));

    if cli.merge_only {
        return run_merge(
            &output_dir,
            &base,
            cli.start_segment.unwrap_or(1),
            cli.end_segment,
        );
    }

    let recognizer = build_recognizer(cli.model.as_deref())?;

    if cli.whole {
        run_whole(&cli, recognizer, &output_dir, &base)
    } else {
        run_segments(&cli, recognizer, &output_dir, &base)
    }
}

fn run_whole(
    cli: &Cli,
    recognizer: Box<dyn SpeechRecognizer>,
    output_dir: &Path,
    base: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let use_case = TranscribeVideoUseCase::new(
        Box::new(FfmpegAudioReader),
        Box::new(WavAudioWriter),
        recognizer,
        cli.language.clone(),
    );
    let out_path = use_case.execute(&cli.input, output_dir, base)?;
    log::info!("Transcript written to {}", out_path.display());
    Ok(())
}

fn run_segments(
    cli: &Cli,
    recognizer: Box<dyn SpeechRecognizer>,
    output_dir: &Path,
    base: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let progress: SegmentProgressFn = Box::new(|report| {
        let status = match &report.outcome {
            SegmentOutcome::Transcribed(_) => "done",
            SegmentOutcome::ExtractionFailed(_) => "extraction failed",
            SegmentOutcome::TranscriptionFailed(_) => "transcription failed",
        };
        eprintln!(
            "Segment {}: {status} in {:.1}s ({:.1}% complete, about {:.0}s left)",
            report.window.index, report.wall_secs, report.progress.percent, report.progress.eta_secs
        );
    });

    let use_case = TranscribeSegmentsUseCase::new(
        Box::new(FfmpegAudioReader),
        Box::new(WavAudioWriter),
        recognizer,
        cli.segment_duration,
        cli.start_from,
        cli.language.clone(),
        Some(progress),
    );

    let summary = use_case.execute(&cli.input, output_dir, base)?;
    log::info!(
        "Transcribed {} of {} segments in {:.1}s",
        summary.transcribed(),
        summary.reports.len(),
        summary.elapsed_secs
    );

    if cli.no_merge {
        return Ok(());
    }
    match merge_range(&summary, cli.start_segment, cli.end_segment) {
        Some((start, end)) => run_merge(output_dir, base, start, end),
        None => {
            log::warn!("No segment transcripts to merge");
            Ok(())
        }
    }
}

/// Merge bounds for the pass that follows a segmented run.
///
/// A run resumed mid-video starts numbering past 1, and a failed window
/// leaves no file behind, so the default bounds track what this run actually
/// transcribed rather than assuming segment 1 exists. Explicit overrides are
/// honored as given. `None` means there is nothing to merge.
fn merge_range(
    summary: &RunSummary,
    start_override: Option<usize>,
    end_override: Option<usize>,
) -> Option<(usize, Option<usize>)> {
    if let Some(start) = start_override {
        return Some((start, end_override));
    }

    let mut done = summary
        .reports
        .iter()
        .filter(|r| matches!(r.outcome, SegmentOutcome::Transcribed(_)));
    let first = done.next()?.window.index;
    let last = done.last().map_or(first, |r| r.window.index);
    Some((first, end_override.or(Some(last))))
}

fn run_merge(
    output_dir: &Path,
    base: &str,
    start_segment: usize,
    end_segment: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let merger = TranscriptMerger::new(output_dir, base);
    let merged = merger.merge(start_segment, end_segment)?;
    log::info!("Merged transcript written to {}", merged.display());
    Ok(())
}

fn build_recognizer(
    model: Option<&Path>,
) -> Result<Box<dyn SpeechRecognizer>, Box<dyn std::error::Error>> {
    if model.is_none() {
        log::info!("Resolving model: {WHISPER_MODEL_NAME}");
    }
    let model_path = model_resolver::resolve_model(model, Some(Box::new(download_progress)))?;
    if model.is_none() {
        eprintln!();
    }
    Ok(Box::new(WhisperRecognizer::new(&model_path)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    // A merge-only pass reads existing transcripts; the video itself is only
    // used to derive the default output directory and base name.
    if !cli.merge_only && !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.whole && cli.merge_only {
        return Err("--whole and --merge-only are mutually exclusive".into());
    }
    if cli.segment_duration <= 0.0 {
        return Err(format!(
            "Segment duration must be positive, got {}",
            cli.segment_duration
        )
        .into());
    }
    if cli.start_from < 0.0 {
        return Err(format!("Start offset must not be negative, got {}", cli.start_from).into());
    }
    if cli.start_segment == Some(0) {
        return Err("Segment indices start at 1".into());
    }
    if cli.language.is_empty() {
        return Err("Language code must not be empty".into());
    }
    Ok(())
}

fn default_output_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_base(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".to_string())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading Whisper model... {pct}%");
    } else {
        eprint!("\rDownloading Whisper model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use vidscribe_core::transcription::domain::progress::ProgressEstimate;
    use vidscribe_core::transcription::domain::run_report::SegmentReport;
    use vidscribe_core::transcription::domain::segment_planner::SegmentWindow;

    fn report(index: usize, outcome: SegmentOutcome) -> SegmentReport {
        SegmentReport {
            window: SegmentWindow {
                index,
                start_secs: (index - 1) as f64 * 1200.0,
                duration_secs: 1200.0,
            },
            outcome,
            wall_secs: 1.0,
            progress: ProgressEstimate {
                percent: 50.0,
                eta_secs: 1.0,
            },
        }
    }

    fn ok(index: usize) -> SegmentReport {
        report(index, SegmentOutcome::Transcribed(PathBuf::from("out.txt")))
    }

    fn failed(index: usize) -> SegmentReport {
        report(index, SegmentOutcome::ExtractionFailed("codec".into()))
    }

    fn summary_of(reports: Vec<SegmentReport>) -> RunSummary {
        RunSummary {
            reports,
            elapsed_secs: 1.0,
        }
    }

    #[test]
    fn test_merge_range_follows_resumed_numbering() {
        // A run resumed at 1500s of a 3000s video with 1200s segments
        // produces windows 2 and 3; the merge must not assume segment 1.
        let summary = summary_of(vec![ok(2), ok(3)]);
        assert_eq!(merge_range(&summary, None, None), Some((2, Some(3))));
    }

    #[test]
    fn test_merge_range_skips_failed_leading_segment() {
        let summary = summary_of(vec![failed(1), ok(2), ok(3)]);
        assert_eq!(merge_range(&summary, None, None), Some((2, Some(3))));
    }

    #[test]
    fn test_merge_range_spans_failed_middle_segment() {
        // Bounds cover the whole run; the merger itself warns about the gap.
        let summary = summary_of(vec![ok(1), failed(2), ok(3)]);
        assert_eq!(merge_range(&summary, None, None), Some((1, Some(3))));
    }

    #[test]
    fn test_merge_range_nothing_transcribed() {
        let summary = summary_of(vec![failed(1), failed(2)]);
        assert_eq!(merge_range(&summary, None, None), None);
        assert_eq!(merge_range(&summary_of(Vec::new()), None, None), None);
    }

    #[test]
    fn test_merge_range_single_segment() {
        let summary = summary_of(vec![ok(4)]);
        assert_eq!(merge_range(&summary, None, None), Some((4, Some(4))));
    }

    #[test]
    fn test_merge_range_explicit_bounds_win() {
        let summary = summary_of(vec![ok(2), ok(3)]);
        assert_eq!(merge_range(&summary, Some(1), None), Some((1, None)));
        assert_eq!(
            merge_range(&summary, None, Some(5)),
            Some((2, Some(5)))
        );
    }

    #[test]
    fn test_validate_merge_only_without_input_file() {
        let cli = Cli::parse_from(["vidscribe", "gone.mp4", "--merge-only"]);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_validate_missing_input_still_fails_for_transcription() {
        let cli = Cli::parse_from(["vidscribe", "gone.mp4"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
