use std::path::Path;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::transcription::domain::speech_recognizer::SpeechRecognizer;

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// The model is loaded once at construction and shared read-only across
/// calls; each transcription gets its own inference state.
pub struct WhisperRecognizer {
    ctx: WhisperContext,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }
        let ctx = WhisperContext::new_with_params(
            model_path.to_str().ok_or("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| format!("Failed to load Whisper model: {e}"))?;
        Ok(Self { ctx })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe_file(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let samples = read_wav_mono(audio_path)?;

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 0 });
        params.set_language(Some(language));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_cpus().min(4) as i32);

        state
            .full(params, &samples)
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let mut text = String::new();
        let num_segments = state.full_n_segments();
        for seg_idx in 0..num_segments {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };
            match segment.to_str() {
                Ok(t) => text.push_str(t),
                Err(_) => continue,
            }
        }

        Ok(text)
    }
}

/// Read a 16 kHz WAV into mono f32 samples, downmixing by channel average.
fn read_wav_mono(path: &Path) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let spec = reader.spec();

    if spec.sample_rate != WHISPER_SAMPLE_RATE {
        return Err(format!(
            "Expected {WHISPER_SAMPLE_RATE} Hz audio, got {} Hz",
            spec.sample_rate
        )
        .into());
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<Result<_, _>>()?,
    };

    if spec.channels <= 1 {
        return Ok(interleaved);
    }

    let channels = spec.channels as usize;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect())
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
