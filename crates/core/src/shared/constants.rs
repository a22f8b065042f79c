pub const WHISPER_MODEL_NAME: &str = "ggml-large-v3.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3.bin";

/// Whisper expects 16 kHz mono PCM input.
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Default window length for segmented transcription (20 minutes).
pub const DEFAULT_SEGMENT_DURATION: f64 = 1200.0;

pub const DEFAULT_LANGUAGE: &str = "zh";
