use std::path::Path;

use crate::transcription::domain::audio_segment::AudioSegment;
use crate::video::domain::audio_writer::AudioWriter;

/// Writes decoded audio as 16-bit PCM WAV via hound.
pub struct WavAudioWriter;

impl AudioWriter for WavAudioWriter {
    fn write_audio(
        &self,
        path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let spec = hound::WavSpec {
            channels: audio.channels(),
            sample_rate: audio.sample_rate(),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)
            .map_err(|e| format!("Failed to create {}: {e}", path.display()))?;
        for &sample in audio.samples() {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;

        Ok(())
    }
}
