use std::path::Path;

use crate::shared::media_info::MediaInfo;
use crate::transcription::domain::audio_segment::AudioSegment;
use crate::video::domain::audio_reader::AudioReader;

/// Probes and decodes audio from a video file using ffmpeg-next.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn probe(&self, path: &Path) -> Result<MediaInfo, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let raw_duration = ictx.duration();
        let duration_secs = if raw_duration > 0 {
            raw_duration as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        };
        let has_audio = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .is_some();

        Ok(MediaInfo {
            duration_secs,
            has_audio,
            source_path: Some(path.to_path_buf()),
        })
    }

    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;

        let audio_stream = match ictx.streams().best(ffmpeg_next::media::Type::Audio) {
            Some(stream) => stream,
            None => return Ok(None),
        };

        let audio_stream_index = audio_stream.index();
        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
        let mut decoder = codec_ctx.decoder().audio()?;
        let mut resampler = make_mono_resampler(&decoder, target_sample_rate)?;

        let mut all_samples: Vec<f32> = Vec::new();
        let mut decoded_frame = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled_frame = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                resampler.run(&decoded_frame, &mut resampled_frame)?;
                extract_f32_samples(&resampled_frame, &mut all_samples);
            }
        }

        flush(
            &mut decoder,
            &mut resampler,
            &mut decoded_frame,
            &mut resampled_frame,
            &mut all_samples,
        )?;

        Ok(Some(AudioSegment::new(all_samples, target_sample_rate, 1)))
    }

    fn read_audio_range(
        &self,
        path: &Path,
        start_secs: f64,
        duration_secs: f64,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;

        let (audio_stream_index, time_base) =
            match ictx.streams().best(ffmpeg_next::media::Type::Audio) {
                Some(stream) => (stream.index(), f64::from(stream.time_base())),
                None => return Ok(None),
            };

        // Seek lands at the nearest keyframe at or before the window start;
        // the surplus lead-in is trimmed at the sample level below.
        let seek_target =
            (start_secs * ffmpeg_next::ffi::AV_TIME_BASE as f64) as i64;
        if seek_target > 0 {
            ictx.seek(seek_target, ..seek_target)?;
        }

        let stream = ictx
            .streams()
            .find(|s| s.index() == audio_stream_index)
            .ok_or("Audio stream disappeared after seek")?;
        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().audio()?;
        let mut resampler = make_mono_resampler(&decoder, target_sample_rate)?;

        let needed = (duration_secs * target_sample_rate as f64).round() as usize;
        let mut origin_secs: Option<f64> = None;
        let mut all_samples: Vec<f32> = Vec::new();
        let mut decoded_frame = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled_frame = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }

            if origin_secs.is_none() {
                origin_secs = packet.pts().map(|pts| pts as f64 * time_base);
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                resampler.run(&decoded_frame, &mut resampled_frame)?;
                extract_f32_samples(&resampled_frame, &mut all_samples);
            }

            let skip = lead_in_samples(origin_secs, start_secs, target_sample_rate);
            if all_samples.len() >= skip + needed {
                break;
            }
        }

        let skip = lead_in_samples(origin_secs, start_secs, target_sample_rate);
        if all_samples.len() < skip + needed {
            flush(
                &mut decoder,
                &mut resampler,
                &mut decoded_frame,
                &mut resampled_frame,
                &mut all_samples,
            )?;
        }

        let from = skip.min(all_samples.len());
        let to = (skip + needed).min(all_samples.len());

        Ok(Some(AudioSegment::new(
            all_samples[from..to].to_vec(),
            target_sample_rate,
            1,
        )))
    }
}

/// Samples to drop from the decoded output so it begins at `start_secs`.
///
/// `origin_secs` is the presentation time of the first packet after seeking;
/// without pts information the decode is assumed to begin at the target.
fn lead_in_samples(origin_secs: Option<f64>, start_secs: f64, sample_rate: u32) -> usize {
    match origin_secs {
        Some(origin) if origin < start_secs => {
            ((start_secs - origin) * sample_rate as f64) as usize
        }
        _ => 0,
    }
}

fn make_mono_resampler(
    decoder: &ffmpeg_next::decoder::Audio,
    target_sample_rate: u32,
) -> Result<ffmpeg_next::software::resampling::Context, ffmpeg_next::Error> {
    ffmpeg_next::software::resampling::Context::get(
        decoder.format(),
        decoder.channel_layout(),
        decoder.rate(),
        ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
        ffmpeg_next::ChannelLayout::MONO,
        target_sample_rate,
    )
}

/// Drain the decoder and resampler at end of stream.
fn flush(
    decoder: &mut ffmpeg_next::decoder::Audio,
    resampler: &mut ffmpeg_next::software::resampling::Context,
    decoded_frame: &mut ffmpeg_next::util::frame::audio::Audio,
    resampled_frame: &mut ffmpeg_next::util::frame::audio::Audio,
    out: &mut Vec<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    decoder.send_eof()?;
    while decoder.receive_frame(decoded_frame).is_ok() {
        resampler.run(decoded_frame, resampled_frame)?;
        extract_f32_samples(resampled_frame, out);
    }

    // The resampler may have buffered samples of its own
    if let Ok(Some(delay)) = resampler.flush(resampled_frame) {
        if delay.output > 0 {
            extract_f32_samples(resampled_frame, out);
        }
    }

    Ok(())
}

/// Extract f32 samples from a planar mono resampled frame.
fn extract_f32_samples(frame: &ffmpeg_next::util::frame::audio::Audio, out: &mut Vec<f32>) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    let data = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
    out.extend_from_slice(floats);
}
