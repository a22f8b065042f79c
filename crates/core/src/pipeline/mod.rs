pub mod transcribe_segments_use_case;
pub mod transcribe_video_use_case;
