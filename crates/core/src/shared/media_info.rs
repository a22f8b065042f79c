use std::path::PathBuf;

/// Container-level metadata read when probing a media file.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    pub duration_secs: f64,
    pub has_audio: bool,
    pub source_path: Option<PathBuf>,
}
