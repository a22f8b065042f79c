pub mod audio_segment;
pub mod progress;
pub mod run_report;
pub mod segment_planner;
pub mod speech_recognizer;
pub mod transcript_merger;
