use std::fs;
use std::path::{Path, PathBuf};

/// File name for one per-segment transcript.
pub fn segment_file_name(base: &str, index: usize) -> String {
    format!("{base}_segment_{index}.txt")
}

/// File name for the merged transcript.
pub fn merged_file_name(base: &str) -> String {
    format!("{base}_merged.txt")
}

/// Concatenates per-segment transcript files into one merged file.
///
/// Operates purely on the directory and naming convention, so it can run
/// long after (and independently of) the transcription pass that produced
/// the segment files. Segment files are left in place.
pub struct TranscriptMerger {
    dir: PathBuf,
    base: String,
}

impl TranscriptMerger {
    pub fn new(dir: &Path, base: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            base: base.to_string(),
        }
    }

    fn segment_path(&self, index: usize) -> PathBuf {
        self.dir.join(segment_file_name(&self.base, index))
    }

    /// Probe upward from `start_segment` until the first missing file.
    /// Returns the last existing index, or None if the start itself is missing.
    pub fn detect_end(&self, start_segment: usize) -> Option<usize> {
        let mut index = start_segment;
        while self.segment_path(index).exists() {
            index += 1;
        }
        if index == start_segment {
            None
        } else {
            Some(index - 1)
        }
    }

    /// Merge segments `[start_segment, end_segment]` in ascending order.
    ///
    /// With no explicit end the range runs to the last contiguous file found
    /// by [`detect_end`](Self::detect_end). Each present segment contributes a
    /// `=== Segment N ===` header, its trimmed contents, and a blank line;
    /// absent segments inside the range are logged and skipped. Any existing
    /// merged file is overwritten.
    pub fn merge(
        &self,
        start_segment: usize,
        end_segment: Option<usize>,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let end = match end_segment.or_else(|| self.detect_end(start_segment)) {
            Some(end) => end,
            None => {
                return Err(format!(
                    "No segment files found in {} starting at segment {}",
                    self.dir.display(),
                    start_segment
                )
                .into())
            }
        };

        let mut merged = String::new();
        for index in start_segment..=end {
            let path = self.segment_path(index);
            if !path.exists() {
                log::warn!("Segment {index} missing, skipping: {}", path.display());
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            merged.push_str(&format!("=== Segment {index} ===\n"));
            merged.push_str(contents.trim());
            merged.push_str("\n\n");
        }

        let out_path = self.dir.join(merged_file_name(&self.base));
        fs::write(&out_path, merged)?;
        Ok(out_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_segment(dir: &Path, base: &str, index: usize, text: &str) {
        fs::write(dir.join(segment_file_name(base, index)), text).unwrap();
    }

    #[test]
    fn test_file_naming() {
        assert_eq!(segment_file_name("talk", 7), "talk_segment_7.txt");
        assert_eq!(merged_file_name("talk"), "talk_merged.txt");
    }

    #[test]
    fn test_detect_end_stops_at_first_gap() {
        let tmp = TempDir::new().unwrap();
        for i in 1..=3 {
            write_segment(tmp.path(), "talk", i, "text");
        }
        write_segment(tmp.path(), "talk", 5, "after the gap");

        let merger = TranscriptMerger::new(tmp.path(), "talk");
        assert_eq!(merger.detect_end(1), Some(3));
    }

    #[test]
    fn test_detect_end_missing_start_returns_none() {
        let tmp = TempDir::new().unwrap();
        let merger = TranscriptMerger::new(tmp.path(), "talk");
        assert_eq!(merger.detect_end(1), None);
    }

    #[test]
    fn test_merge_auto_end_concatenates_in_order() {
        let tmp = TempDir::new().unwrap();
        write_segment(tmp.path(), "talk", 1, "first\n");
        write_segment(tmp.path(), "talk", 2, "  second  ");
        write_segment(tmp.path(), "talk", 3, "third");

        let merger = TranscriptMerger::new(tmp.path(), "talk");
        let out = merger.merge(1, None).unwrap();

        let merged = fs::read_to_string(out).unwrap();
        assert_eq!(
            merged,
            "=== Segment 1 ===\nfirst\n\n=== Segment 2 ===\nsecond\n\n=== Segment 3 ===\nthird\n\n"
        );
    }

    #[test]
    fn test_merge_explicit_end_skips_missing_middle() {
        let tmp = TempDir::new().unwrap();
        write_segment(tmp.path(), "talk", 1, "one");
        write_segment(tmp.path(), "talk", 3, "three");

        let merger = TranscriptMerger::new(tmp.path(), "talk");
        let out = merger.merge(1, Some(3)).unwrap();

        let merged = fs::read_to_string(out).unwrap();
        assert!(merged.contains("=== Segment 1 ===\none"));
        assert!(!merged.contains("=== Segment 2 ==="));
        assert!(merged.contains("=== Segment 3 ===\nthree"));
    }

    #[test]
    fn test_merge_from_later_start_index() {
        let tmp = TempDir::new().unwrap();
        for i in 1..=4 {
            write_segment(tmp.path(), "talk", i, &format!("part {i}"));
        }

        let merger = TranscriptMerger::new(tmp.path(), "talk");
        let out = merger.merge(3, None).unwrap();

        let merged = fs::read_to_string(out).unwrap();
        assert!(!merged.contains("=== Segment 1 ==="));
        assert!(!merged.contains("=== Segment 2 ==="));
        assert!(merged.contains("=== Segment 3 ===\npart 3"));
        assert!(merged.contains("=== Segment 4 ===\npart 4"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        write_segment(tmp.path(), "talk", 1, "alpha");
        write_segment(tmp.path(), "talk", 2, "beta");

        let merger = TranscriptMerger::new(tmp.path(), "talk");
        let first = fs::read(merger.merge(1, None).unwrap()).unwrap();
        let second = fs::read(merger.merge(1, None).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_overwrites_stale_output() {
        let tmp = TempDir::new().unwrap();
        write_segment(tmp.path(), "talk", 1, "fresh");
        fs::write(tmp.path().join(merged_file_name("talk")), "stale contents").unwrap();

        let merger = TranscriptMerger::new(tmp.path(), "talk");
        let out = merger.merge(1, None).unwrap();

        let merged = fs::read_to_string(out).unwrap();
        assert!(merged.contains("fresh"));
        assert!(!merged.contains("stale"));
    }

    #[test]
    fn test_merge_without_any_segments_errors() {
        let tmp = TempDir::new().unwrap();
        let merger = TranscriptMerger::new(tmp.path(), "talk");
        assert!(merger.merge(1, None).is_err());
    }

    #[test]
    fn test_merge_leaves_segment_files_in_place() {
        let tmp = TempDir::new().unwrap();
        write_segment(tmp.path(), "talk", 1, "keep me");

        let merger = TranscriptMerger::new(tmp.path(), "talk");
        merger.merge(1, None).unwrap();

        assert!(tmp.path().join(segment_file_name("talk", 1)).exists());
    }
}
