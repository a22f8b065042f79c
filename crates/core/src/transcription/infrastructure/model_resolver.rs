use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{WHISPER_MODEL_NAME, WHISPER_MODEL_URL};

/// Leading bytes of every ggml model file ("lmgg" on disk).
const GGML_MAGIC: u32 = 0x6767_6d6c;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("{path} is not a ggml model file")]
    BadMagic { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve the Whisper ggml model to transcribe with.
///
/// An explicit path must exist and carry the ggml magic. Without one, the
/// per-user cache is consulted and [`WHISPER_MODEL_NAME`] is downloaded from
/// [`WHISPER_MODEL_URL`] on a miss. Every returned path has been
/// magic-checked, so a truncated or HTML-error download never reaches the
/// Whisper loader.
pub fn resolve_model(
    explicit: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ModelResolveError::NotFound(path.to_path_buf()));
        }
        verify_ggml(path)?;
        return Ok(path.to_path_buf());
    }

    let cache_dir = model_cache_dir()?;
    let cached_path = cache_dir.join(WHISPER_MODEL_NAME);
    if cached_path.exists() {
        verify_ggml(&cached_path)?;
        return Ok(cached_path);
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(WHISPER_MODEL_URL, &cached_path, progress)?;
    if let Err(e) = verify_ggml(&cached_path) {
        // Do not leave a bad artifact where the next run would trust it
        let _ = fs::remove_file(&cached_path);
        return Err(e);
    }
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Vidscribe/models/`
/// - Linux: `$XDG_CACHE_HOME/Vidscribe/models/` or `~/.cache/Vidscribe/models/`
/// - Windows: `%LOCALAPPDATA%/Vidscribe/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Vidscribe").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Vidscribe").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn verify_ggml(path: &Path) -> Result<(), ModelResolveError> {
    let mut file = fs::File::open(path).map_err(|e| ModelResolveError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)
        .map_err(|e| ModelResolveError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
    if u32::from_le_bytes(magic) != GGML_MAGIC {
        return Err(ModelResolveError::BadMagic {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Download to a `.part` sibling and rename into place, so an interrupted
/// transfer never masquerades as a complete model.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = fetch_to(url, &temp_path, progress.as_ref()).and_then(|_| {
        fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
            path: dest.to_path_buf(),
            source: e,
        })
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn fetch_to(
    url: &str,
    temp_path: &Path,
    progress: Option<&ProgressFn>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let file = fs::File::create(temp_path).map_err(|e| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    })?;

    // Stream through a counting writer; ggml models run from ~75MB (tiny)
    // to ~3GB (large) and must not be buffered whole in memory.
    let mut sink = ProgressWriter {
        file,
        downloaded: 0,
        total,
        progress,
    };
    io::copy(&mut response, &mut sink).map_err(|e| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    })?;
    sink.file.flush().map_err(|e| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// File writer that reports cumulative bytes to the progress callback.
struct ProgressWriter<'a> {
    file: fs::File,
    downloaded: u64,
    total: u64,
    progress: Option<&'a ProgressFn>,
}

impl Write for ProgressWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.downloaded += n as u64;
        if let Some(cb) = self.progress {
            cb(self.downloaded, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_ggml_stub(path: &Path) {
        let mut bytes = GGML_MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_explicit_path_missing_is_not_found() {
        let result = resolve_model(Some(Path::new("/nonexistent/ggml-large-v3.bin")), None);
        assert!(matches!(result, Err(ModelResolveError::NotFound(_))));
    }

    #[test]
    fn test_explicit_path_with_magic_is_returned_as_is() {
        let tmp = TempDir::new().unwrap();
        let model = tmp.path().join("ggml-custom.bin");
        write_ggml_stub(&model);

        let resolved = resolve_model(Some(&model), None).unwrap();
        assert_eq!(resolved, model);
    }

    #[test]
    fn test_explicit_path_without_magic_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let model = tmp.path().join("not-a-model.bin");
        fs::write(&model, b"<html>404 not found</html>").unwrap();

        let result = resolve_model(Some(&model), None);
        assert!(matches!(result, Err(ModelResolveError::BadMagic { .. })));
    }

    #[test]
    fn test_verify_ggml_truncated_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let model = tmp.path().join("empty.bin");
        fs::write(&model, b"gg").unwrap();

        let result = verify_ggml(&model);
        assert!(matches!(result, Err(ModelResolveError::Read { .. })));
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let dir = model_cache_dir();
        assert!(dir.is_ok());
        let path = dir.unwrap();
        assert!(path.to_string_lossy().contains("Vidscribe"));
        assert!(path.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let _ = download("http://invalid.nonexistent.example.com/model", &dest, None);
        // Neither the dest nor the .part file should exist after failure
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
