//! Audio format conversion using FFmpeg.

use super::wav::probe_wav;
use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Audio formats the normalizer accepts, by file extension.
pub const SUPPORTED_FORMATS: &[&str] = &["mp3", "m4a", "flac", "ogg", "wma", "aac", "wav"];

/// Lower-cased extension of a path, without the dot.
fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Check if a file extension is one the normalizer handles.
pub fn is_supported_format(path: &Path) -> bool {
    SUPPORTED_FORMATS.contains(&extension_of(path).as_str())
}

/// Build an FFmpeg command that overwrites its output.
fn ffmpeg_command(ffmpeg: &Path) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-y");
    cmd
}

fn run_ffmpeg(ffmpeg: &Path, cmd: &mut Command) -> Result<()> {
    let output = cmd
        .output()
        .map_err(|e| {
            PipelineError::Conversion(format!("Failed to run {}: {}", ffmpeg.display(), e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::Conversion(format!(
            "ffmpeg failed: {}",
            stderr.trim()
        )));
    }

    Ok(())
}

/// Convert a supported audio file to WAV.
///
/// A `.wav` input is returned unchanged. Other supported formats are decoded
/// and re-encoded to `output_path`, or next to the input with a `.wav`
/// extension when no output path is given.
pub fn normalize_to_wav(
    ffmpeg: &Path,
    input_path: &Path,
    output_path: Option<&Path>,
) -> Result<PathBuf> {
    let extension = extension_of(input_path);

    if !is_supported_format(input_path) {
        let shown = if extension.is_empty() {
            "(no extension)".to_string()
        } else {
            extension
        };
        return Err(PipelineError::UnsupportedFormat(shown));
    }

    if extension == "wav" {
        return Ok(input_path.to_path_buf());
    }

    let output_path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input_path.with_extension("wav"));

    run_ffmpeg(
        ffmpeg,
        ffmpeg_command(ffmpeg)
            .arg("-i")
            .arg(input_path)
            .arg("-vn")
            .arg(&output_path),
    )?;

    log::info!(
        "Converted {} to {}",
        input_path.display(),
        output_path.display()
    );
    Ok(output_path)
}

/// Resample a WAV file in place to `sample_rate`.
///
/// Returns `false` without running FFmpeg when the file already has that rate.
pub fn resample_wav(ffmpeg: &Path, path: &Path, sample_rate: u32) -> Result<bool> {
    let info = probe_wav(path).map_err(|e| PipelineError::Conversion(e.to_string()))?;
    if info.sample_rate == sample_rate {
        return Ok(false);
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = tempfile::Builder::new()
        .prefix(".resample-")
        .suffix(".wav")
        .tempfile_in(dir)?;

    run_ffmpeg(
        ffmpeg,
        ffmpeg_command(ffmpeg)
            .arg("-i")
            .arg(path)
            .arg("-ar")
            .arg(sample_rate.to_string())
            .arg(temp.path()),
    )?;

    temp.persist(path).map_err(|e| PipelineError::Io(e.error))?;
    log::info!(
        "Resampled {} from {} Hz to {} Hz",
        path.display(),
        info.sample_rate,
        sample_rate
    );
    Ok(true)
}

/// Check if FFmpeg is available at the given path.
pub fn is_ffmpeg_available(ffmpeg: &Path) -> bool {
    Command::new(ffmpeg)
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::write_test_wav;
    use tempfile::TempDir;

    const MISSING_FFMPEG: &str = "/nonexistent/bin/ffmpeg";

    #[test]
    fn test_wav_is_noop() {
        let path = Path::new("/some/where/voice.wav");
        let result = normalize_to_wav(Path::new(MISSING_FFMPEG), path, None).unwrap();
        assert_eq!(result, path);
    }

    #[test]
    fn test_wav_extension_case_insensitive() {
        let path = Path::new("voice.WAV");
        let result = normalize_to_wav(Path::new(MISSING_FFMPEG), path, None).unwrap();
        assert_eq!(result, path);
    }

    #[test]
    fn test_unsupported_format() {
        let result = normalize_to_wav(Path::new(MISSING_FFMPEG), Path::new("voice.xyz"), None);
        match result {
            Err(PipelineError::UnsupportedFormat(ext)) => assert_eq!(ext, "xyz"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_extension() {
        let result = normalize_to_wav(Path::new(MISSING_FFMPEG), Path::new("voice"), None);
        assert!(matches!(result, Err(PipelineError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_conversion_failure_without_ffmpeg() {
        let result = normalize_to_wav(Path::new(MISSING_FFMPEG), Path::new("voice.mp3"), None);
        assert!(matches!(result, Err(PipelineError::Conversion(_))));
    }

    #[test]
    fn test_is_supported_format() {
        assert!(is_supported_format(Path::new("a.M4A")));
        assert!(is_supported_format(Path::new("a.flac")));
        assert!(!is_supported_format(Path::new("a.pdf")));
        assert!(!is_supported_format(Path::new("a")));
    }

    #[test]
    fn test_resample_same_rate_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.wav");
        write_test_wav(&path, 22050, 100);

        let changed = resample_wav(Path::new(MISSING_FFMPEG), &path, 22050).unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_resample_without_ffmpeg_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.wav");
        write_test_wav(&path, 22050, 100);

        let result = resample_wav(Path::new(MISSING_FFMPEG), &path, 44100);
        assert!(matches!(result, Err(PipelineError::Conversion(_))));
        // Original survives a failed resample
        assert_eq!(probe_wav(&path).unwrap().sample_rate, 22050);
    }

    #[test]
    fn test_ffmpeg_available() {
        // This test just checks the function doesn't panic
        let _ = is_ffmpeg_available(Path::new("ffmpeg"));
        assert!(!is_ffmpeg_available(Path::new(MISSING_FFMPEG)));
    }
}
