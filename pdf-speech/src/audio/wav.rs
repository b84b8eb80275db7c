//! WAV inspection and validation.

use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Basic facts about a WAV file, shown to the operator after conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioInfo {
    /// Duration in seconds
    pub duration_secs: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
}

impl std::fmt::Display for AudioInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Duration: {:.1}s, Sample Rate: {}Hz, Channels: {}",
            self.duration_secs, self.sample_rate, self.channels
        )
    }
}

pub(crate) fn open_wav(path: &Path) -> Result<WavReader<BufReader<File>>, hound::Error> {
    WavReader::open(path)
}

/// Read the header of a WAV file.
pub fn probe_wav(path: &Path) -> Result<AudioInfo, hound::Error> {
    let reader = open_wav(path)?;
    let spec = reader.spec();
    let frames = reader.duration();

    Ok(AudioInfo {
        duration_secs: frames as f64 / spec.sample_rate as f64,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Check that a file decodes as audio from header to last sample.
///
/// Returns the decode error message on failure.
pub fn validate_audio_file(path: &Path) -> Result<AudioInfo, String> {
    let reader = open_wav(path).map_err(|e| e.to_string())?;
    let spec = reader.spec();
    let frames = reader.duration();

    match spec.sample_format {
        SampleFormat::Int => {
            for sample in reader.into_samples::<i32>() {
                sample.map_err(|e| e.to_string())?;
            }
        }
        SampleFormat::Float => {
            for sample in reader.into_samples::<f32>() {
                sample.map_err(|e| e.to_string())?;
            }
        }
    }

    if frames == 0 {
        return Err("audio contains no samples".to_string());
    }

    Ok(AudioInfo {
        duration_secs: frames as f64 / spec.sample_rate as f64,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Write a mono 16-bit tone, used by tests across the crate.
#[cfg(test)]
pub(crate) fn write_test_wav(path: &Path, sample_rate: u32, frames: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let value = (t * 440.0 * 2.0 * std::f32::consts::PI).sin();
        writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_probe_wav() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");
        write_test_wav(&path, 22050, 11025);

        let info = probe_wav(&path).unwrap();
        assert_eq!(info.sample_rate, 22050);
        assert_eq!(info.channels, 1);
        assert!((info.duration_secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_validate_good_wav() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("voice.wav");
        write_test_wav(&path, 16000, 1600);
        assert!(validate_audio_file(&path).is_ok());
    }

    #[test]
    fn test_validate_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("voice.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(validate_audio_file(&path).is_err());
    }

    #[test]
    fn test_validate_missing_file() {
        assert!(validate_audio_file(Path::new("/nonexistent/voice.wav")).is_err());
    }

    #[test]
    fn test_validate_empty_wav() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.wav");
        write_test_wav(&path, 16000, 0);
        let err = validate_audio_file(&path).unwrap_err();
        assert!(err.contains("no samples"));
    }

    #[test]
    fn test_audio_info_display() {
        let info = AudioInfo {
            duration_secs: 12.34,
            sample_rate: 22050,
            channels: 1,
        };
        assert_eq!(info.to_string(), "Duration: 12.3s, Sample Rate: 22050Hz, Channels: 1");
    }
}
