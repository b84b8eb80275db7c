//! Audio file assembly: joins per-chunk WAV files in order.

use super::wav::{open_wav, probe_wav, AudioInfo};
use crate::error::{PipelineError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::BufWriter;
use std::path::Path;

fn assembly_error(path: &Path, e: hound::Error) -> PipelineError {
    PipelineError::Assembly(format!("{}: {}", path.display(), e))
}

/// Concatenate multiple WAV files into one.
///
/// All inputs must share one sample format, channel count and sample rate.
/// Samples are written to a temporary file next to the output, which only
/// replaces `output_path` once every input has been copied. A mismatched or
/// unreadable input leaves any existing output untouched.
pub fn concatenate_audio_files(audio_files: &[&Path], output_path: &Path) -> Result<AudioInfo> {
    if audio_files.is_empty() {
        return Err(PipelineError::Assembly("No audio files provided".to_string()));
    }

    let spec = open_wav(audio_files[0])
        .map_err(|e| assembly_error(audio_files[0], e))?
        .spec();

    for path in &audio_files[1..] {
        let other = open_wav(path).map_err(|e| assembly_error(path, e))?.spec();
        if !same_layout(&spec, &other) {
            return Err(PipelineError::Assembly(format!(
                "{} does not match the first chunk ({} Hz, {} ch, {} bit) vs ({} Hz, {} ch, {} bit)",
                path.display(),
                other.sample_rate,
                other.channels,
                other.bits_per_sample,
                spec.sample_rate,
                spec.channels,
                spec.bits_per_sample,
            )));
        }
    }

    let dir = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let temp = tempfile::Builder::new()
        .prefix(".combined-")
        .suffix(".wav")
        .tempfile_in(dir)?;

    let mut writer = WavWriter::new(BufWriter::new(temp.reopen()?), spec)
        .map_err(|e| assembly_error(temp.path(), e))?;

    for path in audio_files {
        let reader = open_wav(path).map_err(|e| assembly_error(path, e))?;
        match spec.sample_format {
            SampleFormat::Int => {
                for sample in reader.into_samples::<i32>() {
                    let sample = sample.map_err(|e| assembly_error(path, e))?;
                    writer
                        .write_sample(sample)
                        .map_err(|e| assembly_error(output_path, e))?;
                }
            }
            SampleFormat::Float => {
                for sample in reader.into_samples::<f32>() {
                    let sample = sample.map_err(|e| assembly_error(path, e))?;
                    writer
                        .write_sample(sample)
                        .map_err(|e| assembly_error(output_path, e))?;
                }
            }
        }
        log::debug!("Appended {}", path.display());
    }

    writer
        .finalize()
        .map_err(|e| assembly_error(output_path, e))?;

    temp.persist(output_path)
        .map_err(|e| PipelineError::Io(e.error))?;

    probe_wav(output_path).map_err(|e| assembly_error(output_path, e))
}

fn same_layout(a: &WavSpec, b: &WavSpec) -> bool {
    a.channels == b.channels
        && a.sample_rate == b.sample_rate
        && a.bits_per_sample == b.bits_per_sample
        && a.sample_format == b.sample_format
}
