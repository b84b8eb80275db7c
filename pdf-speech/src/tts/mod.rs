//! TTS model trait and types.

pub mod coqui;
#[cfg(feature = "embedded-python")]
pub mod embedded;
pub mod pipeline;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

pub use pipeline::{synthesize_cloned, synthesize_standard};

/// Single-speaker English model used for the standard voice.
pub const STANDARD_MODEL: &str = "tts_models/en/ljspeech/tacotron2-DDC";

/// Multi-speaker model that conditions on a reference voice sample.
pub const CLONING_MODEL: &str = "tts_models/multilingual/multi-dataset/your_tts";

/// Language tag passed to the cloning model.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Errors raised by a speech model while rendering one chunk.
#[derive(Error, Debug)]
pub enum TtsError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TTS engine error: {0}")]
    Engine(String),

    #[error("TTS engine produced no audio at {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Compute device for synthesis, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cuda,
    Cpu,
}

impl Device {
    /// Pick CUDA when an NVIDIA GPU is visible, otherwise CPU.
    pub fn detect() -> Self {
        let has_gpu = Command::new("nvidia-smi")
            .arg("-L")
            .output()
            .map(|o| o.status.success() && !o.stdout.is_empty())
            .unwrap_or(false);

        if has_gpu { Device::Cuda } else { Device::Cpu }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Cpu => "cpu",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pretrained model renders the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Fixed pretrained voice, no sample needed
    Standard,
    /// Voice cloned from a reference sample
    Cloning,
}

impl ModelKind {
    /// Coqui model identifier.
    pub fn model_name(&self) -> &'static str {
        match self {
            ModelKind::Standard => STANDARD_MODEL,
            ModelKind::Cloning => CLONING_MODEL,
        }
    }

    /// Prefix of the final audio file name.
    pub fn output_prefix(&self) -> &'static str {
        match self {
            ModelKind::Standard => "standard_",
            ModelKind::Cloning => "cloned_",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::Standard => "Tacotron2 (Standard)",
            ModelKind::Cloning => "YourTTS (Voice Cloning)",
        }
    }
}

/// One chunk of text to render, plus the speaker conditioning for cloning.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    /// Reference voice sample to clone
    pub speaker_wav: Option<&'a Path>,
    /// Target language for multilingual models
    pub language: Option<&'a str>,
}

impl<'a> SynthesisRequest<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            speaker_wav: None,
            language: None,
        }
    }

    /// Condition the model on a voice sample in the given language.
    pub fn with_speaker(mut self, speaker_wav: &'a Path, language: &'a str) -> Self {
        self.speaker_wav = Some(speaker_wav);
        self.language = Some(language);
        self
    }
}

/// A pretrained text-to-speech model.
pub trait SpeechModel {
    /// Render one chunk of text to a WAV file at `output_path`.
    fn synthesize(&self, request: &SynthesisRequest<'_>, output_path: &Path) -> Result<(), TtsError>;

    /// Model identifier, for display.
    fn model_name(&self) -> &str;

    /// Device the model runs on.
    fn device(&self) -> Device;
}

/// Create the speech model for `kind` on `device`.
///
/// With the `embedded-python` feature the model is loaded once in-process;
/// otherwise each chunk runs the Coqui `tts` command at `tts_program`.
#[cfg(not(feature = "embedded-python"))]
pub fn create_model(
    kind: ModelKind,
    device: Device,
    tts_program: &Path,
) -> Result<Box<dyn SpeechModel>, TtsError> {
    Ok(Box::new(coqui::CoquiCli::new(
        tts_program,
        kind.model_name(),
        device,
    )))
}

#[cfg(feature = "embedded-python")]
pub fn create_model(
    kind: ModelKind,
    device: Device,
    _tts_program: &Path,
) -> Result<Box<dyn SpeechModel>, TtsError> {
    Ok(Box::new(embedded::EmbeddedCoqui::load(
        kind.model_name(),
        device,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_names() {
        assert_eq!(ModelKind::Standard.model_name(), STANDARD_MODEL);
        assert_eq!(ModelKind::Cloning.model_name(), CLONING_MODEL);
        assert_eq!(ModelKind::Standard.output_prefix(), "standard_");
        assert_eq!(ModelKind::Cloning.output_prefix(), "cloned_");
    }

    #[test]
    fn test_device_detect() {
        // This test just checks the function doesn't panic
        let device = Device::detect();
        assert!(device == Device::Cuda || device == Device::Cpu);
    }

    #[test]
    fn test_device_display() {
        assert_eq!(Device::Cuda.to_string(), "cuda");
        assert_eq!(Device::Cpu.to_string(), "cpu");
    }

    #[test]
    fn test_request_builder() {
        let voice = Path::new("voice.wav");
        let request = SynthesisRequest::new("Hello").with_speaker(voice, DEFAULT_LANGUAGE);
        assert_eq!(request.text, "Hello");
        assert_eq!(request.speaker_wav, Some(voice));
        assert_eq!(request.language, Some("en"));
    }

    #[test]
    fn test_model_kind_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            model: ModelKind,
            device: Device,
        }
        let parsed: Wrapper = toml::from_str("model = \"standard\"\ndevice = \"cuda\"").unwrap();
        assert_eq!(parsed.model, ModelKind::Standard);
        assert_eq!(parsed.device, Device::Cuda);
    }
}
