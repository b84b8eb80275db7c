//! Coqui TTS backend driven through its `tts` command-line program.
//!
//! Each chunk is a separate process, so the model is loaded once per chunk.
//! Build with the `embedded-python` feature to keep one model resident.

use super::{Device, SpeechModel, SynthesisRequest, TtsError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Coqui TTS backend using the `tts` CLI.
pub struct CoquiCli {
    /// Path to the `tts` executable
    program: PathBuf,
    /// Coqui model identifier
    model_name: String,
    device: Device,
}

impl CoquiCli {
    pub fn new(program: impl Into<PathBuf>, model_name: impl Into<String>, device: Device) -> Self {
        Self {
            program: program.into(),
            model_name: model_name.into(),
            device,
        }
    }

    /// Build the command that renders one request.
    fn build_command(&self, request: &SynthesisRequest<'_>, output_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        // Joined so a chunk starting with '-' is not parsed as an option
        cmd.arg(format!("--text={}", request.text))
            .arg("--model_name")
            .arg(&self.model_name)
            .arg("--out_path")
            .arg(output_path)
            .args(["--progress_bar", "False"]);

        if self.device == Device::Cuda {
            cmd.args(["--use_cuda", "true"]);
        }

        if let Some(speaker) = request.speaker_wav {
            cmd.arg("--speaker_wav").arg(speaker);
        }

        if let Some(language) = request.language {
            cmd.arg("--language_idx").arg(language);
        }

        cmd
    }
}

impl SpeechModel for CoquiCli {
    fn synthesize(&self, request: &SynthesisRequest<'_>, output_path: &Path) -> Result<(), TtsError> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| TtsError::Engine(e.to_string()))?;
            }
        }

        log::debug!(
            "{} ({}): {} chars -> {}",
            self.model_name,
            self.device,
            request.text.len(),
            output_path.display()
        );

        let output = self
            .build_command(request, output_path)
            .output()
            .map_err(|source| TtsError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("unknown error");
            return Err(TtsError::Engine(format!(
                "tts exited with {}: {}",
                output.status,
                last_line.trim()
            )));
        }

        if !output_path.exists() {
            return Err(TtsError::MissingOutput(output_path.to_path_buf()));
        }

        Ok(())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn device(&self) -> Device {
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::{CLONING_MODEL, STANDARD_MODEL};
    use std::ffi::OsStr;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_standard_command() {
        let backend = CoquiCli::new("tts", STANDARD_MODEL, Device::Cpu);
        let cmd = backend.build_command(&SynthesisRequest::new("Hello world."), Path::new("out/0.wav"));

        assert_eq!(cmd.get_program(), OsStr::new("tts"));
        let args = args_of(&cmd);
        assert_eq!(
            args,
            vec![
                "--text=Hello world.",
                "--model_name",
                STANDARD_MODEL,
                "--out_path",
                "out/0.wav",
                "--progress_bar",
                "False",
            ]
        );
    }

    #[test]
    fn test_cloning_command_on_cuda() {
        let backend = CoquiCli::new("/opt/tts/bin/tts", CLONING_MODEL, Device::Cuda);
        let voice = Path::new("voice.wav");
        let request = SynthesisRequest::new("Hi").with_speaker(voice, "en");
        let args = args_of(&backend.build_command(&request, Path::new("o.wav")));

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("--use_cuda") + 1], "true");
        assert_eq!(args[pos("--speaker_wav") + 1], "voice.wav");
        assert_eq!(args[pos("--language_idx") + 1], "en");
        assert_eq!(args[pos("--model_name") + 1], CLONING_MODEL);
    }

    #[test]
    fn test_dash_leading_text_stays_one_argument() {
        let backend = CoquiCli::new("tts", STANDARD_MODEL, Device::Cpu);
        for text in ["-based", "--", "-- help"] {
            let args = args_of(&backend.build_command(&SynthesisRequest::new(text), Path::new("o.wav")));
            assert_eq!(args[0], format!("--text={}", text));
            assert_eq!(args[1], "--model_name");
            assert!(!args.iter().any(|a| a == text));
        }
    }

    #[test]
    fn test_missing_program() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let backend = CoquiCli::new("/nonexistent/bin/tts", STANDARD_MODEL, Device::Cpu);
        let result = backend.synthesize(
            &SynthesisRequest::new("Hello"),
            &temp_dir.path().join("out.wav"),
        );
        assert!(matches!(result, Err(TtsError::Launch { .. })));
    }

    #[test]
    fn test_accessors() {
        let backend = CoquiCli::new("tts", STANDARD_MODEL, Device::Cuda);
        assert_eq!(backend.model_name(), STANDARD_MODEL);
        assert_eq!(backend.device(), Device::Cuda);
    }
}
