//! Coqui TTS backend using PyO3 to embed Python.
//!
//! The model is loaded once and reused for every chunk of the document.

use super::{Device, SpeechModel, SynthesisRequest, TtsError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::Path;

fn engine_error(e: PyErr) -> TtsError {
    TtsError::Engine(e.to_string())
}

/// Coqui TTS model resident in an embedded interpreter.
pub struct EmbeddedCoqui {
    model: Py<PyAny>,
    model_name: String,
    device: Device,
}

impl EmbeddedCoqui {
    /// Load `model_name` through `TTS.api.TTS`.
    pub fn load(model_name: &str, device: Device) -> Result<Self, TtsError> {
        log::info!("Loading {} on {}", model_name, device);

        let model = Python::with_gil(|py| -> PyResult<Py<PyAny>> {
            let api = py.import("TTS.api")?;
            let tts_class = api.getattr("TTS")?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("model_name", model_name)?;
            kwargs.set_item("progress_bar", false)?;
            kwargs.set_item("gpu", device == Device::Cuda)?;

            Ok(tts_class.call((), Some(&kwargs))?.unbind())
        })
        .map_err(engine_error)?;

        Ok(Self {
            model,
            model_name: model_name.to_string(),
            device,
        })
    }
}

impl SpeechModel for EmbeddedCoqui {
    fn synthesize(&self, request: &SynthesisRequest<'_>, output_path: &Path) -> Result<(), TtsError> {
        Python::with_gil(|py| -> PyResult<()> {
            let kwargs = PyDict::new(py);
            kwargs.set_item("text", request.text)?;
            kwargs.set_item("file_path", output_path.to_string_lossy().as_ref())?;

            if let Some(speaker) = request.speaker_wav {
                kwargs.set_item("speaker_wav", speaker.to_string_lossy().as_ref())?;
            }
            if let Some(language) = request.language {
                kwargs.set_item("language", language)?;
            }

            self.model
                .bind(py)
                .call_method("tts_to_file", (), Some(&kwargs))?;
            Ok(())
        })
        .map_err(engine_error)?;

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
