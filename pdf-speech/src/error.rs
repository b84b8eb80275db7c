use std::path::PathBuf;
use thiserror::Error;

use crate::tts::TtsError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to extract text from {}: {reason}", .path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("No text found in {}", .0.display())]
    NoText(PathBuf),

    #[error(
        "Invalid voice sample {}: {reason}. Try converting it to WAV, e.g. `ffmpeg -i sample.m4a sample.wav`",
        .path.display()
    )]
    InvalidVoiceSample { path: PathBuf, reason: String },

    #[error("Nothing to synthesize: text is empty")]
    NothingToSynthesize,

    #[error("Speech synthesis failed on chunk {chunk}: {source}")]
    Synthesis {
        chunk: usize,
        #[source]
        source: TtsError,
    },

    #[error("Audio assembly failed: {0}")]
    Assembly(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio conversion failed: {0}")]
    Conversion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
