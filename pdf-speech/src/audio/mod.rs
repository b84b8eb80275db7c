//! Audio handling: chunk assembly, format normalization and WAV inspection.

pub mod assembler;
pub mod convert;
pub mod wav;

pub use assembler::concatenate_audio_files;
pub use convert::{normalize_to_wav, resample_wav};
pub use wav::{probe_wav, validate_audio_file, AudioInfo};
