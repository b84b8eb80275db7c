//! Chunk → synthesize → concatenate for one document.

use super::{SpeechModel, SynthesisRequest};
use crate::audio::{concatenate_audio_files, validate_audio_file, AudioInfo};
use crate::error::{PipelineError, Result};
use crate::text::chunk_document;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Reference voice and language for a cloning run.
struct Speaker<'a> {
    sample: &'a Path,
    language: &'a str,
}

fn progress_bar(total: usize, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message);
    pb
}

/// Render `text` chunk by chunk and write the joined audio to `output_path`.
///
/// Chunk files live in a temporary directory next to the output that is
/// removed on every return path.
fn render_document(
    model: &dyn SpeechModel,
    text: &str,
    speaker: Option<Speaker<'_>>,
    output_path: &Path,
    chunk_size: usize,
    message: &'static str,
) -> Result<AudioInfo> {
    let chunks = chunk_document(text, chunk_size);
    if chunks.is_empty() {
        return Err(PipelineError::NothingToSynthesize);
    }

    let parent = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let work_dir = tempfile::Builder::new()
        .prefix(".chunks-")
        .tempdir_in(parent)?;

    log::info!(
        "Synthesizing {} chunk(s) with {} on {}",
        chunks.len(),
        model.model_name(),
        model.device()
    );

    let pb = progress_bar(chunks.len(), message);
    let mut chunk_files = Vec::with_capacity(chunks.len());

    for chunk in &chunks {
        let chunk_path = work_dir.path().join(format!("chunk_{:05}.wav", chunk.index));

        let mut request = SynthesisRequest::new(&chunk.text);
        if let Some(ref speaker) = speaker {
            request = request.with_speaker(speaker.sample, speaker.language);
        }

        model
            .synthesize(&request, &chunk_path)
            .map_err(|source| PipelineError::Synthesis {
                chunk: chunk.index,
                source,
            })?;

        chunk_files.push(chunk_path);
        pb.inc(1);
    }

    pb.finish_and_clear();

    let refs: Vec<&Path> = chunk_files.iter().map(|p| p.as_path()).collect();
    let info = concatenate_audio_files(&refs, output_path)?;

    log::info!("Audio saved: {} ({})", output_path.display(), info);
    Ok(info)
}

/// Synthesize `text` in the model's standard voice.
///
/// Writes `<output_dir>/<base_name>.wav` and returns its path.
pub fn synthesize_standard(
    model: &dyn SpeechModel,
    text: &str,
    base_name: &str,
    output_dir: &Path,
    chunk_size: usize,
) -> Result<PathBuf> {
    let output_path = output_dir.join(format!("{}.wav", base_name));
    render_document(
        model,
        text,
        None,
        &output_path,
        chunk_size,
        "Generating audio",
    )?;
    Ok(output_path)
}

/// Synthesize `text` in a voice cloned from `voice_sample`.
///
/// The sample is decoded first; an undecodable sample fails with
/// [`PipelineError::InvalidVoiceSample`] before the model is touched.
pub fn synthesize_cloned(
    model: &dyn SpeechModel,
    text: &str,
    voice_sample: &Path,
    output_path: &Path,
    chunk_size: usize,
    language: &str,
) -> Result<PathBuf> {
    let sample_info =
        validate_audio_file(voice_sample).map_err(|reason| PipelineError::InvalidVoiceSample {
            path: voice_sample.to_path_buf(),
            reason,
        })?;
    log::debug!("Voice sample {}: {}", voice_sample.display(), sample_info);

    let speaker = Speaker {
        sample: voice_sample,
        language,
    };
    render_document(
        model,
        text,
        Some(speaker),
        output_path,
        chunk_size,
        "Cloning voice",
    )?;
    Ok(output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::write_test_wav;
    use crate::tts::{Device, TtsError, DEFAULT_LANGUAGE};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const FRAMES_PER_CHUNK: u32 = 220;

    /// Records every request and writes a short tone per chunk.
    struct MockModel {
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
        seen: Mutex<Vec<(String, Option<PathBuf>, Option<String>)>>,
    }

    impl MockModel {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on_call: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::new()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SpeechModel for MockModel {
        fn synthesize(&self, request: &SynthesisRequest<'_>, output_path: &Path) -> std::result::Result<(), TtsError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((
                request.text.to_string(),
                request.speaker_wav.map(Path::to_path_buf),
                request.language.map(str::to_string),
            ));
            if self.fail_on_call == Some(call) {
                return Err(TtsError::Engine("out of memory".to_string()));
            }
            write_test_wav(output_path, 22050, FRAMES_PER_CHUNK);
            Ok(())
        }

        fn model_name(&self) -> &str {
            "mock"
        }

        fn device(&self) -> Device {
            Device::Cpu
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_hello_world_single_call() {
        let temp_dir = TempDir::new().unwrap();
        let model = MockModel::new();

        let path = synthesize_standard(&model, "Hello world.", "standard_hello", temp_dir.path(), 1000)
            .unwrap();

        assert_eq!(path, temp_dir.path().join("standard_hello.wav"));
        assert_eq!(model.call_count(), 1);
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0], ("Hello world.".to_string(), None, None));
    }

    #[test]
    fn test_chunks_rendered_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let model = MockModel::new();

        let path = synthesize_standard(&model, "one two three four five", "out", temp_dir.path(), 10)
            .unwrap();

        assert_eq!(model.call_count(), 3);
        let texts: Vec<String> = model.seen.lock().unwrap().iter().map(|s| s.0.clone()).collect();
        assert_eq!(texts, vec!["one two", "three four", "five"]);

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 3 * FRAMES_PER_CHUNK);
    }

    #[test]
    fn test_temp_files_removed_on_success() {
        let temp_dir = TempDir::new().unwrap();
        let model = MockModel::new();

        synthesize_standard(&model, "one two three four five", "out", temp_dir.path(), 10).unwrap();

        assert_eq!(dir_entries(temp_dir.path()), vec!["out.wav"]);
    }

    #[test]
    fn test_failure_aborts_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let model = MockModel::failing_on(1);

        let result = synthesize_standard(&model, "one two three four five", "out", temp_dir.path(), 10);

        match result {
            Err(PipelineError::Synthesis { chunk, .. }) => assert_eq!(chunk, 1),
            other => panic!("expected synthesis failure, got {:?}", other),
        }
        // No further chunks after the failing one
        assert_eq!(model.call_count(), 2);
        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_empty_text() {
        let temp_dir = TempDir::new().unwrap();
        let model = MockModel::new();

        let result = synthesize_standard(&model, "   ", "out", temp_dir.path(), 1000);
        assert!(matches!(result, Err(PipelineError::NothingToSynthesize)));
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn test_cloned_passes_speaker_and_language() {
        let temp_dir = TempDir::new().unwrap();
        let voice = temp_dir.path().join("voice.wav");
        write_test_wav(&voice, 16000, 1600);
        let output = temp_dir.path().join("output").join("cloned_book.wav");
        let model = MockModel::new();

        let path = synthesize_cloned(
            &model,
            "one two three four five",
            &voice,
            &output,
            10,
            DEFAULT_LANGUAGE,
        )
        .unwrap();

        assert_eq!(path, output);
        assert!(output.exists());
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        for (_, speaker, language) in seen.iter() {
            assert_eq!(speaker.as_deref(), Some(voice.as_path()));
            assert_eq!(language.as_deref(), Some("en"));
        }
        assert_eq!(dir_entries(&temp_dir.path().join("output")), vec!["cloned_book.wav"]);
    }

    #[test]
    fn test_cloned_rejects_bad_sample_without_model_call() {
        let temp_dir = TempDir::new().unwrap();
        let voice = temp_dir.path().join("voice.wav");
        std::fs::write(&voice, b"ID3 not really a wav").unwrap();
        let model = MockModel::new();

        let result = synthesize_cloned(
            &model,
            "Hello world.",
            &voice,
            &temp_dir.path().join("cloned.wav"),
            1000,
            DEFAULT_LANGUAGE,
        );

        match result {
            Err(PipelineError::InvalidVoiceSample { path, .. }) => assert_eq!(path, voice),
            other => panic!("expected invalid voice sample, got {:?}", other),
        }
        assert_eq!(model.call_count(), 0);
    }
}
