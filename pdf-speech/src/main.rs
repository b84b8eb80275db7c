//! pdf-speech - Convert PDF documents to speech, optionally cloning a reference voice

mod audio;
mod config;
mod error;
mod pdf;
mod text;
mod tts;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::PdfSpeechConfig;
use indicatif::ProgressBar;
use pdf::{PopplerBackend, TextPreview};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tts::{Device, ModelKind};

#[derive(Parser, Debug)]
#[command(name = "pdf-speech")]
#[command(about = "Convert PDF documents to speech, optionally cloning a reference voice", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF file
    pdf_file: Option<PathBuf>,

    /// Voice sample to clone (mp3, m4a, flac, ogg, wma, aac or wav)
    #[arg(long)]
    voice: Option<PathBuf>,

    /// TTS model to use
    #[arg(long, value_enum)]
    model: Option<ModelKind>,

    /// Maximum words to read from the PDF (10-10000, default 1000)
    #[arg(long)]
    max_words: Option<usize>,

    /// Read the whole PDF, ignoring the word limit
    #[arg(long, conflicts_with = "max_words")]
    all_words: bool,

    /// Maximum characters per synthesized chunk (500-2000, default 1000)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Sample rate of the final audio (22050, 44100 or 48000)
    #[arg(long, value_parser = config::parse_sample_rate)]
    sample_rate: Option<u32>,

    /// Directory for the generated audio (default: output)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Compute device (default: auto-detect)
    #[arg(long, value_enum)]
    device: Option<Device>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the text that would be spoken
    Preview {
        /// Path to the PDF file
        pdf_file: PathBuf,

        /// Maximum words to read (default from config)
        #[arg(long)]
        max_words: Option<usize>,
    },
    /// Convert an audio file to WAV
    Normalize {
        /// Input audio (mp3, m4a, flac, ogg, wma, aac or wav)
        input: PathBuf,

        /// Output WAV path (default: input with .wav extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show duration and sample rate of a WAV file
    Info {
        /// Path to a WAV file
        audio: PathBuf,
    },
    /// Check that the external tools can be launched
    Check,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice sample
    SetVoice {
        /// Path to voice sample audio
        path: PathBuf,
    },
    /// Set default model
    SetModel {
        #[arg(value_enum)]
        model: ModelKind,
    },
    /// Set default word limit
    SetMaxWords {
        /// Value (10-10000)
        value: usize,
    },
    /// Set default chunk size
    SetChunkSize {
        /// Value (500-2000)
        value: usize,
    },
    /// Set default output sample rate
    SetSampleRate {
        /// 22050, 44100 or 48000
        #[arg(value_parser = config::parse_sample_rate)]
        value: u32,
    },
    /// Set compute device
    SetDevice {
        #[arg(value_enum)]
        device: Device,
    },
    /// Set default output directory
    SetOutputDir {
        path: PathBuf,
    },
}

/// Settings for one conversion, merged from arguments and config.
#[derive(Debug, Clone, PartialEq)]
struct ConversionOptions {
    pdf_path: PathBuf,
    model: ModelKind,
    voice: Option<PathBuf>,
    max_words: Option<usize>,
    chunk_size: usize,
    sample_rate: u32,
    output_dir: PathBuf,
    device: Device,
    language: String,
}

impl ConversionOptions {
    /// Final audio path: `<output_dir>/<standard_|cloned_><pdf stem>.wav`.
    fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.wav", self.base_name()))
    }

    fn base_name(&self) -> String {
        let stem = self.pdf_path.file_stem().unwrap_or_default();
        format!("{}{}", self.model.output_prefix(), stem.to_string_lossy())
    }
}

/// Merge CLI arguments over config values.
///
/// `detect_device` only runs when neither source names a device.
fn resolve_options(
    args: &Args,
    config: &PdfSpeechConfig,
    detect_device: impl FnOnce() -> Device,
) -> Result<ConversionOptions> {
    let pdf_path = args
        .pdf_file
        .clone()
        .ok_or_else(|| anyhow::anyhow!("PDF file path is required. Run 'pdf-speech --help' for usage."))?;

    let model = args.model.unwrap_or(config.model);

    let voice = match model {
        ModelKind::Cloning => Some(args.voice.clone().or_else(|| config.voice_ref.clone()).ok_or_else(
            || anyhow::anyhow!("Voice cloning needs a voice sample. Pass --voice <FILE> or use --model standard."),
        )?),
        ModelKind::Standard => None,
    };

    let max_words = if args.all_words {
        None
    } else {
        Some(config::clamp_max_words(args.max_words.unwrap_or(config.max_words)))
    };

    Ok(ConversionOptions {
        pdf_path,
        model,
        voice,
        max_words,
        chunk_size: config::clamp_chunk_size(args.chunk_size.unwrap_or(config.chunk_size)),
        sample_rate: args.sample_rate.unwrap_or(config.sample_rate),
        output_dir: args.output_dir.clone().unwrap_or_else(|| config.output_dir.clone()),
        device: args.device.or(config.device).unwrap_or_else(detect_device),
        language: config.language.clone(),
    })
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn pdf_backend(config: &PdfSpeechConfig) -> PopplerBackend {
    PopplerBackend::new(
        &config.tools.pdftotext,
        &config.tools.pdftoppm,
        &config.tools.tesseract,
    )
    .with_dpi(config.tools.ocr_dpi)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Handle subcommands
    match &args.command {
        Some(Commands::Preview {
            pdf_file,
            max_words,
        }) => {
            return handle_preview(pdf_file, *max_words);
        }
        Some(Commands::Normalize { input, output }) => {
            return handle_normalize(input, output.as_deref());
        }
        Some(Commands::Info { audio }) => {
            return handle_info(audio);
        }
        Some(Commands::Check) => {
            return handle_check();
        }
        Some(Commands::Config { action }) => {
            return handle_config_command(action);
        }
        None => {}
    }

    // Load configuration
    let config = PdfSpeechConfig::load().context("Failed to load configuration")?;
    let options = resolve_options(&args, &config, Device::detect)?;

    if !options.pdf_path.exists() {
        anyhow::bail!("PDF file not found: {}", options.pdf_path.display());
    }

    if args.debug {
        eprintln!("PDF: {}", options.pdf_path.display());
        eprintln!("Output: {}", options.output_path().display());
        eprintln!("Model: {}", options.model.model_name());
        eprintln!("Voice: {:?}", options.voice);
        eprintln!("Max words: {:?}", options.max_words);
        eprintln!("Chunk size: {}", options.chunk_size);
        eprintln!("Sample rate: {}", options.sample_rate);
    }

    eprintln!("Running on device: {}", options.device.as_str().to_uppercase());
    eprintln!("Model: {}", options.model.display_name());

    convert(&options, &config)
}

/// Run the full PDF → speech conversion.
fn convert(options: &ConversionOptions, config: &PdfSpeechConfig) -> Result<()> {
    // Holds a converted voice sample for the length of the run
    let scratch = tempfile::Builder::new().prefix("pdf-speech-").tempdir()?;

    let voice_wav = match &options.voice {
        Some(voice) => Some(prepare_voice_sample(voice, scratch.path(), &config.tools.ffmpeg)?),
        None => None,
    };

    let pb = spinner(format!("Extracting text from {}...", options.pdf_path.display()));
    let extracted = pdf::extract_text(&pdf_backend(config), &options.pdf_path, options.max_words);
    pb.finish_and_clear();
    let text = extracted.context("Failed to extract text from PDF")?;

    eprintln!("Extracted {} words from PDF", crate::text::word_count(&text));

    let model = tts::create_model(options.model, options.device, &config.tools.tts)
        .context("Failed to load TTS model")?;

    let final_audio = match &voice_wav {
        Some(voice) => {
            eprintln!("Cloning voice and generating audio...");
            tts::synthesize_cloned(
                model.as_ref(),
                &text,
                voice,
                &options.output_path(),
                options.chunk_size,
                &options.language,
            )
        }
        None => {
            eprintln!("Generating standard audio...");
            tts::synthesize_standard(
                model.as_ref(),
                &text,
                &options.base_name(),
                &options.output_dir,
                options.chunk_size,
            )
        }
    }
    .context("Failed to generate audio")?;

    if let Err(e) = audio::resample_wav(&config.tools.ffmpeg, &final_audio, options.sample_rate) {
        log::warn!("Keeping the model's native sample rate: {}", e);
    }

    let info = audio::probe_wav(&final_audio)
        .with_context(|| format!("Failed to read {}", final_audio.display()))?;

    eprintln!("Audio generation completed!");
    eprintln!("Output: {}", final_audio.display());
    eprintln!("Audio Info: {}", info);

    Ok(())
}

/// Convert the voice sample to WAV if needed and show what was loaded.
fn prepare_voice_sample(voice: &Path, scratch_dir: &Path, ffmpeg: &Path) -> Result<PathBuf> {
    if !voice.exists() {
        anyhow::bail!("Voice sample not found: {}", voice.display());
    }

    let converted_path = scratch_dir.join(
        voice
            .with_extension("wav")
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("voice.wav")),
    );

    let wav_path = audio::normalize_to_wav(ffmpeg, voice, Some(&converted_path))
        .context("Failed to convert voice sample to WAV")?;

    if wav_path != voice {
        eprintln!("Audio converted to WAV format");
    }

    match audio::probe_wav(&wav_path) {
        Ok(info) => eprintln!("Voice sample: {}", info),
        Err(e) => log::debug!("Could not probe voice sample: {}", e),
    }

    Ok(wav_path)
}

fn handle_preview(pdf_file: &Path, max_words: Option<usize>) -> Result<()> {
    let config = PdfSpeechConfig::load()?;
    let max_words = config::clamp_max_words(max_words.unwrap_or(config.max_words));

    let text = pdf::extract_text(&pdf_backend(&config), pdf_file, Some(max_words))
        .context("Failed to extract text from PDF")?;

    let preview = TextPreview::from_text(&text);
    println!("{}", preview.excerpt);
    println!();
    println!("Total characters: {}", preview.characters);
    println!("Total words: {}", preview.words);
    Ok(())
}

fn handle_normalize(input: &Path, output: Option<&Path>) -> Result<()> {
    let config = PdfSpeechConfig::load()?;
    let wav_path = audio::normalize_to_wav(&config.tools.ffmpeg, input, output)
        .context("Failed to convert audio to WAV")?;
    println!("{}", wav_path.display());
    Ok(())
}

fn handle_info(audio_path: &Path) -> Result<()> {
    let info = audio::probe_wav(audio_path)
        .with_context(|| format!("Failed to read {}", audio_path.display()))?;
    println!("{}", info);
    Ok(())
}

fn handle_check() -> Result<()> {
    let config = PdfSpeechConfig::load()?;
    let tools = &config.tools;

    let checks = [
        ("pdftotext", pdf::is_tool_available(&tools.pdftotext, "-v"), &tools.pdftotext),
        ("pdftoppm", pdf::is_tool_available(&tools.pdftoppm, "-v"), &tools.pdftoppm),
        ("tesseract", pdf::is_tool_available(&tools.tesseract, "--version"), &tools.tesseract),
        ("ffmpeg", audio::convert::is_ffmpeg_available(&tools.ffmpeg), &tools.ffmpeg),
        ("tts", pdf::is_tool_available(&tools.tts, "--help"), &tools.tts),
    ];

    let mut missing = 0;
    for (name, ok, path) in checks {
        let status = if ok { "ok" } else { "missing" };
        println!("{:<10} {:<8} {}", name, status, path.display());
        if !ok {
            missing += 1;
        }
    }
    println!("device     {}", Device::detect());

    if missing > 0 {
        anyhow::bail!("{} required tool(s) not found", missing);
    }
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PdfSpeechConfig::load()?;
            println!("Configuration file: {:?}", PdfSpeechConfig::config_path()?);
            println!();
            if let Some(voice) = &config.voice_ref {
                println!("voice_ref = \"{}\"", voice.display());
            } else {
                println!("voice_ref = (none)");
            }
            if let Some(device) = &config.device {
                println!("device = \"{}\"", device);
            } else {
                println!("device = (auto-detect)");
            }
            println!("model = {}", config.model.display_name());
            println!("max_words = {}", config.max_words);
            println!("chunk_size = {}", config.chunk_size);
            println!("sample_rate = {}", config.sample_rate);
            println!("language = \"{}\"", config.language);
            println!("output_dir = \"{}\"", config.output_dir.display());
            println!();
            println!("[tools]");
            println!("pdftotext = \"{}\"", config.tools.pdftotext.display());
            println!("pdftoppm = \"{}\"", config.tools.pdftoppm.display());
            println!("tesseract = \"{}\"", config.tools.tesseract.display());
            println!("ffmpeg = \"{}\"", config.tools.ffmpeg.display());
            println!("tts = \"{}\"", config.tools.tts.display());
            println!("ocr_dpi = {}", config.tools.ocr_dpi);
        }
        ConfigAction::SetVoice { path } => {
            let mut config = PdfSpeechConfig::load()?;
            config.voice_ref = Some(path.clone());
            config.save()?;
            println!("Default voice sample set to: {}", path.display());
        }
        ConfigAction::SetModel { model } => {
            let mut config = PdfSpeechConfig::load()?;
            config.model = *model;
            config.save()?;
            println!("Default model set to: {}", model.display_name());
        }
        ConfigAction::SetMaxWords { value } => {
            let mut config = PdfSpeechConfig::load()?;
            config.max_words = config::clamp_max_words(*value);
            config.save()?;
            println!("Default word limit set to: {}", config.max_words);
        }
        ConfigAction::SetChunkSize { value } => {
            let mut config = PdfSpeechConfig::load()?;
            config.chunk_size = config::clamp_chunk_size(*value);
            config.save()?;
            println!("Default chunk size set to: {}", config.chunk_size);
        }
        ConfigAction::SetSampleRate { value } => {
            let mut config = PdfSpeechConfig::load()?;
            config.sample_rate = *value;
            config.save()?;
            println!("Default sample rate set to: {}", config.sample_rate);
        }
        ConfigAction::SetDevice { device } => {
            let mut config = PdfSpeechConfig::load()?;
            config.device = Some(*device);
            config.save()?;
            println!("Device set to: {}", device);
        }
        ConfigAction::SetOutputDir { path } => {
            let mut config = PdfSpeechConfig::load()?;
            config.output_dir = path.clone();
            config.save()?;
            println!("Default output directory set to: {}", path.display());
        }
    }
    Ok(())
}
