//! pdf-narrator - Narrate PDF documents into a single MP3 using text-to-speech

mod audio;
mod config;
mod error;
mod extract;
mod synth;
mod text;

use anyhow::{Context, Result};
use audio::{AudioMerger, FfmpegCodec};
use clap::{Parser, Subcommand};
use config::NarratorConfig;
use error::NarratorError;
use extract::PageExtractor;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use synth::{SpeechSynthesizer, SynthesisOptions};
use text::chunker::TTS_INPUT_LIMIT;

#[derive(Parser, Debug)]
#[command(name = "pdf-narrator")]
#[command(about = "Narrate PDF documents into a single MP3 using text-to-speech", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF file (default: read.read_essay from the config)
    pdf_file: Option<PathBuf>,

    /// Directory for parts, timestamps and the merged MP3
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TTS voice (e.g. echo, nova, onyx)
    #[arg(long)]
    voice: Option<String>,

    /// TTS model (tts-1 or tts-1-hd)
    #[arg(long)]
    model: Option<String>,

    /// Maximum characters per TTS request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Speak "Part N." before each chunk
    #[arg(long)]
    part_intro: bool,

    /// Delete part files after merging
    #[arg(long)]
    clean_parts: bool,

    /// Config file to use instead of the default lookup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false, global = true)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Extract and clean the text of a PDF without synthesizing it
    Extract {
        /// Path to the PDF file
        pdf: PathBuf,

        /// Write the text to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge existing part files into one MP3
    Merge {
        /// Base name of the parts, e.g. "essay_mp3"
        base_name: String,

        /// Directory holding the parts (default: read.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Delete part files after merging
        #[arg(long)]
        clean_parts: bool,
    },
    /// Generate a short sample for every available voice
    Voices {
        /// TTS model (default: tts.model from the config)
        #[arg(long)]
        model: Option<String>,

        /// Directory for the samples
        #[arg(short, long, default_value = synth::VOICE_SAMPLE_DIR)]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice
    SetVoice {
        /// Voice name
        voice: String,
    },
    /// Set default model
    SetModel {
        /// Model name
        model: String,
    },
    /// Set default output directory
    SetOutputDir {
        /// Directory path
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Handle subcommands
    match &args.command {
        Some(Commands::Config { action }) => {
            return handle_config_command(action, args.config.as_deref());
        }
        Some(Commands::Extract { pdf, output }) => {
            let config = load_config(&args)?;
            return handle_extract_command(&config, pdf, output.as_deref());
        }
        Some(Commands::Merge {
            base_name,
            output,
            clean_parts,
        }) => {
            let config = load_config(&args)?;
            let dir = output.clone().unwrap_or_else(|| config.read.output_dir.clone());
            return merge_parts(&config, &dir, base_name, *clean_parts);
        }
        Some(Commands::Voices { model, output }) => {
            let config = load_config(&args)?;
            return handle_voices_command(&config, model.as_deref(), output).await;
        }
        None => {}
    }

    let config = load_config(&args)?;
    narrate(&args, &config).await
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(args: &Args) -> Result<NarratorConfig> {
    NarratorConfig::load(args.config.as_deref()).context("Failed to load configuration")
}

/// Full pipeline: extract, chunk, synthesize, merge.
async fn narrate(args: &Args, config: &NarratorConfig) -> Result<()> {
    let pdf_path = resolve_input(args.pdf_file.as_deref(), config)?;

    // Validate the audio toolchain before spending any TTS requests
    let codec = FfmpegCodec::from_paths(&config.paths)?;

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.read.output_dir.clone());
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!("Failed to create output directory {}", output_dir.display())
    })?;

    let chunk_size = args.chunk_size.unwrap_or(config.tts.chunk_size);
    if chunk_size == 0 {
        anyhow::bail!("chunk_size must be greater than zero");
    }
    if chunk_size > TTS_INPUT_LIMIT {
        log::warn!(
            "chunk_size {} exceeds the TTS input limit of {} characters; long chunks will fail",
            chunk_size,
            TTS_INPUT_LIMIT
        );
    }

    let options = SynthesisOptions {
        voice: args.voice.clone().unwrap_or_else(|| config.tts.voice.clone()),
        model: args.model.clone().unwrap_or_else(|| config.tts.model.clone()),
        include_part_intro: args.part_intro || config.tts.include_part_intro,
    };

    if args.debug {
        eprintln!("PDF: {}", pdf_path.display());
        eprintln!("Output: {}", output_dir.display());
        eprintln!("Voice: {}", options.voice);
        eprintln!("Model: {}", options.model);
        eprintln!("Chunk size: {}", chunk_size);
    }

    eprintln!("Selected file: {}", pdf_path.display());
    let extractor = PageExtractor::new(config.paths.clone(), config.read.ocr_strip_references);
    let full_text = extractor
        .extract_full_text(&pdf_path)
        .context("Failed to extract text")?;

    if full_text.trim().is_empty() {
        anyhow::bail!("No text found in {}", pdf_path.display());
    }

    let chunks = text::split_into_chunks(&full_text, chunk_size);
    eprintln!(
        "Total chunks: {} (~{} characters)",
        chunks.len(),
        full_text.chars().count()
    );

    let provider = tts_client::get_provider(
        &config.tts.provider,
        config.tts.api_key.as_deref(),
        config.tts.base_url.as_deref(),
    )?;
    log::debug!("Using TTS provider: {}", provider.name());

    let base_name = base_name_for(&pdf_path);
    let synthesizer = SpeechSynthesizer::new(provider.as_ref(), &codec, options);

    // Debug runs log every part instead of drawing a progress bar
    let report = if args.debug {
        synthesizer
            .synthesize(&chunks, &output_dir, &base_name)
            .await?
    } else {
        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
                .progress_chars("#>-"),
        );

        let report = synthesizer
            .synthesize_with_progress(&chunks, &output_dir, &base_name, |progress| {
                pb.set_position(progress.completed as u64);
                pb.set_message(format!("part {} of {}", progress.index, progress.total));
            })
            .await?;

        pb.finish_with_message("Synthesis complete!");
        report
    };

    for entry in &report.entries {
        log::debug!("{}", entry.synthesis_line());
    }
    log::debug!("{} part file(s) ready in {}", report.parts.len(), output_dir.display());

    eprintln!(
        "\nGenerated: {}, Reused: {}, Failed: {}",
        report.generated,
        report.reused,
        report.failures.len()
    );
    eprintln!("Part timestamps: {}", report.timestamps_path.display());

    merge_parts(config, &output_dir, &base_name, args.clean_parts)
}

fn merge_parts(
    config: &NarratorConfig,
    dir: &Path,
    base_name: &str,
    clean_parts: bool,
) -> Result<()> {
    let codec = FfmpegCodec::from_paths(&config.paths)?;
    let output = AudioMerger::new(&codec)
        .merge(dir, base_name, clean_parts)
        .context("Failed to merge parts")?;

    eprintln!("Parts merged: {}", output.entries.len());
    if !output.skipped.is_empty() {
        eprintln!("Skipped {} part(s)", output.skipped.len());
    }

    let size_mb = std::fs::metadata(&output.merged_path)
        .map(|m| m.len() as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0);
    eprintln!("Output: {} ({:.1} MB)", output.merged_path.display(), size_mb);
    eprintln!("Timestamps: {}", output.timestamps_path.display());

    Ok(())
}

/// The PDF to narrate: the command-line argument, else `read.read_essay`.
fn resolve_input(arg: Option<&Path>, config: &NarratorConfig) -> Result<PathBuf, NarratorError> {
    let path = arg
        .map(Path::to_path_buf)
        .or_else(|| config.read.read_essay.clone())
        .ok_or_else(|| {
            NarratorError::Input(
                "PDF file path is required. Pass one or set read.read_essay in the config."
                    .to_string(),
            )
        })?;

    if !path.is_file() {
        return Err(NarratorError::Input(format!(
            "PDF file not found: {}",
            path.display()
        )));
    }

    Ok(path)
}

/// Base name shared by every output file: `{pdf_stem}_mp3`.
fn base_name_for(pdf_path: &Path) -> String {
    let stem = pdf_path.file_stem().unwrap_or_default();
    format!("{}_mp3", stem.to_string_lossy())
}

fn handle_extract_command(
    config: &NarratorConfig,
    pdf: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let pdf_path = resolve_input(Some(pdf), config)?;
    let extractor = PageExtractor::new(config.paths.clone(), config.read.ocr_strip_references);
    let full_text = extractor
        .extract_full_text(&pdf_path)
        .context("Failed to extract text")?;

    match output {
        Some(path) => {
            std::fs::write(path, &full_text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Text saved to {}", path.display());
        }
        None => println!("{}", full_text),
    }
    Ok(())
}

async fn handle_voices_command(
    config: &NarratorConfig,
    model: Option<&str>,
    dir: &Path,
) -> Result<()> {
    let codec = FfmpegCodec::from_paths(&config.paths)?;
    let provider = tts_client::get_provider(
        &config.tts.provider,
        config.tts.api_key.as_deref(),
        config.tts.base_url.as_deref(),
    )?;
    let model = model.unwrap_or(config.tts.model.as_str());

    let samples = synth::generate_voice_samples(
        provider.as_ref(),
        &codec,
        model,
        synth::VOICES,
        synth::VOICE_SAMPLE_TEXT,
        dir,
    )
    .await?;

    for sample in &samples {
        match sample.duration_ms {
            Some(ms) => println!(
                "{:<8} {} ({:.2} seconds){}",
                sample.voice,
                sample.path.display(),
                ms as f64 / 1000.0,
                if sample.generated { "" } else { " [existing]" }
            ),
            None => println!("{:<8} {} (unreadable)", sample.voice, sample.path.display()),
        }
    }
    eprintln!("\nAll voice samples completed.");
    Ok(())
}

fn handle_config_command(action: &ConfigAction, explicit: Option<&Path>) -> Result<()> {
    let path = NarratorConfig::resolve_path(explicit)?;
    let mut config = NarratorConfig::load(explicit)?;

    match action {
        ConfigAction::Show => {
            println!("Configuration file: {:?}", path);
            println!();
            println!("[paths]");
            print_optional_path("ffmpeg_path", config.paths.ffmpeg_path.as_deref(), "(PATH)");
            print_optional_path("ffmpeg_probe", config.paths.ffmpeg_probe.as_deref(), "(PATH)");
            print_optional_path("tesseract_path", config.paths.tesseract_path.as_deref(), "(none)");
            print_optional_path("poppler_bin", config.paths.poppler_bin.as_deref(), "(none)");
            println!();
            println!("[read]");
            println!("output_dir = \"{}\"", config.read.output_dir.display());
            print_optional_path("read_essay", config.read.read_essay.as_deref(), "(none)");
            println!("ocr_strip_references = {}", config.read.ocr_strip_references);
            println!();
            println!("[tts]");
            println!("provider = \"{}\"", config.tts.provider);
            println!("model = \"{}\"", config.tts.model);
            println!("voice = \"{}\"", config.tts.voice);
            println!("chunk_size = {}", config.tts.chunk_size);
            println!("include_part_intro = {}", config.tts.include_part_intro);
            if config.tts.api_key.is_some() {
                println!("api_key = (set)");
            } else {
                println!("api_key = (from environment)");
            }
            if let Some(url) = &config.tts.base_url {
                println!("base_url = \"{}\"", url);
            }
        }
        ConfigAction::SetVoice { voice } => {
            config.tts.voice = voice.clone();
            config.save_to(&path)?;
            println!("Default voice set to: {}", voice);
        }
        ConfigAction::SetModel { model } => {
            config.tts.model = model.clone();
            config.save_to(&path)?;
            println!("Default model set to: {}", model);
        }
        ConfigAction::SetOutputDir { path: dir } => {
            config.read.output_dir = dir.clone();
            config.save_to(&path)?;
            println!("Default output directory set to: {}", dir.display());
        }
    }
    Ok(())
}

fn print_optional_path(key: &str, value: Option<&Path>, unset: &str) {
    match value {
        Some(path) => println!("{} = \"{}\"", key, path.display()),
        None => println!("{} = {}", key, unset),
    }
}
