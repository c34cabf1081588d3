//! Error taxonomy for the narration pipeline.
//!
//! Setup errors (`Configuration`, `Input`) and `Conversion` abort a run.
//! `Synthesis` and `MissingPart` are per-item: the batch loops log them and
//! carry on with the next chunk or part.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarratorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Failed to convert PDF to images: {0}")]
    Conversion(String),

    #[error("Failed to generate part {part}: {message}")]
    Synthesis { part: usize, message: String },

    #[error("Part file not found: {}", .0.display())]
    MissingPart(PathBuf),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("No parts named {base_name}*.mp3 found in {}", dir.display())]
    NoParts { base_name: String, dir: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Tts(#[from] tts_client::TtsError),
}

pub type Result<T> = std::result::Result<T, NarratorError>;
