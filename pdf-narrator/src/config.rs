//! pdf-narrator configuration management.
//!
//! Configuration is read once at startup and passed explicitly to the
//! extractor, synthesizer and audio codec.

use crate::error::{NarratorError, Result};
use crate::text::chunker::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory before the user config.
pub const LOCAL_CONFIG_FILE: &str = "pdf-narrator.toml";

const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_MODEL: &str = "tts-1";
const DEFAULT_VOICE: &str = "echo";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarratorConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub read: ReadConfig,

    #[serde(default)]
    pub tts: TtsConfig,
}

/// Locations of external binaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// ffmpeg executable (falls back to `ffmpeg` on PATH)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,

    /// ffprobe executable (falls back to `ffprobe` on PATH)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_probe: Option<PathBuf>,

    /// tesseract executable, required for scanned PDFs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_path: Option<PathBuf>,

    /// Directory holding poppler's `pdftoppm`, required for scanned PDFs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poppler_bin: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadConfig {
    /// Directory for parts, timestamps and the merged file
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// PDF used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_essay: Option<PathBuf>,

    /// Also drop the trailing references section from OCR text
    #[serde(default)]
    pub ocr_strip_references: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    /// Maximum characters per TTS request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Prefix every chunk with a spoken "Part N."
    #[serde(default)]
    pub include_part_intro: bool,

    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL for API-compatible servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            read_essay: None,
            ocr_strip_references: false,
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            voice: default_voice(),
            chunk_size: default_chunk_size(),
            include_part_intro: false,
            api_key: None,
            base_url: None,
        }
    }
}

impl NarratorConfig {
    /// Get the user config file path: ~/.config/cli-programs/pdf-narrator.toml
    pub fn user_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            NarratorError::Configuration("Could not determine home directory".into())
        })?;
        Ok(home
            .join(".config")
            .join("cli-programs")
            .join("pdf-narrator.toml"))
    }

    /// Pick the config file to use: explicit path, then ./pdf-narrator.toml,
    /// then the user config path.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Ok(local);
        }

        Self::user_config_path()
    }

    /// Load config, returning defaults if the file doesn't exist.
    ///
    /// An explicitly requested file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(explicit)?;

        if !path.exists() {
            if explicit.is_some() {
                return Err(NarratorError::Configuration(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: NarratorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
