//! Audio decode/encode through FFmpeg.

use crate::config::PathsConfig;
use crate::error::{NarratorError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Sample rate of the TTS service's MP3 output, reused for padding.
const SILENCE_SAMPLE_RATE: u32 = 24_000;
const MP3_BITRATE: &str = "128k";

/// Audio operations needed by synthesis and merge.
pub trait AudioCodec {
    /// Decode `path` and return its duration in milliseconds.
    fn duration_ms(&self, path: &Path) -> Result<u64>;

    /// Write `duration_ms` of silence to `output`.
    fn silence(&self, duration_ms: u64, output: &Path) -> Result<()>;

    /// Concatenate `inputs` in order and export the result as MP3 to `output`.
    fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// `AudioCodec` backed by the ffmpeg and ffprobe executables.
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegCodec {
    pub fn new(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self { ffmpeg, ffprobe }
    }

    /// Resolve ffmpeg/ffprobe from configuration, falling back to PATH.
    ///
    /// A configured path that does not exist is an error, not a fallback.
    pub fn from_paths(paths: &PathsConfig) -> Result<Self> {
        let ffmpeg = resolve_tool(paths.ffmpeg_path.as_deref(), "ffmpeg_path", "ffmpeg")?;
        let ffprobe = resolve_tool(paths.ffmpeg_probe.as_deref(), "ffmpeg_probe", "ffprobe")?;
        Ok(Self::new(ffmpeg, ffprobe))
    }

    fn run(&self, mut cmd: Command, what: &str) -> Result<Vec<u8>> {
        let output = cmd
            .output()
            .map_err(|e| NarratorError::Audio(format!("Failed to run {}: {}", what, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NarratorError::Audio(format!(
                "{} failed: {}",
                what,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

fn resolve_tool(configured: Option<&Path>, key: &str, binary: &str) -> Result<PathBuf> {
    match configured.filter(|p| !p.as_os_str().is_empty()) {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(NarratorError::Configuration(format!(
            "{} is set to '{}', but that file does not exist",
            key,
            path.display()
        ))),
        None => which::which(binary).map_err(|_| {
            NarratorError::Configuration(format!(
                "{} is not configured in [paths] and {} was not found on PATH",
                key, binary
            ))
        }),
    }
}

impl AudioCodec for FfmpegCodec {
    fn duration_ms(&self, path: &Path) -> Result<u64> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path);

        let stdout = self.run(cmd, "ffprobe")?;
        let duration_str = String::from_utf8_lossy(&stdout);
        let duration_secs: f64 = duration_str.trim().parse().map_err(|_| {
            NarratorError::Audio(format!(
                "Failed to parse duration {:?} of {}",
                duration_str.trim(),
                path.display()
            ))
        })?;

        Ok((duration_secs * 1000.0).round() as u64)
    }

    fn silence(&self, duration_ms: u64, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-f", "lavfi", "-i"])
            .arg(format!("anullsrc=r={}:cl=mono", SILENCE_SAMPLE_RATE))
            .arg("-t")
            .arg(format!("{:.3}", duration_ms as f64 / 1000.0))
            .args(["-c:a", "libmp3lame", "-b:a", MP3_BITRATE])
            .arg(output);

        self.run(cmd, "ffmpeg silence")?;
        Ok(())
    }

    /// Uses FFmpeg's concat demuxer and re-encodes to a single MP3 stream.
    /// Inputs are expected to share sample rate and channel layout.
    fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            return Err(NarratorError::Audio("No audio files provided".to_string()));
        }

        // Create a temporary file list for ffmpeg
        let temp_dir = TempDir::new()?;
        let list_file = temp_dir.path().join("concat_list.txt");
        std::fs::write(&list_file, concat_list(inputs))?;

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"])
            .arg(&list_file)
            .args(["-c:a", "libmp3lame", "-b:a", MP3_BITRATE])
            .arg(output);

        self.run(cmd, "ffmpeg concat")?;
        Ok(())
    }
}

/// Build an ffmpeg concat demuxer list.
fn concat_list(inputs: &[PathBuf]) -> String {
    let mut list_content = String::new();
    for path in inputs {
        // Escape single quotes in path
        let path_str = path.to_string_lossy().replace('\'', "'\\''");
        list_content.push_str(&format!("file '{}'\n", path_str));
    }
    list_content
}
