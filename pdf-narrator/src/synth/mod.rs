//! Chunk-by-chunk speech synthesis into numbered MP3 parts.

use crate::audio::{AudioCodec, TimestampEntry};
use crate::error::{NarratorError, Result};
use crate::text::TextChunk;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tts_client::{SpeechProvider, SpeechRequest};

/// Voices offered by the OpenAI speech endpoint.
pub const VOICES: &[&str] = &[
    "alloy", "ash", "coral", "echo", "fable", "nova", "onyx", "sage", "shimmer",
];

/// Sentence spoken before the voice name in each sample.
pub const VOICE_SAMPLE_TEXT: &str = "This is a test of the OpenAI text-to-speech voice:";

/// Default directory for voice samples.
pub const VOICE_SAMPLE_DIR: &str = "voice_tests";

/// Request parameters shared by every chunk.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub voice: String,
    pub model: String,
    /// Speak "Part N." before each chunk
    pub include_part_intro: bool,
}

/// Progress snapshot passed to the synthesis callback.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisProgress {
    /// Chunks handled so far, including failures
    pub completed: usize,
    pub total: usize,
    /// Index of the chunk just handled
    pub index: usize,
}

/// Outcome of a synthesis run.
#[derive(Debug, Default)]
pub struct SynthesisReport {
    /// Part files that exist after the run, in chunk order
    pub parts: Vec<PathBuf>,
    /// Start offset of each successful part
    pub entries: Vec<TimestampEntry>,
    /// Chunks that produced no usable part
    pub failures: Vec<NarratorError>,
    /// Parts synthesized during this run
    pub generated: usize,
    /// Parts that already existed and were reused
    pub reused: usize,
    pub timestamps_path: PathBuf,
}

/// `{base}_part{index}.mp3`, zero-padded to the digit count of `total`.
pub fn part_file_name(base_name: &str, index: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("{}_part{:0width$}.mp3", base_name, index, width = width)
}

/// Synthesis-stage timestamp file, `{base}_timestamps.txt`.
pub fn timestamps_file_name(base_name: &str) -> String {
    format!("{}_timestamps.txt", base_name)
}

enum PartSource {
    Generated,
    Reused,
}

/// Turns text chunks into part files through a [`SpeechProvider`].
pub struct SpeechSynthesizer<'a> {
    provider: &'a dyn SpeechProvider,
    codec: &'a dyn AudioCodec,
    options: SynthesisOptions,
}

impl<'a> SpeechSynthesizer<'a> {
    pub fn new(
        provider: &'a dyn SpeechProvider,
        codec: &'a dyn AudioCodec,
        options: SynthesisOptions,
    ) -> Self {
        Self {
            provider,
            codec,
            options,
        }
    }

    /// Synthesize every chunk into `output_dir`.
    pub async fn synthesize(
        &self,
        chunks: &[TextChunk],
        output_dir: &Path,
        base_name: &str,
    ) -> Result<SynthesisReport> {
        self.synthesize_with_progress(chunks, output_dir, base_name, |_| {})
            .await
    }

    /// Synthesize every chunk, calling `on_progress` after each one.
    ///
    /// Existing part files are reused without a TTS request. A chunk that
    /// fails is logged and recorded in the report; later chunks still run.
    /// The timestamp file is rewritten line by line as parts complete.
    pub async fn synthesize_with_progress<F>(
        &self,
        chunks: &[TextChunk],
        output_dir: &Path,
        base_name: &str,
        mut on_progress: F,
    ) -> Result<SynthesisReport>
    where
        F: FnMut(&SynthesisProgress),
    {
        fs::create_dir_all(output_dir)?;

        let timestamps_path = output_dir.join(timestamps_file_name(base_name));
        let mut timestamps = BufWriter::new(File::create(&timestamps_path)?);

        let mut report = SynthesisReport {
            timestamps_path: timestamps_path.clone(),
            ..Default::default()
        };
        let mut total_ms = 0;

        for (i, chunk) in chunks.iter().enumerate() {
            let path = output_dir.join(part_file_name(base_name, chunk.index, chunks.len()));

            match self.render_part(chunk, &path).await {
                Ok((source, duration_ms)) => {
                    let entry = TimestampEntry::new(chunk.index, total_ms);
                    writeln!(timestamps, "{}", entry.synthesis_line())?;
                    timestamps.flush()?;

                    match source {
                        PartSource::Generated => report.generated += 1,
                        PartSource::Reused => report.reused += 1,
                    }
                    report.entries.push(entry);
                    report.parts.push(path);
                    total_ms += duration_ms;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    report.failures.push(e);
                }
            }

            on_progress(&SynthesisProgress {
                completed: i + 1,
                total: chunks.len(),
                index: chunk.index,
            });
        }

        log::info!(
            "Synthesis finished: {} generated, {} reused, {} failed",
            report.generated,
            report.reused,
            report.failures.len()
        );
        log::info!("Timestamps saved to {}", timestamps_path.display());

        Ok(report)
    }

    fn input_text(&self, chunk: &TextChunk) -> String {
        if self.options.include_part_intro {
            format!("Part {}. {}", chunk.index, chunk.text)
        } else {
            chunk.text.clone()
        }
    }

    async fn render_part(&self, chunk: &TextChunk, path: &Path) -> Result<(PartSource, u64)> {
        let part_error = |message: String| NarratorError::Synthesis {
            part: chunk.index,
            message,
        };

        if path.exists() {
            log::info!("{} exists, skipping.", path.display());
            let duration_ms = self
                .codec
                .duration_ms(path)
                .map_err(|e| part_error(e.to_string()))?;
            return Ok((PartSource::Reused, duration_ms));
        }

        log::debug!("Generating {}", path.display());
        let request = SpeechRequest::new(
            self.options.model.as_str(),
            self.options.voice.as_str(),
            self.input_text(chunk),
        );
        let audio = self
            .provider
            .synthesize(&request)
            .await
            .map_err(|e| part_error(e.to_string()))?;

        tokio::fs::write(path, &audio)
            .await
            .map_err(|e| part_error(format!("cannot write {}: {}", path.display(), e)))?;

        match self.codec.duration_ms(path) {
            Ok(duration_ms) => {
                log::debug!("Saved {}", path.display());
                Ok((PartSource::Generated, duration_ms))
            }
            Err(e) => {
                // Unreadable audio must not be reused by the next run
                if let Err(remove_err) = fs::remove_file(path) {
                    log::warn!("Could not remove {}: {}", path.display(), remove_err);
                }
                Err(part_error(e.to_string()))
            }
        }
    }
}

/// One generated or reused voice sample.
#[derive(Debug, Clone)]
pub struct VoiceSample {
    pub voice: String,
    pub path: PathBuf,
    pub generated: bool,
    /// `None` when the file could not be decoded
    pub duration_ms: Option<u64>,
}

/// Write `{model}_{voice}.mp3` into `dir` for each voice.
///
/// Existing samples are kept. A voice that fails is logged and left out of
/// the result.
pub async fn generate_voice_samples(
    provider: &dyn SpeechProvider,
    codec: &dyn AudioCodec,
    model: &str,
    voices: &[&str],
    text: &str,
    dir: &Path,
) -> Result<Vec<VoiceSample>> {
    fs::create_dir_all(dir)?;

    let mut samples = Vec::with_capacity(voices.len());
    for voice in voices {
        let path = dir.join(format!("{}_{}.mp3", model, voice));
        let generated = if path.exists() {
            log::info!("{} already exists, skipping generation", path.display());
            false
        } else {
            log::info!("Generating voice sample: {}", voice);
            let request = SpeechRequest::new(model, *voice, format!("{} {}", text, voice));
            match provider.synthesize(&request).await {
                Ok(audio) => {
                    tokio::fs::write(&path, &audio).await?;
                    log::info!("Saved {}", path.display());
                    true
                }
                Err(e) => {
                    log::warn!("Voice {} failed: {}", voice, e);
                    continue;
                }
            }
        };

        let duration_ms = match codec.duration_ms(&path) {
            Ok(ms) => Some(ms),
            Err(e) => {
                log::warn!("Cannot decode {}: {}", path.display(), e);
                None
            }
        };

        samples.push(VoiceSample {
            voice: voice.to_string(),
            path,
            generated,
            duration_ms,
        });
    }

    Ok(samples)
}
