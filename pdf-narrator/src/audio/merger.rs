//! Merges numbered part files into one narration with a timestamp index.

use super::codec::AudioCodec;
use super::timestamps::{TimestampEntry, write_lines};
use crate::error::{NarratorError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Silence appended after every part.
pub const PART_PADDING_MS: u64 = 250;

/// Suffix of the merged output, `{base}_full.mp3`.
pub const MERGED_SUFFIX: &str = "_full.mp3";

/// Merge-stage timestamp file, shared by every base name in the directory.
pub const MERGE_TIMESTAMPS_FILE: &str = "timestamps.txt";

static PART_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_part(\d+)\.mp3$").expect("part number pattern should compile"));

/// Part index parsed from a `..._partNNN.mp3` file name.
pub fn part_number(file_name: &str) -> Option<u64> {
    PART_NUMBER
        .captures(file_name)
        .and_then(|c| c[1].parse().ok())
}

/// Find the parts of `base_name` in `dir`, in numeric part order.
///
/// Names without a parseable part number sort last.
pub fn discover_parts(dir: &Path, base_name: &str) -> Result<Vec<PathBuf>> {
    let mut parts: Vec<(Option<u64>, String)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            name.starts_with(base_name) && name.ends_with(".mp3") && !name.ends_with(MERGED_SUFFIX)
        })
        .map(|name| (part_number(&name), name))
        .collect();

    parts.sort_by(|(a_num, a_name), (b_num, b_name)| {
        (a_num.is_none(), a_num, a_name).cmp(&(b_num.is_none(), b_num, b_name))
    });

    Ok(parts.into_iter().map(|(_, name)| dir.join(name)).collect())
}

/// Result of a merge.
#[derive(Debug)]
pub struct MergeOutput {
    pub merged_path: PathBuf,
    pub timestamps_path: PathBuf,
    pub entries: Vec<TimestampEntry>,
    /// Parts that vanished or failed to decode
    pub skipped: Vec<PathBuf>,
}

/// Concatenates parts with padding through an [`AudioCodec`].
pub struct AudioMerger<'a> {
    codec: &'a dyn AudioCodec,
}

impl<'a> AudioMerger<'a> {
    pub fn new(codec: &'a dyn AudioCodec) -> Self {
        Self { codec }
    }

    /// Merge all parts of `base_name` found in `parts_dir`.
    ///
    /// Writes `{base_name}_full.mp3` and `timestamps.txt` into `parts_dir`.
    /// With `clean_parts_after`, every other `.mp3` in the directory is
    /// deleted once the merged file exists.
    pub fn merge(
        &self,
        parts_dir: &Path,
        base_name: &str,
        clean_parts_after: bool,
    ) -> Result<MergeOutput> {
        log::info!("Merging all MP3s into one file...");

        let parts = discover_parts(parts_dir, base_name)?;
        if parts.is_empty() {
            return Err(NarratorError::NoParts {
                base_name: base_name.to_string(),
                dir: parts_dir.to_path_buf(),
            });
        }

        let temp_dir = TempDir::new()?;
        let pause = temp_dir.path().join("pause.mp3");
        self.codec.silence(PART_PADDING_MS, &pause)?;

        let mut inputs = Vec::with_capacity(parts.len() * 2);
        let mut entries = Vec::with_capacity(parts.len());
        let mut skipped = Vec::new();
        let mut current_ms = 0;

        for (i, part) in parts.iter().enumerate() {
            let position = i + 1;

            if !part.exists() {
                log::warn!("{}. Skipping.", NarratorError::MissingPart(part.clone()));
                skipped.push(part.clone());
                continue;
            }

            log::debug!("Loading {}", part.display());
            let duration_ms = match self.codec.duration_ms(part) {
                Ok(ms) => ms,
                Err(e) => {
                    log::warn!("Cannot decode {}: {}. Skipping.", part.display(), e);
                    skipped.push(part.clone());
                    continue;
                }
            };

            // Timestamp is the start of this part, before it is appended
            entries.push(TimestampEntry::new(position, current_ms));
            inputs.push(part.clone());
            inputs.push(pause.clone());
            current_ms += duration_ms + PART_PADDING_MS;
        }

        if inputs.is_empty() {
            return Err(NarratorError::NoParts {
                base_name: base_name.to_string(),
                dir: parts_dir.to_path_buf(),
            });
        }

        let merged_name = format!("{}{}", base_name, MERGED_SUFFIX);
        let merged_path = parts_dir.join(&merged_name);
        self.codec.concatenate(&inputs, &merged_path)?;

        if clean_parts_after {
            remove_other_mp3s(parts_dir, &merged_name)?;
        }

        let timestamps_path = parts_dir.join(MERGE_TIMESTAMPS_FILE);
        write_lines(&timestamps_path, entries.iter().map(TimestampEntry::merge_line))?;

        log::info!("Timestamps saved to {}", timestamps_path.display());
        log::info!("Merged audio saved to {}", merged_path.display());

        Ok(MergeOutput {
            merged_path,
            timestamps_path,
            entries,
            skipped,
        })
    }
}

/// Delete every `.mp3` in `dir` except `keep`.
fn remove_other_mp3s(dir: &Path, keep: &str) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(".mp3") && name != keep {
            if let Err(e) = fs::remove_file(entry.path()) {
                log::warn!("Could not delete {}: {}", entry.path().display(), e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::codec::testing::FakeCodec;
    use tempfile::TempDir;

    fn write_part(dir: &Path, name: &str, duration_ms: u64) {
        fs::write(dir.join(name), duration_ms.to_string()).unwrap();
    }

    fn file_names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_part_number() {
        assert_eq!(part_number("essay_mp3_part007.mp3"), Some(7));
        assert_eq!(part_number("essay_mp3_part10.mp3"), Some(10));
        assert_eq!(part_number("essay_mp3_partA.mp3"), None);
        assert_eq!(part_number("essay_mp3_part1.wav"), None);
    }

    #[test]
    fn test_discover_orders_numerically() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_part(dir, "base_part2.mp3", 1);
        write_part(dir, "base_part10.mp3", 1);
        write_part(dir, "base_part1.mp3", 1);

        let parts = discover_parts(dir, "base").unwrap();
        assert_eq!(
            file_names(&parts),
            vec!["base_part1.mp3", "base_part2.mp3", "base_part10.mp3"]
        );
    }

    #[test]
    fn test_discover_filters_and_sorts_unnumbered_last() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_part(dir, "base_part3.mp3", 1);
        write_part(dir, "base_intro.mp3", 1);
        write_part(dir, "base_full.mp3", 1);
        write_part(dir, "base_timestamps.txt", 1);
        write_part(dir, "other_part1.mp3", 1);
        write_part(dir, "base_part1.mp3", 1);

        let parts = discover_parts(dir, "base").unwrap();
        assert_eq!(
            file_names(&parts),
            vec!["base_part1.mp3", "base_part3.mp3", "base_intro.mp3"]
        );
    }

    #[test]
    fn test_merge_concatenates_with_padding_and_timestamps() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_part(dir, "essay_mp3_part2.mp3", 2000);
        write_part(dir, "essay_mp3_part1.mp3", 1000);
        write_part(dir, "essay_mp3_part3.mp3", 3000);

        let codec = FakeCodec::default();
        let output = AudioMerger::new(&codec).merge(dir, "essay_mp3", false).unwrap();

        assert_eq!(output.merged_path, dir.join("essay_mp3_full.mp3"));
        let merged = fs::read_to_string(&output.merged_path).unwrap();
        assert_eq!(
            merged.lines().collect::<Vec<_>>(),
            vec![
                "essay_mp3_part1.mp3",
                "pause.mp3",
                "essay_mp3_part2.mp3",
                "pause.mp3",
                "essay_mp3_part3.mp3",
                "pause.mp3",
            ]
        );

        assert_eq!(
            output.entries,
            vec![
                TimestampEntry::new(1, 0),
                TimestampEntry::new(2, 1250),
                TimestampEntry::new(3, 3500),
            ]
        );

        let timestamps = fs::read_to_string(dir.join("timestamps.txt")).unwrap();
        assert_eq!(
            timestamps,
            "Part 1 - 00:00:00.000000\nPart 2 - 00:00:01.250000\nPart 3 - 00:00:03.500000\n"
        );
        assert!(dir.join("essay_mp3_part1.mp3").exists());
    }

    #[test]
    fn test_merge_skips_undecodable_parts() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_part(dir, "b_part1.mp3", 1000);
        fs::write(dir.join("b_part2.mp3"), "garbage").unwrap();
        write_part(dir, "b_part3.mp3", 500);

        let codec = FakeCodec::default();
        let output = AudioMerger::new(&codec).merge(dir, "b", false).unwrap();

        assert_eq!(file_names(&output.skipped), vec!["b_part2.mp3"]);
        // Merge position numbering still counts the skipped part
        assert_eq!(
            output.entries,
            vec![TimestampEntry::new(1, 0), TimestampEntry::new(3, 1250)]
        );
        assert!(
            output
                .entries
                .windows(2)
                .all(|w| w[0].start_ms <= w[1].start_ms)
        );
    }

    /// Deletes `victim` the first time any part is decoded.
    struct VanishingPartCodec {
        inner: FakeCodec,
        victim: PathBuf,
    }

    impl AudioCodec for VanishingPartCodec {
        fn duration_ms(&self, path: &Path) -> Result<u64> {
            let duration = self.inner.duration_ms(path);
            if self.victim.exists() {
                fs::remove_file(&self.victim).unwrap();
            }
            duration
        }

        fn silence(&self, duration_ms: u64, output: &Path) -> Result<()> {
            self.inner.silence(duration_ms, output)
        }

        fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
            self.inner.concatenate(inputs, output)
        }
    }

    #[test]
    fn test_merge_skips_part_deleted_during_merge() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_part(dir, "b_part1.mp3", 1000);
        write_part(dir, "b_part2.mp3", 2000);
        write_part(dir, "b_part3.mp3", 500);

        let codec = VanishingPartCodec {
            inner: FakeCodec::default(),
            victim: dir.join("b_part2.mp3"),
        };
        let output = AudioMerger::new(&codec).merge(dir, "b", false).unwrap();

        assert_eq!(file_names(&output.skipped), vec!["b_part2.mp3"]);
        assert_eq!(
            output.entries,
            vec![TimestampEntry::new(1, 0), TimestampEntry::new(3, 1250)]
        );
        assert_eq!(
            file_names(&codec.inner.decoded.borrow()),
            vec!["b_part1.mp3", "b_part3.mp3"]
        );

        let merged = fs::read_to_string(&output.merged_path).unwrap();
        assert_eq!(
            merged.lines().collect::<Vec<_>>(),
            vec!["b_part1.mp3", "pause.mp3", "b_part3.mp3", "pause.mp3"]
        );
        let timestamps = fs::read_to_string(&output.timestamps_path).unwrap();
        assert_eq!(
            timestamps,
            "Part 1 - 00:00:00.000000\nPart 3 - 00:00:01.250000\n"
        );
    }

    #[test]
    fn test_merge_cleans_parts() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_part(dir, "b_part1.mp3", 1000);
        write_part(dir, "b_part2.mp3", 1000);
        write_part(dir, "unrelated.mp3", 10);
        fs::write(dir.join("b_timestamps.txt"), "Part 1: 00:00:00\n").unwrap();

        let codec = FakeCodec::default();
        AudioMerger::new(&codec).merge(dir, "b", true).unwrap();

        assert!(dir.join("b_full.mp3").exists());
        assert!(!dir.join("b_part1.mp3").exists());
        assert!(!dir.join("b_part2.mp3").exists());
        assert!(!dir.join("unrelated.mp3").exists());
        assert!(dir.join("b_timestamps.txt").exists());
        assert!(dir.join("timestamps.txt").exists());
    }

    #[test]
    fn test_merge_ignores_previous_full_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_part(dir, "b_part1.mp3", 1000);
        write_part(dir, "b_full.mp3", 99_000);

        let codec = FakeCodec::default();
        let output = AudioMerger::new(&codec).merge(dir, "b", false).unwrap();

        assert_eq!(output.entries, vec![TimestampEntry::new(1, 0)]);
        assert_eq!(file_names(&codec.decoded.borrow()), vec!["b_part1.mp3"]);
    }

    #[test]
    fn test_merge_without_parts_fails() {
        let temp_dir = TempDir::new().unwrap();
        let codec = FakeCodec::default();
        let err = AudioMerger::new(&codec)
            .merge(temp_dir.path(), "missing", false)
            .unwrap_err();
        assert!(matches!(err, NarratorError::NoParts { .. }));
    }
}
