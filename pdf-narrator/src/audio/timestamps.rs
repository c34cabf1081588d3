//! Part timestamp bookkeeping.

use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Start offset of one part within the narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampEntry {
    /// 1-based part number
    pub index: usize,
    /// Cumulative time before this part, in milliseconds
    pub start_ms: u64,
}

impl TimestampEntry {
    pub fn new(index: usize, start_ms: u64) -> Self {
        Self { index, start_ms }
    }

    /// `Part N: HH:MM:SS` (whole seconds), used by the synthesis log.
    pub fn synthesis_line(&self) -> String {
        format!("Part {}: {}", self.index, format_hms(self.start_ms))
    }

    /// `Part N - HH:MM:SS.ffffff`, used by the merge log.
    pub fn merge_line(&self) -> String {
        format!("Part {} - {}", self.index, format_hms_micros(self.start_ms))
    }
}

/// Format milliseconds as `HH:MM:SS`, truncating fractional seconds.
pub fn format_hms(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

/// Format milliseconds as `HH:MM:SS.ffffff`.
pub fn format_hms_micros(ms: u64) -> String {
    format!("{}.{:06}", format_hms(ms), (ms % 1000) * 1000)
}

/// Write one line per entry, replacing any previous file.
pub fn write_lines<I>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = String>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}
