//! Audio handling: codec access, part merging and timestamp files.

pub mod codec;
pub mod merger;
pub mod timestamps;

pub use codec::{AudioCodec, FfmpegCodec};
pub use merger::AudioMerger;
pub use timestamps::TimestampEntry;
