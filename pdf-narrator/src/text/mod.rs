//! Text processing for TTS: reference cleanup and chunking.

pub mod chunker;
pub mod cleaner;

pub use chunker::split_into_chunks;
pub use cleaner::{clean_text, strip_trailing_references};

/// A chunk of document text ready for one TTS request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// 1-based position in the document
    pub index: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }
}
