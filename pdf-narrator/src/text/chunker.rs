//! Text chunking for TTS requests.
//!
//! Chunks are filled greedily word by word. Words are whitespace-delimited
//! tokens, so hyphenated compounds are never broken apart.

use super::TextChunk;

/// Default maximum chunk size in characters.
///
/// Leaves headroom under the service's input limit for a spoken part intro.
pub const DEFAULT_CHUNK_SIZE: usize = 3300;

/// Per-request input limit of the TTS service.
pub const TTS_INPUT_LIMIT: usize = 4096;

/// Split text on word boundaries into pieces of at most `max_chars` characters.
///
/// A single word longer than `max_chars` becomes a chunk of its own.
pub fn split_on_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split cleaned document text into 1-based indexed chunks.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<TextChunk> {
    split_on_words(text, max_chars.max(1))
        .into_iter()
        .enumerate()
        .map(|(i, text)| TextChunk::new(i + 1, text))
        .collect()
}
