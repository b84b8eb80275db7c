//! Word-aligned text chunking for TTS processing.

use super::TextChunk;

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Smallest chunk size the CLI accepts.
pub const MIN_CHUNK_SIZE: usize = 500;

/// Largest chunk size the CLI accepts.
pub const MAX_CHUNK_SIZE: usize = 2000;

/// Split text on word boundaries into chunks of at most `max_length` characters.
///
/// Words are accumulated greedily and joined by single spaces. A word that is
/// longer than `max_length` on its own becomes a chunk by itself and is not
/// split further.
pub fn split_text(text: &str, max_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_length {
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

/// Split document text into numbered chunks ready for synthesis.
pub fn chunk_document(text: &str, max_length: usize) -> Vec<TextChunk> {
    split_text(text, max_length)
        .into_iter()
        .enumerate()
        .map(|(index, text)| TextChunk::new(index, text))
        .collect()
}
