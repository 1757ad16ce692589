//! Sentence-aligned chunking for sequential speech.

use super::Chunk;
use super::sentences::split_into_sentences;

/// Default maximum chunk length in characters.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 200;

/// Split text into speech-sized chunks.
///
/// Sentences are accumulated greedily while the chunk, including the joining
/// space, stays within `max_chunk_length` characters. A sentence that is longer
/// than the limit on its own becomes a chunk by itself and is never cut.
///
/// # Arguments
/// * `text` - Plain text (no markup)
/// * `max_chunk_length` - Maximum chunk length in characters (default: 200)
///
/// # Returns
/// Chunks with contiguous 0-based indices and non-empty, trimmed contents.
pub fn chunk(text: &str, max_chunk_length: usize) -> Vec<Chunk> {
    chunk_text(text, max_chunk_length)
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk::new(index, content))
        .collect()
}

/// Split text into chunk strings.
pub fn chunk_text(text: &str, max_chunk_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current_chunk = String::new();
    let mut current_len = 0;

    for sentence in split_into_sentences(text) {
        let sentence_len = sentence.chars().count();

        if current_chunk.is_empty() {
            current_chunk.push_str(sentence);
            current_len = sentence_len;
        } else if current_len + 1 + sentence_len <= max_chunk_length {
            current_chunk.push(' ');
            current_chunk.push_str(sentence);
            current_len += 1 + sentence_len;
        } else {
            chunks.push(std::mem::take(&mut current_chunk));
            current_chunk.push_str(sentence);
            current_len = sentence_len;
        }
    }

    // Don't forget the last chunk
    if !current_chunk.is_empty() {
        chunks.push(current_chunk);
    }

    chunks
}
