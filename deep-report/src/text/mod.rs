//! Text processing: markdown stripping, speech cleanup, and chunking.

pub mod chunker;
mod cleaner;
mod markdown;
mod sentences;

pub use chunker::{DEFAULT_MAX_CHUNK_LENGTH, chunk};
pub use cleaner::clean_for_speech;
pub use markdown::strip_markdown;

/// A sentence-aligned text segment queued for sequential speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the sequence (0-based, contiguous)
    pub index: usize,
    /// Non-empty, trimmed text
    pub content: String,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(index: usize, content: String) -> Self {
        Self { index, content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_creation() {
        let chunk = Chunk::new(1, "Hello world".to_string());
        assert_eq!(chunk.index, 1);
        assert_eq!(chunk.content, "Hello world");
    }

    #[test]
    fn test_markdown_report_to_speech_chunks() {
        let report = "**La Luna**\n\n## Introduzione\nLa Luna è il satellite della Terra. Ruota intorno a noi.\n\n- Ha fasi.";
        let chunks = chunk(&clean_for_speech(&strip_markdown(report)), 40);
        let joined: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            joined,
            vec![
                "La Luna\n\nIntroduzione\nLa Luna è il satellite della Terra.",
                "Ruota intorno a noi. Ha fasi.",
            ]
        );
    }
}
