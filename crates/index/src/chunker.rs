//! Text chunking with configurable size and overlap.

/// Chunk text into overlapping word windows.
///
/// Sizes are in words, not characters, so fragment boundaries never split
/// a word and multi-byte text is handled for free.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || chunk_size == 0 {
        return vec![];
    }

    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));

        if end == words.len() {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {} words, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}
