//! # ragspace-chunker
//!
//! Fixed-size chunking for the ragspace ingestion pipeline.
//!
//! Splits text into non-overlapping windows of `size` characters. No
//! sentence or paragraph awareness and no overlap between chunks; the
//! concatenation of the output always reconstructs the input exactly.
//! Splitting relevant context across a chunk boundary is an accepted
//! consequence of that simplicity.

use tracing::debug;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Split `text` into consecutive windows of `size` characters.
///
/// Counted in characters, not bytes, so multi-byte text never splits a code
/// point. The final chunk carries the remainder. `size == 0` or empty text
/// yields no chunks.
#[must_use]
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::with_capacity(size);
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            chunks.push(std::mem::replace(&mut current, String::with_capacity(size)));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    debug!("chunked {} chars into {} chunks", text.chars().count(), chunks.len());
    chunks
}
