//! Boundary-aware, overlapping text chunking.
//!
//! All sizes and offsets count `char`s, never bytes, so multi-byte text is
//! never split inside a code point.

/// Boundary markers, highest priority first.
const BOUNDARIES: [&str; 4] = ["\n\n", ".\n", ". ", "\n"];

/// A slice of the source text together with its char offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
    /// Offset of the first char, inclusive.
    pub start: usize,
    /// Offset one past the last char.
    pub end: usize,
}

/// Splits text into windows of `size` chars overlapping by `overlap` chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
    min_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(2000, 200)
    }
}

impl Chunker {
    pub fn new(size: usize, overlap: usize) -> Self {
        Self {
            size: size.max(1),
            overlap,
            min_chars: 50,
        }
    }

    /// Chunks whose trimmed length is below `min_chars` are dropped.
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Split `text` into ordered chunks.
    ///
    /// A window is cut after the last boundary marker found in its second
    /// half, checking markers in priority order. The next window starts
    /// `overlap` chars before the cut, or at the cut when that would not move
    /// forward.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = (start + self.size).min(len);

            if end < len {
                if let Some(cut) = boundary_cut(&chars[start..end]) {
                    end = start + cut;
                }
            }

            let content: String = chars[start..end].iter().collect();
            if content.trim().chars().count() >= self.min_chars {
                chunks.push(TextChunk {
                    content,
                    start,
                    end,
                });
            }

            if end >= len {
                break;
            }

            let next = end.saturating_sub(self.overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }
}

/// Chunk with the default window (2000) and overlap (200).
pub fn chunk_text(text: &str) -> Vec<TextChunk> {
    Chunker::default().chunk(text)
}

/// Cut position (exclusive, relative to the window) just after the best
/// boundary in the window's second half.
fn boundary_cut(window: &[char]) -> Option<usize> {
    let midpoint = window.len() / 2;

    BOUNDARIES.iter().find_map(|marker| {
        let marker: Vec<char> = marker.chars().collect();
        rfind(window, &marker)
            .filter(|pos| *pos >= midpoint)
            .map(|pos| pos + marker.len())
    })
}

fn rfind(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
