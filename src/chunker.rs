use std::collections::VecDeque;
use std::ops::Range;

use crate::error::AssistantError;

/// Separators tried in order, largest semantic unit first.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into overlapping windows, preferring paragraph, then line,
/// then word boundaries, and only cutting inside a word as a last resort.
///
/// Sizes are measured in characters.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    overlap: usize,
}

impl RecursiveChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, AssistantError> {
        if chunk_size == 0 {
            return Err(AssistantError::Validation(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(AssistantError::Validation(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn split(&self, text: &str) -> Result<Vec<String>, AssistantError> {
        let normalized = text.replace("\r\n", "\n");
        if normalized.trim().is_empty() {
            return Err(AssistantError::EmptyInput);
        }

        let spans = self.split_range(&normalized, 0..normalized.len(), &DEFAULT_SEPARATORS);
        let chunks: Vec<String> = spans
            .into_iter()
            .map(|r| normalized[r].trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if chunks.is_empty() {
            return Err(AssistantError::EmptyInput);
        }
        Ok(chunks)
    }

    fn split_range(&self, text: &str, range: Range<usize>, separators: &[&str]) -> Vec<Range<usize>> {
        let segment = &text[range.clone()];

        // The empty separator always applies, so this never runs off the end.
        let sep_idx = separators
            .iter()
            .position(|s| s.is_empty() || segment.contains(s))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(sep_idx).copied().unwrap_or("");
        let remaining = &separators[(sep_idx + 1).min(separators.len())..];

        let pieces = pieces_of(segment, range.start, separator);

        let mut out = Vec::new();
        let mut good: Vec<Range<usize>> = Vec::new();
        for piece in pieces {
            if char_len(text, &piece) <= self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                out.extend(self.merge(text, &good));
                good.clear();
            }
            if remaining.is_empty() {
                out.push(piece);
            } else {
                out.extend(self.split_range(text, piece, remaining));
            }
        }
        if !good.is_empty() {
            out.extend(self.merge(text, &good));
        }
        out
    }

    /// Greedily packs contiguous pieces into windows of at most `chunk_size`
    /// characters, carrying up to `overlap` trailing characters forward.
    fn merge(&self, text: &str, pieces: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut out = Vec::new();
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(text, piece);
            if total + len > self.chunk_size && !window.is_empty() {
                out.push(window_span(&window));
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece.clone(), len));
            total += len;
        }
        if !window.is_empty() {
            out.push(window_span(&window));
        }
        out
    }
}

fn window_span(window: &VecDeque<(Range<usize>, usize)>) -> Range<usize> {
    let start = window.front().map(|(r, _)| r.start).unwrap_or(0);
    let end = window.back().map(|(r, _)| r.end).unwrap_or(start);
    start..end
}

fn char_len(text: &str, range: &Range<usize>) -> usize {
    text[range.clone()].chars().count()
}

/// Cuts `segment` after every occurrence of `separator`, keeping the separator
/// on the piece it terminates. Offsets are absolute (shifted by `base`).
fn pieces_of(segment: &str, base: usize, separator: &str) -> Vec<Range<usize>> {
    if separator.is_empty() {
        return segment
            .char_indices()
            .map(|(i, c)| base + i..base + i + c.len_utf8())
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, sep) in segment.match_indices(separator) {
        let end = idx + sep.len();
        pieces.push(base + start..base + end);
        start = end;
    }
    if start < segment.len() {
        pieces.push(base + start..base + segment.len());
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covers_all_content(text: &str, chunks: &[String]) -> bool {
        // Each chunk is a verbatim substring; walk the text and make sure every
        // non-whitespace char falls inside some chunk occurrence.
        let mut covered = vec![false; text.len()];
        let mut search_from = 0;
        for chunk in chunks {
            let Some(pos) = text[search_from..].find(chunk.as_str()).map(|p| p + search_from)
                .or_else(|| text.find(chunk.as_str()))
            else {
                return false;
            };
            for flag in covered.iter_mut().skip(pos).take(chunk.len()) {
                *flag = true;
            }
            search_from = pos;
        }
        text.char_indices()
            .all(|(i, c)| c.is_whitespace() || covered[i])
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(RecursiveChunker::new(0, 0).is_err());
        assert!(RecursiveChunker::new(10, 10).is_err());
        assert!(RecursiveChunker::new(10, 9).is_ok());
    }

    #[test]
    fn test_empty_input() {
        let chunker = RecursiveChunker::new(100, 10).unwrap();
        assert!(matches!(chunker.split(""), Err(AssistantError::EmptyInput)));
        assert!(matches!(chunker.split(" \n\r\n\t "), Err(AssistantError::EmptyInput)));
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = RecursiveChunker::new(1000, 200).unwrap();
        let chunks = chunker.split("  Osmosis is diffusion of water.  ").unwrap();
        assert_eq!(chunks, vec!["Osmosis is diffusion of water.".to_string()]);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let chunker = RecursiveChunker::new(30, 0).unwrap();
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = chunker.split(text).unwrap();
        assert_eq!(
            chunks,
            vec![
                "First paragraph here.".to_string(),
                "Second paragraph here.".to_string()
            ]
        );
    }

    #[test]
    fn test_word_windows_overlap() {
        let chunker = RecursiveChunker::new(10, 4).unwrap();
        let chunks = chunker.split("aaa bbb ccc ddd").unwrap();
        assert_eq!(
            chunks,
            vec!["aaa bbb".to_string(), "bbb ccc".to_string(), "ccc ddd".to_string()]
        );
    }

    #[test]
    fn test_hard_split_without_separators() {
        let chunker = RecursiveChunker::new(4, 1).unwrap();
        let chunks = chunker.split("abcdefghij").unwrap();
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
        for c in &chunks {
            assert!(c.chars().count() <= 4);
        }
    }

    #[test]
    fn test_long_unbroken_text_is_windowed() {
        let text = "x".repeat(5000);
        let chunker = RecursiveChunker::new(100, 10).unwrap();
        let chunks = chunker.split(&text).unwrap();
        for c in &chunks {
            assert!(c.chars().count() <= 100);
        }
        // Consecutive windows share exactly `overlap` characters.
        assert_eq!(chunks.len(), 56);
        assert_eq!(chunks.last().map(String::len), Some(50));
        let covered: usize = chunks.iter().map(String::len).sum::<usize>() - (chunks.len() - 1) * 10;
        assert_eq!(covered, 5000);
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let chunker = RecursiveChunker::new(3, 1).unwrap();
        let chunks = chunker.split("αβγδεζ").unwrap();
        assert_eq!(chunks, vec!["αβγ", "γδε", "εζ"]);
    }

    #[test]
    fn test_deterministic_and_bounded() {
        let text = "Cells are the basic unit of life.\nThe mitochondria is the powerhouse of the cell.\n\n\
                    Photosynthesis converts light energy into chemical energy. It happens in chloroplasts.\n\
                    Osmosis moves water across a semi-permeable membrane."
            .repeat(5);
        let chunker = RecursiveChunker::new(80, 20).unwrap();
        let a = chunker.split(&text).unwrap();
        let b = chunker.split(&text).unwrap();
        assert_eq!(a, b);
        assert!(a.len() > 1);
        for c in &a {
            assert!(c.chars().count() <= 80, "chunk too long: {:?}", c);
        }
        assert!(covers_all_content(&text, &a));
    }
}
