//! Fixed-size overlapping text chunking.
//!
//! Windows start at character 0 and advance by `chunk_size - overlap`. The
//! sequence ends with the first window that reaches the end of the text, which
//! is clipped, never padded.
//! Positions are counted in characters, so multi-byte text is never split
//! inside a code point.

use crate::config::ChunkingSettings;
use crate::error::{LecternError, Result};

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Window length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive windows.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            overlap: settings.overlap,
        }
    }
}

impl ChunkingConfig {
    /// Distance between the starts of consecutive windows.
    ///
    /// Fails unless `0 <= overlap < chunk_size`.
    pub fn step(&self) -> Result<usize> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(LecternError::InvalidInput(format!(
                "invalid chunking parameters: chunk_size={}, overlap={} (need overlap < chunk_size)",
                self.chunk_size, self.overlap
            )));
        }
        Ok(self.chunk_size - self.overlap)
    }
}

/// Iterator over the chunks of a text.
///
/// Cloning yields an independent iterator from the current position, so the
/// sequence can be restarted by cloning before consumption.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of every character, plus `text.len()` as a sentinel.
    offsets: Vec<usize>,
    start: usize,
    chunk_size: usize,
    step: usize,
}

impl Chunks<'_> {
    fn char_count(&self) -> usize {
        self.offsets.len() - 1
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.char_count();
        if self.start >= total {
            return None;
        }

        let end = (self.start + self.chunk_size).min(total);
        let chunk = &self.text[self.offsets[self.start]..self.offsets[end]];
        self.start = if end == total { total } else { self.start + self.step };
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.char_count();
        let remaining = if self.start >= total {
            0
        } else if self.start + self.chunk_size >= total {
            1
        } else {
            1 + (total - self.start - self.chunk_size).div_ceil(self.step)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// Split `text` into overlapping windows.
///
/// Empty text yields no chunks.
pub fn chunks(text: &str, config: ChunkingConfig) -> Result<Chunks<'_>> {
    let step = config.step()?;

    let offsets = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    Ok(Chunks {
        text,
        offsets,
        start: 0,
        chunk_size: config.chunk_size,
        step,
    })
}

/// Split `text` into owned chunks.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    let config = ChunkingConfig {
        chunk_size,
        overlap,
    };
    Ok(chunks(text, config)?.map(str::to_string).collect())
}
