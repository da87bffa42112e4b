use std::vec::IntoIter;

use crate::errors::ConfigError;
use crate::format::FormattedLine;

///
/// A batch of request lines submitted as one annotation request.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationChunk {
    /// Position of this chunk in the run, starting at 0.
    pub index: usize,
    pub lines: Vec<FormattedLine>,
}

impl AnnotationChunk {
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

///
/// Splits request lines into chunks of at most `chunk_size` lines.
///
/// Lines are consumed front to back, so every line lands in exactly one
/// chunk and chunk order follows line order. Only the last chunk may be
/// short. Chunks are produced lazily, one per call to `next`.
///
#[derive(Debug)]
pub struct Chunker {
    lines: IntoIter<FormattedLine>,
    chunk_size: usize,
    next_index: usize,
}

impl Chunker {
    pub fn new(lines: Vec<FormattedLine>, chunk_size: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(Chunker {
            lines: lines.into_iter(),
            chunk_size,
            next_index: 0,
        })
    }

    /// Number of chunks still to be produced.
    pub fn remaining(&self) -> usize {
        self.lines.len().div_ceil(self.chunk_size)
    }
}

impl Iterator for Chunker {
    type Item = AnnotationChunk;

    fn next(&mut self) -> Option<Self::Item> {
        let lines: Vec<FormattedLine> = self.lines.by_ref().take(self.chunk_size).collect();
        if lines.is_empty() {
            return None;
        }

        let chunk = AnnotationChunk {
            index: self.next_index,
            lines,
        };
        self.next_index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

/// Split all lines into chunks at once.
pub fn chunk_lines(
    lines: Vec<FormattedLine>,
    chunk_size: usize,
) -> Result<Vec<AnnotationChunk>, ConfigError> {
    Ok(Chunker::new(lines, chunk_size)?.collect())
}
