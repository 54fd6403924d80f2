//! Row cursor over a possibly multi-chunk column.

/// Placement of one physical chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Index of the first element inside the chunk's buffers.
    pub offset: usize,
    /// Number of elements.
    pub len: usize,
    /// Number of null elements.
    pub null_count: usize,
}

impl ChunkSpan {
    /// Span with no nulls.
    pub const fn dense(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            null_count: 0,
        }
    }

    const SENTINEL: Self = Self::dense(0, 0);
}

/// Iterator state over a column's chunks, one logical row at a time.
///
/// Empty chunks are dropped on construction and exactly one empty sentinel span
/// is appended, so [`advance`](Self::advance) can step across chunk boundaries
/// with arithmetic instead of a branch and never index past the span list.
#[derive(Debug, Clone)]
pub struct ChunkCursor {
    spans: Vec<ChunkSpan>,
    chunk: usize,
    offset: usize,
}

impl ChunkCursor {
    /// Build a cursor positioned on the first element of the first non-empty chunk.
    ///
    /// Empty spans are skipped, so chunk indices count non-empty chunks only.
    pub fn new(spans: impl IntoIterator<Item = ChunkSpan>) -> Self {
        let mut spans: Vec<ChunkSpan> = spans.into_iter().filter(|s| s.len > 0).collect();
        spans.push(ChunkSpan::SENTINEL);
        let offset = spans[0].offset;
        Self {
            spans,
            chunk: 0,
            offset,
        }
    }

    /// Cursor over one dense chunk of `len` elements.
    pub fn single(len: usize) -> Self {
        Self::new([ChunkSpan::dense(0, len)])
    }

    /// Step to the next logical row.
    #[inline]
    pub fn advance(&mut self) {
        self.offset += 1;
        let span = self.spans[self.chunk];
        let new_chunk = usize::from(self.offset == span.offset + span.len);
        self.chunk += new_chunk;
        let next = self.spans[self.chunk].offset;
        self.offset = new_chunk * next + (1 - new_chunk) * self.offset;
    }

    /// Index of the current chunk among the non-empty chunks.
    #[inline]
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Position inside the current chunk's buffers.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Position relative to the start of the current chunk.
    #[inline]
    pub fn relative(&self) -> usize {
        self.offset - self.spans[self.chunk].offset
    }

    /// Current span.
    #[inline]
    pub fn span(&self) -> &ChunkSpan {
        &self.spans[self.chunk]
    }

    /// Whether every real chunk has been consumed.
    pub fn at_sentinel(&self) -> bool {
        self.chunk + 1 == self.spans.len()
    }

    /// Number of real chunks.
    pub fn chunk_count(&self) -> usize {
        self.spans.len() - 1
    }
}
