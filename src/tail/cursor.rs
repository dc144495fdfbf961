//! Position tracking for the backward scan.

/// Half-open byte range `[start, end)` of one chunk read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    /// Number of bytes covered by the range
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Mutable scan state for one tail operation.
///
/// `next_position` only ever moves toward zero. Everything before it is still
/// unread; everything from it to `total_length` has been handed to the
/// reconstructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCursor {
    total_length: u64,
    next_position: u64,
    stop_requested: bool,
}

impl ReadCursor {
    /// Start a scan positioned at the end of a file of `total_length` bytes
    pub fn at_end(total_length: u64) -> Self {
        Self {
            total_length,
            next_position: total_length,
            stop_requested: false,
        }
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    pub fn next_position(&self) -> u64 {
        self.next_position
    }

    pub fn reached_beginning(&self) -> bool {
        self.next_position == 0
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// True once neither the file nor the sink has anything left for us
    pub fn is_finished(&self) -> bool {
        self.reached_beginning() || self.stop_requested
    }

    /// Bytes not yet scanned
    pub fn remaining(&self) -> u64 {
        self.next_position
    }

    /// Range of the next chunk when reading at most `bytes_to_read` bytes.
    ///
    /// Returns `None` once the beginning of the file has been reached.
    pub fn next_chunk(&self, bytes_to_read: usize) -> Option<ChunkRange> {
        if self.reached_beginning() {
            return None;
        }
        let start = self.next_position.saturating_sub(bytes_to_read as u64);
        Some(ChunkRange {
            start,
            end: self.next_position,
        })
    }

    /// Record that `chunk` was consumed and whether the sink wants to stop.
    pub fn advance(&mut self, chunk: ChunkRange, stop_requested: bool) {
        debug_assert_eq!(chunk.end, self.next_position, "chunks must be contiguous");
        debug_assert!(chunk.start <= chunk.end);
        self.next_position = chunk.start;
        self.stop_requested |= stop_requested;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walks_backward_to_zero() {
        let mut cursor = ReadCursor::at_end(10);
        assert!(!cursor.reached_beginning());

        let first = cursor.next_chunk(4).unwrap();
        assert_eq!(first, ChunkRange { start: 6, end: 10 });
        cursor.advance(first, false);

        let second = cursor.next_chunk(4).unwrap();
        assert_eq!(second, ChunkRange { start: 2, end: 6 });
        cursor.advance(second, false);

        // Last chunk is clamped at byte 0
        let third = cursor.next_chunk(4).unwrap();
        assert_eq!(third, ChunkRange { start: 0, end: 2 });
        assert_eq!(third.len(), 2);
        cursor.advance(third, false);

        assert!(cursor.reached_beginning());
        assert!(cursor.is_finished());
        assert_eq!(cursor.next_chunk(4), None);
    }

    #[test]
    fn test_empty_file_starts_at_beginning() {
        let cursor = ReadCursor::at_end(0);
        assert!(cursor.reached_beginning());
        assert_eq!(cursor.next_chunk(1024), None);
    }

    #[test]
    fn test_stop_request_is_sticky() {
        let mut cursor = ReadCursor::at_end(100);
        let chunk = cursor.next_chunk(10).unwrap();
        cursor.advance(chunk, true);
        assert!(cursor.stop_requested());
        assert!(cursor.is_finished());
        assert_eq!(cursor.remaining(), 90);

        let chunk = cursor.next_chunk(10).unwrap();
        cursor.advance(chunk, false);
        assert!(cursor.stop_requested());
    }

    #[test]
    fn test_chunk_larger_than_file() {
        let cursor = ReadCursor::at_end(5);
        let chunk = cursor.next_chunk(1 << 20).unwrap();
        assert_eq!(chunk, ChunkRange { start: 0, end: 5 });
        assert!(!chunk.is_empty());
    }
}
