//! Line reconstruction from a backward byte stream.
//!
//! Chunks arrive in strictly decreasing file position. Each chunk is scanned
//! from its last byte to its first; bytes accumulate in a single pending buffer
//! kept in reverse order, which is flipped in place once per completed line.
//!
//! Boundary rules:
//! - The segment after the file's final delimiter is only emitted when it is
//!   non-empty, so `"a\nb\n"` yields `b`, `a` and not a phantom empty line.
//! - The leading segment (before the first delimiter) is flushed by
//!   [`LineReconstructor::finish`] once byte 0 has been read. It is emitted with
//!   its real content; no delimiter byte is added in front of it.

use bstr::{BStr, ByteSlice};

/// One reconstructed line, in natural byte order and without its delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line bytes between two delimiters (or file start/end)
    pub content: Vec<u8>,
    /// Absolute file position of the first content byte
    pub offset: u64,
    /// Whether a delimiter follows this line in the file
    pub terminated: bool,
}

impl Line {
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    pub fn as_bstr(&self) -> &BStr {
        self.content.as_bstr()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content
    }
}

/// Rebuilds lines from chunks fed back-to-front.
#[derive(Debug)]
pub struct LineReconstructor {
    delimiter: u8,
    /// Fragment not yet terminated by a delimiter, stored reversed
    pending: Vec<u8>,
    seen_delimiter: bool,
}

impl LineReconstructor {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            pending: Vec::new(),
            seen_delimiter: false,
        }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Length of the fragment carried into the next (earlier) chunk
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Scan one chunk starting at absolute position `chunk_start`.
    ///
    /// Completed lines are appended to `out` in reverse file order. The chunk
    /// must immediately precede the previously pushed one.
    pub fn push_chunk(&mut self, chunk_start: u64, bytes: &[u8], out: &mut Vec<Line>) {
        let mut end = bytes.len();
        while let Some(pos) = memchr::memrchr(self.delimiter, &bytes[..end]) {
            self.pending.extend(bytes[pos + 1..end].iter().rev());
            self.complete_line(chunk_start + pos as u64 + 1, out);
            end = pos;
        }
        self.pending.extend(bytes[..end].iter().rev());
    }

    /// Flush the leading segment once the beginning of the file is reached.
    ///
    /// An empty leading segment is still a line when the file contained a
    /// delimiter (`"\nx"` starts with an empty line); an empty file yields
    /// nothing. The reconstructor is reset afterwards.
    pub fn finish(&mut self, out: &mut Vec<Line>) {
        if self.seen_delimiter || !self.pending.is_empty() {
            let mut content = std::mem::take(&mut self.pending);
            content.reverse();
            out.push(Line {
                content,
                offset: 0,
                terminated: self.seen_delimiter,
            });
        }
        self.seen_delimiter = false;
    }

    fn complete_line(&mut self, offset: u64, out: &mut Vec<Line>) {
        let trailing = !self.seen_delimiter;
        self.seen_delimiter = true;

        if trailing && self.pending.is_empty() {
            // file ends with a delimiter
            return;
        }

        let mut content = std::mem::take(&mut self.pending);
        content.reverse();
        out.push(Line {
            content,
            offset,
            terminated: !trailing,
        });
    }
}
