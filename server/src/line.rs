//! Line framing over partial reads.
//!
//! TCP gives no message boundaries: a client's `name\r\n` can arrive in
//! one read or byte by byte across many readiness events. The assembler
//! buffers raw reads per connection until the terminator shows up, and
//! enforces a hard cap so an endless unterminated stream cannot grow the
//! buffer without bound.

use shared::TERMINATOR;

/// Result of feeding one read's worth of bytes to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Terminator not seen yet; nothing to act on this cycle.
    Partial,
    /// The accumulated input was exactly the terminator.
    Blank,
    /// A full line, terminator stripped.
    Complete(String),
}

/// The accumulated unterminated input exceeded the configured limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTooLong {
    pub len: usize,
    pub limit: usize,
}

impl std::fmt::Display for LineTooLong {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unterminated line of {} bytes exceeds the {} byte limit",
            self.len, self.limit
        )
    }
}

impl std::error::Error for LineTooLong {}

/// Per-connection buffer that turns raw reads into protocol lines.
///
/// State persists between calls: a `Partial` outcome means the caller
/// should simply feed the next read into the same assembler.
#[derive(Debug)]
pub struct LineAssembler {
    buf: Vec<u8>,
    limit: usize,
}

impl LineAssembler {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
        }
    }

    /// Appends one read's worth of bytes and checks for a complete line.
    ///
    /// A line is complete when the buffer ends with the terminator; it is
    /// blank when the whole accumulated buffer is nothing but the
    /// terminator. Both reset the buffer for the next line. Note the
    /// check is against the accumulated buffer, not the latest read, so
    /// a terminator arriving after buffered partial content completes
    /// that content rather than reading as blank.
    pub fn feed(&mut self, data: &[u8]) -> Result<LineOutcome, LineTooLong> {
        self.buf.extend_from_slice(data);

        if self.buf.ends_with(TERMINATOR.as_bytes()) {
            if self.buf.len() == TERMINATOR.len() {
                self.buf.clear();
                return Ok(LineOutcome::Blank);
            }
            let content = &self.buf[..self.buf.len() - TERMINATOR.len()];
            let line = String::from_utf8_lossy(content).into_owned();
            self.buf.clear();
            return Ok(LineOutcome::Complete(line));
        }

        if self.buf.len() > self.limit {
            return Err(LineTooLong {
                len: self.buf.len(),
                limit: self.limit,
            });
        }

        Ok(LineOutcome::Partial)
    }
}
