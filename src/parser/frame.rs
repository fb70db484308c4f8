//! Locating the request line and header block inside a bounded byte buffer.
//!
//! Scanning is a plain byte search over the captured buffer. Nothing is
//! decoded or copied here; [`RawFrame`] only records offsets.

use std::ops::Range;

use crate::parser::error::Error;

/// Terminates the request line and every header line.
pub const LINE_DELIMITER: &[u8] = b"\r\n";

/// Terminates the header block.
pub const HEADERS_DELIMITER: &[u8] = b"\r\n\r\n";

/// Find the first occurrence of `pattern` in `buffer[start..limit]`.
///
/// Returns the absolute offset of the match. `limit` is clamped to the buffer
/// length; an empty pattern or an empty window never matches.
pub fn find(buffer: &[u8], pattern: &[u8], start: usize, limit: usize) -> Option<usize> {
    let limit = limit.min(buffer.len());
    if pattern.is_empty() || start >= limit || limit - start < pattern.len() {
        return None;
    }
    buffer[start..limit]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|offset| start + offset)
}

/// The request head as captured from the wire: the buffer plus the offsets of
/// the request line and the header block.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    buffer: &'a [u8],
    request_line_end: usize,
    headers_start: usize,
    headers_end: usize,
    body_start: usize,
}

impl<'a> RawFrame<'a> {
    /// Scan `buffer` for the request-line and header-block boundaries.
    ///
    /// `capacity` is the size of the buffer the bytes were read into. When a
    /// delimiter is missing and the buffer was filled to capacity, the head
    /// did not fit and the error is [`Error::FrameTooLarge`]; otherwise the
    /// peer sent an incomplete head.
    pub fn scan(buffer: &'a [u8], capacity: usize) -> Result<Self, Error> {
        let read = buffer.len().min(capacity);
        let buffer = &buffer[..read];
        let full = read >= capacity;

        let request_line_end = match find(buffer, LINE_DELIMITER, 0, read) {
            Some(end) => end,
            None if full => return Err(Error::FrameTooLarge(capacity)),
            None => {
                return Err(Error::MalformedRequestLine(
                    "missing CRLF after request line".to_string(),
                ))
            }
        };

        // A head without headers is "<line>\r\n\r\n", so the terminator may
        // start exactly at the end of the request line.
        let terminator = match find(buffer, HEADERS_DELIMITER, request_line_end, read) {
            Some(at) => at,
            None if full => return Err(Error::FrameTooLarge(capacity)),
            None => {
                return Err(Error::MalformedHeaders(
                    "missing blank line after headers".to_string(),
                ))
            }
        };

        let headers_start = request_line_end + LINE_DELIMITER.len();
        Ok(Self {
            buffer,
            request_line_end,
            headers_start,
            headers_end: terminator.max(headers_start),
            body_start: terminator + HEADERS_DELIMITER.len(),
        })
    }

    /// Offsets of the request line, without its CRLF.
    pub fn request_line_range(&self) -> Range<usize> {
        0..self.request_line_end
    }

    /// Offsets of the header block, without the terminating blank line.
    pub fn headers_range(&self) -> Range<usize> {
        self.headers_start..self.headers_end
    }

    pub fn request_line(&self) -> &'a [u8] {
        &self.buffer[self.request_line_range()]
    }

    pub fn headers(&self) -> &'a [u8] {
        &self.buffer[self.headers_range()]
    }

    /// Bytes that arrived after the header block in the same buffer.
    pub fn body_prefix(&self) -> &'a [u8] {
        &self.buffer[self.body_start..]
    }

    /// Length of the whole head, terminator included.
    pub fn head_len(&self) -> usize {
        self.body_start
    }
}
