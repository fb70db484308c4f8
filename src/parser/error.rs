//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur while reading and parsing an HTTP request.
///
/// Every variant except [`Error::Transport`] is a protocol error: the peer sent
/// something we refuse to interpret, and the connection is answered with
/// `400 Bad Request`. A transport error means the socket itself failed.
#[derive(Debug, Error)]
pub enum Error {
    /// The request line is missing its CRLF, is not UTF-8, or does not have
    /// exactly three space-separated tokens.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The header block is unterminated or contains a line without a `:`.
    #[error("Malformed headers: {0}")]
    MalformedHeaders(String),

    /// The method is unknown or not in the configured allow-list.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The request target does not start with `/`.
    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    /// The request line and headers do not fit in the frame buffer.
    #[error("Request head exceeds the {0}-byte frame limit")]
    FrameTooLarge(usize),

    /// The peer closed the connection before sending the declared body.
    #[error("Truncated body: expected {expected} bytes, received {received}")]
    TruncatedBody { expected: usize, received: usize },

    /// The `Content-Length` header is not a non-negative integer.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// The declared body is larger than the configured limit.
    #[error("Body of {declared} bytes exceeds the {limit}-byte limit")]
    BodyTooLarge { declared: usize, limit: usize },

    /// The peer closed the connection without sending anything.
    #[error("Empty request")]
    EmptyRequest,

    /// Socket I/O failed while reading the request.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Error parsing JSON.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure came from the socket rather than from the bytes the peer sent.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
