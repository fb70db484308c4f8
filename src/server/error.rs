//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::{Error as ParserError, Method};

/// Errors that can occur while serving a connection.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error on the socket or in a handler's output sink.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No route is registered for the method at all.
    #[error("No route for method {0}")]
    NoRouteForMethod(Method),

    /// The method has routes, but none for this path.
    #[error("No route for {0} {1}")]
    NoRouteForPath(Method, String),

    /// A handler returned an error.
    #[error("Handler failed: {0}")]
    HandlerFailed(String),

    /// A handler panicked.
    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// Whether the connection failed at the transport level, leaving no
    /// usable socket to answer on.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::IoError(_) => true,
            Error::ParseError(e) => e.is_transport(),
            _ => false,
        }
    }
}
