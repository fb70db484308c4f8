//! HTTP request parsing.
//!
//! Parsing runs in two stages: [`frame`] locates the request line and the
//! header block inside a bounded buffer, and [`request`] turns that frame
//! into an [`HttpRequest`], reading the body declared by `Content-Length`.

mod error;
pub mod form;
pub mod frame;
mod method;
mod options;
mod request;

// Re-export public items
pub use error::Error;
pub use form::Params;
pub use frame::RawFrame;
pub use method::Method;
pub use options::{ParseOptions, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_FRAME_SIZE};
pub use request::HttpRequest;

// Re-export the parse functions
pub use request::{parse_headers, parse_request, parse_request_with, read_request};
