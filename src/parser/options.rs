//! Limits and policies applied while parsing.

use crate::parser::method::Method;

/// Size of the buffer the request line and headers must fit in.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4096;

/// Largest body accepted through `Content-Length`.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Capacity of the frame buffer holding the request line and header block.
    pub max_frame_size: usize,
    /// Largest `Content-Length` accepted.
    pub max_body_size: usize,
    /// Methods accepted on the request line; anything else is `UnsupportedMethod`.
    pub allowed_methods: Vec<Method>,
}

impl ParseOptions {
    pub fn allows(&self, method: Method) -> bool {
        self.allowed_methods.contains(&method)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            allowed_methods: vec![Method::GET, Method::POST],
        }
    }
}
