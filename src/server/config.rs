//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};

use crate::parser::{Method, ParseOptions, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_FRAME_SIZE};

/// Port the server listens on when none is given.
pub const DEFAULT_PORT: u16 = 9999;

/// Number of connections served concurrently when none is given.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 64;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of connections handled at once. The accept loop
    /// waits for a free worker before accepting the next connection.
    pub worker_pool_size: usize,
    /// The size of the buffer the request line and headers must fit in.
    pub read_buffer_size: usize,
    /// The largest request body accepted.
    pub max_body_size: usize,
    /// Methods accepted on the request line.
    pub allowed_methods: Vec<Method>,
}

impl ServerConfig {
    /// Listen on `port` on all interfaces with `worker_pool_size` workers.
    pub fn new(port: u16, worker_pool_size: usize) -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            worker_pool_size,
            ..Self::default()
        }
    }

    /// The parser limits derived from this configuration.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_frame_size: self.read_buffer_size,
            max_body_size: self.max_body_size,
            allowed_methods: self.allowed_methods.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            read_buffer_size: DEFAULT_MAX_FRAME_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            allowed_methods: vec![Method::GET, Method::POST],
        }
    }
}
