//! HTTP server implementation.
//!
//! One accept loop hands every connection to a bounded pool of workers.
//! Each worker reads and parses one request, dispatches it by exact
//! method and path, and closes the connection.

mod config;
mod connection;
mod error;
mod handler;
mod http_server;
mod response;
mod routes;
mod tests;

// Re-export public items
pub use config::{ServerConfig, DEFAULT_PORT, DEFAULT_WORKER_POOL_SIZE};
pub use connection::handle_connection;
pub use error::Error;
pub use handler::Handler;
pub use http_server::HttpServer;
pub use response::{HttpResponse, StatusCode};
pub use routes::RouteTable;
