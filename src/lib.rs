//! A minimal HTTP/1.1 server.
//!
//! Every connection carries exactly one request: the server reads the head
//! into a bounded buffer, parses method, path, query parameters, headers and
//! a `Content-Length` body, dispatches on the exact (method, path) pair, lets
//! the handler write the response, and closes the connection.
//!
//! # Features
//!
//! - Bounded request-head buffer; oversize heads are rejected, never truncated
//! - Multi-valued query and form body parameters (`application/x-www-form-urlencoded`)
//! - Exact-match routing on method and path
//! - A fixed-size worker pool with backpressure on the accept loop
//! - Typed errors: protocol errors become `400`, missing routes `404`
//!
//! # Examples
//!
//! ## Parsing
//!
//! ```
//! use minihttpd::{parse_request, Method};
//!
//! let request = parse_request(b"GET /index.html?x=1&x=2 HTTP/1.1\r\nHost: test\r\n\r\n").unwrap();
//!
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.path, "/index.html");
//! assert_eq!(request.query_param_values("x"), ["1", "2"]);
//! assert_eq!(request.get_header("host").unwrap(), "test");
//! ```
//!
//! ## Error handling
//!
//! ```
//! use minihttpd::{parse_request, ParserError};
//!
//! match parse_request(b"GET / HTTP/1.1 extra\r\n\r\n") {
//!     Err(ParserError::MalformedRequestLine(line)) => println!("Malformed request line: {line}"),
//!     Err(err) => println!("Other error: {err}"),
//!     Ok(_) => unreachable!(),
//! }
//! ```
//!
//! ## Serving
//!
//! ```no_run
//! use std::io::Write;
//!
//! use minihttpd::{HttpRequest, HttpResponse, HttpServer, Method, ServerConfig, ServerError, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let mut server = HttpServer::new(ServerConfig::new(9999, 64));
//!     server.add_handler(
//!         Method::GET,
//!         "/hello",
//!         |request: &HttpRequest, out: &mut dyn Write| -> Result<(), ServerError> {
//!             let name = request.query_param("name").unwrap_or("World");
//!             HttpResponse::new(StatusCode::Ok)
//!                 .with_content_type("text/plain")
//!                 .with_body_string(format!("Hello, {name}!"))
//!                 .write_to(out)?;
//!             Ok(())
//!         },
//!     );
//!     server.listen().await
//! }
//! ```

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

pub mod static_files;

// Re-export commonly used items for convenience
pub use parser::{
    parse_request, read_request, Error as ParserError, HttpRequest, Method, Params, ParseOptions,
};
pub use server::{
    handle_connection, Error as ServerError, Handler, HttpResponse, HttpServer, RouteTable,
    ServerConfig, StatusCode,
};
pub use static_files::StaticFiles;
