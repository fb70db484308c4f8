//! Request handlers.

use std::io::Write;

use crate::parser::HttpRequest;
use crate::server::Error;

/// Produces the response for a parsed request.
///
/// The handler writes a complete HTTP response into `out`: status line,
/// headers including `Content-Length`, a blank line, then the body. The
/// server flushes the output and closes the connection afterwards. If the
/// handler fails or panics, whatever it wrote is discarded and the client
/// gets a `500 Internal Server Error` instead.
///
/// Handlers run on a blocking thread, so they may do ordinary file I/O.
/// The response is buffered in memory and sent only after `handle`
/// returns, so a large body is held in full until then.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &HttpRequest, out: &mut dyn Write) -> Result<(), Error>;
}

impl<F> Handler for F
where
    F: Fn(&HttpRequest, &mut dyn Write) -> Result<(), Error> + Send + Sync + 'static,
{
    fn handle(&self, request: &HttpRequest, out: &mut dyn Write) -> Result<(), Error> {
        self(request, out)
    }
}
