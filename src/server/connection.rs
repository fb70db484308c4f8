//! Serving one accepted connection: parse, dispatch, respond, close.

use std::any::Any;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinError;

use crate::parser::{read_request, Error as ParserError, ParseOptions};
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};
use crate::server::routes::RouteTable;

/// Handle a single connection from first byte to close.
///
/// Parse failures are answered with `400 Bad Request`, unknown routes with
/// `404 Not Found`, failing or panicking handlers with `500 Internal Server
/// Error`; all three have an empty body. Transport errors get no response.
/// The output is flushed and shut down on every path before returning.
pub async fn handle_connection<S>(
    socket: &mut S,
    routes: &RouteTable,
    options: &ParseOptions,
) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let outcome = serve_request(socket, routes, options).await;
    let closed = close(socket).await;
    // The first failure is the interesting one.
    outcome.and(closed)
}

async fn serve_request<S>(
    socket: &mut S,
    routes: &RouteTable,
    options: &ParseOptions,
) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = match read_request(socket, options).await {
        Ok(request) => request,
        Err(ParserError::EmptyRequest) => {
            debug!("Peer closed the connection without sending a request");
            return Ok(());
        }
        Err(ParserError::Transport(e)) => return Err(Error::IoError(e)),
        Err(e) => {
            warn!("Rejecting request: {e}");
            write_response(socket, &HttpResponse::new(StatusCode::BadRequest)).await?;
            return Err(Error::ParseError(e));
        }
    };

    info!("{}", request.request_line());
    debug!("Parsed request: {request:?}");

    let handler = match routes.lookup(request.method, &request.path) {
        Ok(handler) => Arc::clone(handler),
        Err(e) => {
            info!("{e}");
            write_response(socket, &HttpResponse::new(StatusCode::NotFound)).await?;
            return Err(e);
        }
    };

    let route = format!("{} {}", request.method, request.path);
    let outcome = tokio::task::spawn_blocking(move || {
        let mut sink = Vec::new();
        handler.handle(&request, &mut sink).map(|()| sink)
    })
    .await;

    match outcome {
        Ok(Ok(response)) => {
            if response.is_empty() {
                warn!("Handler for {route} wrote no response");
            }
            socket.write_all(&response).await?;
            Ok(())
        }
        Ok(Err(e)) => {
            error!("Handler for {route} failed: {e}");
            write_response(socket, &HttpResponse::new(StatusCode::InternalServerError)).await?;
            Err(Error::HandlerFailed(e.to_string()))
        }
        Err(join_error) => {
            let message = panic_message(join_error);
            error!("Handler for {route} panicked: {message}");
            write_response(socket, &HttpResponse::new(StatusCode::InternalServerError)).await?;
            Err(Error::HandlerPanicked(message))
        }
    }
}

async fn write_response<S>(socket: &mut S, response: &HttpResponse) -> Result<(), Error>
where
    S: AsyncWrite + Unpin,
{
    socket.write_all(&response.to_bytes()).await?;
    Ok(())
}

async fn close<S>(socket: &mut S) -> Result<(), Error>
where
    S: AsyncWrite + Unpin,
{
    socket.flush().await?;
    socket.shutdown().await?;
    Ok(())
}

fn panic_message(join_error: JoinError) -> String {
    match join_error.try_into_panic() {
        Ok(payload) => describe_panic(payload.as_ref()),
        Err(join_error) => join_error.to_string(),
    }
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
