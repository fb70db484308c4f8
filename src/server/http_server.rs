//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::parser::{Method, ParseOptions};
use crate::server::config::ServerConfig;
use crate::server::connection::handle_connection;
use crate::server::error::Error;
use crate::server::handler::Handler;
use crate::server::routes::RouteTable;

/// An HTTP server.
///
/// Routes are registered with [`add_handler`](Self::add_handler) before
/// serving; [`listen`](Self::listen) and [`serve`](Self::serve) consume the
/// server, freezing the route table for the lifetime of the accept loop.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    routes: RouteTable,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and no routes.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_routes(config, RouteTable::new())
    }

    /// Create a server around an already built route table.
    pub fn with_routes(config: ServerConfig, routes: RouteTable) -> Self {
        Self { config, routes }
    }

    /// Add a route to the server.
    pub fn add_handler<H: Handler>(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: H,
    ) -> &mut Self {
        self.routes.add_handler(method, path, handler);
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Display the registered endpoints.
    fn display_server_info(&self) {
        info!(
            "Serving with {workers} workers, {frame}-byte request frames",
            workers = self.config.worker_pool_size,
            frame = self.config.read_buffer_size
        );
        info!("Registered endpoints:");
        for (method, path) in self.routes.routes() {
            info!("  {method} {path}");
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Bind the configured address and serve until the process exits.
    pub async fn listen(self) -> Result<(), Error> {
        let listener = self.setup_listener().await?;
        self.serve(listener).await
    }

    /// Accept connections from `listener` until the process exits.
    ///
    /// At most `worker_pool_size` connections are in flight. When all workers
    /// are busy the loop stops accepting, so further clients wait in the
    /// listen backlog instead of being dropped.
    pub async fn serve(self, listener: TcpListener) -> Result<(), Error> {
        if self.config.worker_pool_size == 0 {
            return Err(Error::InternalError(
                "worker pool size must be at least 1".to_string(),
            ));
        }

        self.display_server_info();

        let routes = Arc::new(self.routes);
        let options = Arc::new(self.config.parse_options());
        let workers = Arc::new(Semaphore::new(self.config.worker_pool_size));

        loop {
            // Wait for a free worker before taking the next connection.
            let permit = Arc::clone(&workers)
                .acquire_owned()
                .await
                .map_err(|e| Error::InternalError(e.to_string()))?;

            match listener.accept().await {
                Ok((socket, addr)) => Self::spawn_connection(
                    socket,
                    addr,
                    permit,
                    Arc::clone(&routes),
                    Arc::clone(&options),
                ),
                Err(e) => {
                    drop(permit);
                    Self::handle_accept_error(e).await;
                }
            }
        }
    }

    /// Handle a new connection on its own task, holding a worker permit until it closes.
    fn spawn_connection(
        mut socket: TcpStream,
        addr: SocketAddr,
        permit: OwnedSemaphorePermit,
        routes: Arc<RouteTable>,
        options: Arc<ParseOptions>,
    ) {
        debug!("Accepted connection from {addr}");

        tokio::spawn(async move {
            // The permit is dropped when the task completes, releasing the worker
            let _permit = permit;

            if let Err(e) = handle_connection(&mut socket, &routes, &options).await {
                if e.is_transport() {
                    error!("Connection from {addr} failed: {e}");
                } else {
                    debug!("Connection from {addr} closed after: {e}");
                }
            }
        });
    }

    /// Handle connection errors.
    async fn handle_accept_error(e: std::io::Error) {
        error!("Error accepting connection: {e}");

        // Wait a bit before retrying
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
