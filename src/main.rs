//! Demo server: static pages from a public directory plus a form echo endpoint.

use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use minihttpd::server::{DEFAULT_PORT, DEFAULT_WORKER_POOL_SIZE};
use minihttpd::{
    HttpRequest, HttpResponse, HttpServer, Method, ServerConfig, ServerError, StaticFiles,
    StatusCode,
};

/// Pages served from the public directory.
const PAGES: &[&str] = &[
    "/index.html",
    "/spring.svg",
    "/spring.png",
    "/resources.html",
    "/styles.css",
    "/app.js",
    "/links.html",
    "/forms.html",
    "/classic.html",
    "/events.html",
    "/events.js",
];

/// Pages whose `{time}` placeholder is filled in on every request.
const TEMPLATED_PAGES: &[&str] = &["/classic.html"];

#[derive(Debug, Parser)]
#[command(name = "minihttpd", version, about = "A minimal HTTP/1.1 server")]
struct Cli {
    /// Address to bind to
    #[arg(long, env = "MINIHTTPD_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "MINIHTTPD_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of connections served at once
    #[arg(short, long, env = "MINIHTTPD_WORKERS", default_value_t = DEFAULT_WORKER_POOL_SIZE)]
    workers: usize,

    /// Directory the pages are served from
    #[arg(long, env = "MINIHTTPD_PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,

    /// Size of the buffer the request line and headers must fit in
    #[arg(long, env = "MINIHTTPD_MAX_FRAME", default_value_t = minihttpd::parser::DEFAULT_MAX_FRAME_SIZE)]
    max_frame: usize,
}

/// Answer with the parsed request as JSON.
fn echo(request: &HttpRequest, out: &mut dyn Write) -> Result<(), ServerError> {
    HttpResponse::new(StatusCode::Ok)
        .with_json(request)?
        .write_to(out)?;
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = ServerConfig {
        addr: SocketAddr::new(cli.host, cli.port),
        worker_pool_size: cli.workers,
        read_buffer_size: cli.max_frame,
        ..ServerConfig::default()
    };

    let mut files = StaticFiles::new(&cli.public_dir);
    for page in TEMPLATED_PAGES {
        files = files.with_template(*page);
    }
    info!("Serving files from {}", files.base_dir().display());

    let mut server = HttpServer::new(config);
    for page in PAGES {
        server.add_handler(Method::GET, *page, files.clone());
    }
    server
        .add_handler(Method::POST, "/messages", echo)
        .add_handler(Method::GET, "/echo", echo);

    if let Err(e) = server.listen().await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
