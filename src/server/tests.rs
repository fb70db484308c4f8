//! Tests for the HTTP server implementation.

#[cfg(test)]
mod server_tests {
    use std::io::{self, Cursor, Write};
    use std::net::SocketAddr;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
    use tokio::net::{TcpListener, TcpStream};

    use crate::parser::{Error as ParserError, HttpRequest, Method, ParseOptions};
    use crate::server::{
        handle_connection, Error, Handler, HttpResponse, HttpServer, RouteTable, ServerConfig,
        StatusCode,
    };

    // Mock TcpStream for testing
    struct MockTcpStream {
        read_data: Cursor<Vec<u8>>,
        write_data: Vec<u8>,
        fail_reads: bool,
        shut_down: bool,
    }

    impl MockTcpStream {
        fn new(read_data: Vec<u8>) -> Self {
            Self {
                read_data: Cursor::new(read_data),
                write_data: Vec::new(),
                fail_reads: false,
                shut_down: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_reads: true,
                ..Self::new(Vec::new())
            }
        }

        fn written(&self) -> String {
            String::from_utf8_lossy(&self.write_data).into_owned()
        }
    }

    impl AsyncRead for MockTcpStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            if this.fail_reads {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )));
            }
            let n = std::io::Read::read(&mut this.read_data, buf.initialize_unfilled())?;
            buf.advance(n);
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockTcpStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            self.get_mut().shut_down = true;
            Poll::Ready(Ok(()))
        }
    }

    fn text(body: &'static str) -> impl Handler {
        move |_req: &HttpRequest, out: &mut dyn Write| -> Result<(), Error> {
            HttpResponse::new(StatusCode::Ok)
                .with_content_type("text/plain")
                .with_body_string(body)
                .write_to(out)?;
            Ok(())
        }
    }

    fn routes() -> RouteTable {
        let mut routes = RouteTable::new();
        routes
            .add_handler(Method::GET, "/test", text("Test response"))
            .add_handler(Method::GET, "/other", text("Other response"));
        routes
    }

    async fn run(raw: &[u8], routes: &RouteTable) -> (Result<(), Error>, MockTcpStream) {
        let mut stream = MockTcpStream::new(raw.to_vec());
        let result = handle_connection(&mut stream, routes, &ParseOptions::default()).await;
        (result, stream)
    }

    fn assert_empty_response(response: &str, status_line: &str) {
        assert!(response.starts_with(status_line), "unexpected response: {response}");
        assert!(response.contains("Content-Length: 0\r\n"));
        assert!(response.contains("Connection: close\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_server_creation() {
        let config = ServerConfig {
            addr: "127.0.0.1:8080".parse().unwrap(),
            worker_pool_size: 8,
            read_buffer_size: 2048,
            ..ServerConfig::default()
        };

        let server = HttpServer::new(config.clone());
        assert_eq!(server.config.addr, config.addr);
        assert_eq!(server.config.worker_pool_size, 8);
        assert_eq!(server.config.parse_options().max_frame_size, 2048);
        assert!(server.routes().is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.port(), 9999);
        assert_eq!(config.worker_pool_size, 64);
        assert_eq!(config.read_buffer_size, 4096);
        assert_eq!(config.allowed_methods, vec![Method::GET, Method::POST]);

        let config = ServerConfig::new(8081, 4);
        assert_eq!(config.addr.port(), 8081);
        assert_eq!(config.worker_pool_size, 4);
    }

    #[test]
    fn test_add_handler() {
        let mut server = HttpServer::new(ServerConfig::default());
        server
            .add_handler(Method::GET, "/test", text("Test response"))
            .add_handler(Method::POST, "/test", text("Posted"));

        assert_eq!(server.routes().len(), 2);
        assert_eq!(
            server.routes().routes(),
            vec![(Method::GET, "/test"), (Method::POST, "/test")]
        );
    }

    #[test]
    fn test_route_lookup_is_exact() {
        let routes = routes();
        assert!(routes.lookup(Method::GET, "/test").is_ok());
        assert!(matches!(
            routes.lookup(Method::GET, "/test/"),
            Err(Error::NoRouteForPath(Method::GET, ref p)) if p == "/test/"
        ));
        assert!(matches!(
            routes.lookup(Method::GET, "/TEST"),
            Err(Error::NoRouteForPath(..))
        ));
        assert!(matches!(
            routes.lookup(Method::POST, "/test"),
            Err(Error::NoRouteForMethod(Method::POST))
        ));
    }

    #[tokio::test]
    async fn test_handle_connection_with_valid_request() {
        let (result, stream) = run(b"GET /test HTTP/1.1\r\nHost: localhost\r\n\r\n", &routes()).await;

        assert!(result.is_ok());
        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/plain\r\n"));
        assert!(response.contains("Content-Length: 13\r\n"));
        assert!(response.ends_with("Test response"));
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_query_does_not_affect_routing() {
        let (result, stream) = run(b"GET /other?x=1 HTTP/1.1\r\n\r\n", &routes()).await;
        assert!(result.is_ok());
        assert!(stream.written().ends_with("Other response"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_unknown_path() {
        let (result, stream) = run(b"GET /nonexistent HTTP/1.1\r\nHost: localhost\r\n\r\n", &routes()).await;

        assert!(matches!(result, Err(Error::NoRouteForPath(Method::GET, ref p)) if p == "/nonexistent"));
        assert_empty_response(&stream.written(), "HTTP/1.1 404 Not Found\r\n");
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_handle_connection_with_unknown_method() {
        let (result, stream) = run(b"POST /test HTTP/1.1\r\nContent-Length: 0\r\n\r\n", &routes()).await;

        assert!(matches!(result, Err(Error::NoRouteForMethod(Method::POST))));
        assert_empty_response(&stream.written(), "HTTP/1.1 404 Not Found\r\n");
    }

    #[tokio::test]
    async fn test_handle_connection_with_malformed_request_line() {
        for raw in [&b"GET /\r\n\r\n"[..], b"GET / HTTP/1.1 extra\r\n\r\n", b"INVALID REQUEST"] {
            let (result, stream) = run(raw, &routes()).await;

            assert!(matches!(
                result,
                Err(Error::ParseError(ParserError::MalformedRequestLine(_)))
            ));
            assert_empty_response(&stream.written(), "HTTP/1.1 400 Bad Request\r\n");
            assert!(stream.shut_down);
        }
    }

    #[tokio::test]
    async fn test_handle_connection_with_unsupported_method() {
        let (result, stream) = run(b"DELETE /test HTTP/1.1\r\n\r\n", &routes()).await;

        assert!(matches!(
            result,
            Err(Error::ParseError(ParserError::UnsupportedMethod(_)))
        ));
        assert_empty_response(&stream.written(), "HTTP/1.1 400 Bad Request\r\n");
    }

    #[tokio::test]
    async fn test_handle_connection_with_truncated_body() {
        let (result, stream) = run(b"POST /test HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc", &routes()).await;

        assert!(matches!(
            result,
            Err(Error::ParseError(ParserError::TruncatedBody { expected: 10, received: 3 }))
        ));
        assert_empty_response(&stream.written(), "HTTP/1.1 400 Bad Request\r\n");
    }

    #[tokio::test]
    async fn test_handler_sees_parsed_parameters() {
        let mut routes = RouteTable::new();
        routes.add_handler(
            Method::POST,
            "/messages",
            |req: &HttpRequest, out: &mut dyn Write| -> Result<(), Error> {
                let body = format!(
                    "{}|{}|{}",
                    req.query_param_values("tag").join(","),
                    req.body_param("name").unwrap_or("-"),
                    req.get_header("host").map(String::as_str).unwrap_or("-"),
                );
                HttpResponse::new(StatusCode::Created)
                    .with_body_string(body)
                    .write_to(out)?;
                Ok(())
            },
        );

        let raw = b"POST /messages?tag=a&tag=b HTTP/1.1\r\nHost: test\r\nContent-Length: 13\r\n\r\nname=Al+Smith";
        let (result, stream) = run(raw, &routes).await;

        assert!(result.is_ok());
        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(response.ends_with("a,b|Al Smith|test"));
    }

    #[tokio::test]
    async fn test_handler_error_becomes_500() {
        let mut routes = RouteTable::new();
        routes.add_handler(
            Method::GET,
            "/fail",
            |_req: &HttpRequest, out: &mut dyn Write| -> Result<(), Error> {
                out.write_all(b"HTTP/1.1 200 OK\r\n")?;
                Err(Error::InternalError("disk on fire".to_string()))
            },
        );

        let (result, stream) = run(b"GET /fail HTTP/1.1\r\n\r\n", &routes).await;

        assert!(matches!(result, Err(Error::HandlerFailed(ref m)) if m.contains("disk on fire")));
        // The partial output is discarded.
        assert_empty_response(&stream.written(), "HTTP/1.1 500 Internal Server Error\r\n");
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_500() {
        let mut routes = RouteTable::new();
        routes.add_handler(
            Method::GET,
            "/panic",
            |_req: &HttpRequest, _out: &mut dyn Write| -> Result<(), Error> { panic!("boom") },
        );

        let (result, stream) = run(b"GET /panic HTTP/1.1\r\n\r\n", &routes).await;

        assert!(matches!(result, Err(Error::HandlerPanicked(ref m)) if m == "boom"));
        assert_empty_response(&stream.written(), "HTTP/1.1 500 Internal Server Error\r\n");
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_peer_closed_without_request() {
        let (result, stream) = run(b"", &routes()).await;

        assert!(result.is_ok());
        assert!(stream.write_data.is_empty());
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_transport_error_gets_no_response() {
        let mut stream = MockTcpStream::failing();
        let result = handle_connection(&mut stream, &routes(), &ParseOptions::default()).await;

        let err = result.unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(err, Error::IoError(_)));
        assert!(stream.write_data.is_empty());
        assert!(stream.shut_down);
    }

    #[test]
    fn test_response_serialization() {
        let response = HttpResponse::new(StatusCode::NotFound);
        let bytes = String::from_utf8(response.to_bytes()).unwrap();
        assert_empty_response(&bytes, "HTTP/1.1 404 Not Found\r\n");
        assert!(bytes.contains("Server: minihttpd\r\n"));

        let response = HttpResponse::new(StatusCode::Ok).with_body_string("hello");
        let bytes = String::from_utf8(response.to_bytes()).unwrap();
        assert!(bytes.contains("Content-Length: 5\r\n"));
        assert!(bytes.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_response_with_json() {
        #[derive(serde::Serialize)]
        struct Reply {
            ok: bool,
        }

        let response = HttpResponse::new(StatusCode::Ok)
            .with_json(&Reply { ok: true })
            .unwrap();
        assert_eq!(response.body, br#"{"ok":true}"#);
        assert_eq!(response.headers.get("Content-Type").unwrap(), "application/json");
        assert_eq!(response.headers.get("Content-Length").unwrap(), "11");
    }

    // ---- real sockets ----

    async fn start_server(server: HttpServer) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.serve(listener));
        addr
    }

    async fn send(addr: SocketAddr, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_serve_over_tcp() {
        let mut server = HttpServer::new(ServerConfig::default());
        server.add_handler(Method::GET, "/test", text("Test response"));
        let addr = start_server(server).await;

        let response = send(addr, b"GET /test HTTP/1.1\r\nHost: test\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("Test response"));

        let response = send(addr, b"GET /missing HTTP/1.1\r\nHost: test\r\n\r\n").await;
        assert_empty_response(&response, "HTTP/1.1 404 Not Found\r\n");

        let response = send(addr, b"GET / HTTP/1.1 extra\r\n\r\n").await;
        assert_empty_response(&response, "HTTP/1.1 400 Bad Request\r\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_truncated_body_does_not_hang() {
        let mut server = HttpServer::new(ServerConfig::default());
        server.add_handler(Method::POST, "/messages", text("stored"));
        let addr = start_server(server).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"POST /messages HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc")
            .await
            .unwrap();
        // Close our write half; the server sees EOF three bytes into the body.
        stream.shutdown().await.unwrap();

        let mut buf = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
            .await
            .expect("server hung on a truncated body")
            .unwrap();
        assert_empty_response(&String::from_utf8_lossy(&buf), "HTTP/1.1 400 Bad Request\r\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_hundred_clients_on_sixty_four_workers() {
        let served = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&served);

        let mut server = HttpServer::new(ServerConfig::new(0, 64));
        server.add_handler(
            Method::GET,
            "/slow",
            move |_req: &HttpRequest, out: &mut dyn Write| -> Result<(), Error> {
                std::thread::sleep(Duration::from_millis(20));
                counter.fetch_add(1, Ordering::SeqCst);
                HttpResponse::new(StatusCode::Ok)
                    .with_body_string("done")
                    .write_to(out)?;
                Ok(())
            },
        );
        let addr = start_server(server).await;

        let clients: Vec<_> = (0..100)
            .map(|_| tokio::spawn(send(addr, b"GET /slow HTTP/1.1\r\nHost: test\r\n\r\n")))
            .collect();

        for client in clients {
            let response = tokio::time::timeout(Duration::from_secs(30), client)
                .await
                .expect("client timed out")
                .unwrap();
            assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
            assert!(response.ends_with("done"));
        }
        assert_eq!(served.load(Ordering::SeqCst), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_worker_pool_caps_in_flight_connections() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (current, highest) = (Arc::clone(&in_flight), Arc::clone(&peak));

        let mut server = HttpServer::new(ServerConfig::new(0, 4));
        server.add_handler(
            Method::GET,
            "/work",
            move |_req: &HttpRequest, out: &mut dyn Write| -> Result<(), Error> {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                highest.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(30));
                current.fetch_sub(1, Ordering::SeqCst);
                HttpResponse::new(StatusCode::Ok).write_to(out)?;
                Ok(())
            },
        );
        let addr = start_server(server).await;

        let clients: Vec<_> = (0..20)
            .map(|_| tokio::spawn(send(addr, b"GET /work HTTP/1.1\r\n\r\n")))
            .collect();
        for client in clients {
            let response = client.await.unwrap();
            assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        }

        let peak = peak.load(Ordering::SeqCst);
        assert!((1..=4).contains(&peak), "peak in-flight was {peak}");
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_workers_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = HttpServer::new(ServerConfig::new(0, 0));
        let result = server.serve(listener).await;
        assert!(matches!(result, Err(Error::InternalError(_))));
    }
}
