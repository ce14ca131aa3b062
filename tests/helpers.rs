// Mock HTTP server shared by the integration tests.
//
// The server runs on its own tokio runtime so tests can drive the blocking
// request API from the test thread.

use std::io::Write;

use axum::{
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

/// A running mock server. Dropping it stops the server.
pub struct TestServer {
    pub base: String,
    _runtime: Runtime,
}

impl TestServer {
    #[allow(dead_code)] // Used by other test files
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> String {
    let value_of = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };
    format!(
        "method={} uri={} content-type={} cookie={} body={}",
        method,
        uri,
        value_of(header::CONTENT_TYPE),
        value_of(header::COOKIE),
        body
    )
}

fn gzipped(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route(
            "/redirect/{hop}",
            get(|Path(hop): Path<usize>| async move {
                if hop > 0 {
                    found(&format!("/redirect/{}", hop - 1))
                } else {
                    "Final Destination".into_response()
                }
            }),
        )
        .route("/loop", get(|| async { found("/loop") }))
        .route(
            "/no-location",
            get(|| async { StatusCode::MOVED_PERMANENTLY }),
        )
        .route(
            "/temporary",
            any(|| async {
                (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, "/echo")]).into_response()
            }),
        )
        .route(
            "/see-other",
            any(|| async { (StatusCode::SEE_OTHER, [(header::LOCATION, "/echo")]).into_response() }),
        )
        .route(
            "/permanent",
            get(|| async {
                (StatusCode::PERMANENT_REDIRECT, [(header::LOCATION, "/echo")]).into_response()
            }),
        )
        .route(
            "/cookie/set",
            get(|| async {
                (
                    StatusCode::FOUND,
                    [
                        (header::LOCATION, "/echo"),
                        (header::SET_COOKIE, "sid=abc123; Path=/; HttpOnly"),
                    ],
                )
                    .into_response()
            }),
        )
        .route(
            "/gzip",
            get(|| async {
                (
                    [
                        (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                        (header::CONTENT_ENCODING, "gzip"),
                    ],
                    gzipped("compressed hello"),
                )
                    .into_response()
            }),
        )
        .route(
            "/binary",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "image/png")],
                    vec![0x89u8, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a],
                )
                    .into_response()
            }),
        )
        .route(
            "/latin1",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/plain; charset=ISO-8859-1")],
                    vec![b'c', b'a', b'f', 0xe9],
                )
                    .into_response()
            }),
        )
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "nothing here") }),
        )
}

/// Starts the mock server on an ephemeral port.
pub fn start_server() -> TestServer {
    let runtime = Runtime::new().expect("Failed to build runtime");
    let listener = runtime
        .block_on(TcpListener::bind("127.0.0.1:0"))
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");
    runtime.spawn(async move {
        axum::serve(listener, app())
            .await
            .expect("Server failed to start");
    });
    TestServer {
        base: format!("http://{}", addr),
        _runtime: runtime,
    }
}
