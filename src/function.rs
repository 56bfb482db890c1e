//! Local rendition of the deployed hello-world function.
//!
//! The handler answers `GET` on any path with `Hello World!` and every other
//! method with `405 Method not allowed`, logging the method, path, and remote
//! address of each request. It lets the checks run against a real HTTP
//! server without a cloud account.

use std::io;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::ConnectInfo;
use axum::http::{Method, StatusCode, Uri};
use axum::routing::any;
use tokio::net::TcpListener;
use tracing::info;

/// Body returned for `GET` requests.
pub const GREETING_BODY: &str = "Hello World!";

/// Body returned for every other method.
pub const METHOD_NOT_ALLOWED_BODY: &str = "Method not allowed";

/// Builds the router serving the hello-world handler on every path.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/", any(hello_world))
        .fallback(hello_world)
}

/// Serves the hello-world function on `listener` until the task is dropped.
///
/// # Errors
///
/// Returns an I/O error when accepting connections fails.
pub async fn serve(listener: TcpListener) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "serving hello-world function");
    }
    axum::serve(
        listener,
        router().into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

async fn hello_world(
    method: Method,
    uri: Uri,
    remote: Option<ConnectInfo<SocketAddr>>,
) -> (StatusCode, &'static str) {
    let remote_addr = remote.map_or_else(|| String::from("unknown"), |info| info.0.to_string());
    info!(%method, path = uri.path(), remote_addr, "request received");

    if method == Method::GET {
        (StatusCode::OK, GREETING_BODY)
    } else {
        (StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_BODY)
    }
}
