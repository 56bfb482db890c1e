//! Local HTTP servers standing in for the deployed endpoints.
//!
//! Include via:
//!
//! ```rust
//! #[path = "common/stub_servers.rs"]
//! mod stub_servers;
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server bound to an ephemeral localhost port. Aborted on drop.
pub struct StubServer {
    /// Base URL, with a trailing slash.
    pub url: String,
    handle: JoinHandle<()>,
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serves `router` on `127.0.0.1` with an ephemeral port.
pub async fn spawn(router: Router) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .ok();
    });
    StubServer {
        url: format!("http://{addr}/"),
        handle,
    }
}

/// Returns a URL on a port with nothing listening.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    format!("http://{addr}/")
}

/// The hello-world function behind an edge policy that only admits `GET`.
pub fn guarded_load_balancer() -> Router {
    infraprobe::function::router().layer(middleware::from_fn(reject_non_get))
}

/// The hello-world function exposed without the edge policy.
pub fn open_load_balancer() -> Router {
    infraprobe::function::router()
}

/// A function endpoint that rejects unauthenticated callers.
pub fn unauthenticated_function() -> Router {
    Router::new().fallback(|| async { (StatusCode::FORBIDDEN, "Forbidden") })
}

/// An endpoint that answers only after `delay`.
pub fn slow_endpoint(delay: Duration) -> Router {
    Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "too late"
    })
}

async fn reject_non_get(request: Request, next: Next) -> Response {
    if request.method() == Method::GET {
        next.run(request).await
    } else {
        (StatusCode::FORBIDDEN, "Forbidden").into_response()
    }
}
