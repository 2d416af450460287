//! HTTP Surface
//!
//! Two routes on a plain hyper/http1 server:
//!
//! - `GET /` renders the landing page with the trigger form.
//! - `POST /crash` invokes the fault trigger and never succeeds; the
//!   router's error boundary converts the fault into a 500 and reports an
//!   exception event to the telemetry sink.
//!
//! Request handling is stateless; the only shared state is the immutable
//! [`ServerContext`] constructed once at startup.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::fault;
use crate::telemetry::TelemetrySink;

mod page;
pub use page::PAGE_HTML;

// =============================================================================
// Server Context
// =============================================================================

/// Immutable state shared by all request handlers.
pub struct ServerContext {
    sink: Arc<dyn TelemetrySink>,
}

impl ServerContext {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }
}

// =============================================================================
// Server
// =============================================================================

/// HTTP server bound to its listen address.
pub struct HttpServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl HttpServer {
    /// Parse the configured address and bind the listener.
    pub async fn bind(addr: &str) -> Result<Self> {
        let requested: SocketAddr =
            addr.parse()
                .map_err(|e: std::net::AddrParseError| Error::InvalidBindAddress {
                    addr: addr.to_string(),
                    reason: e.to_string(),
                })?;

        let listener = TcpListener::bind(requested).await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    /// Actual bound address; differs from the requested one when port 0 was
    /// asked for.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept loop. Runs until the listener itself fails; a crashed request
    /// only ends that request.
    pub async fn serve(self, ctx: Arc<ServerContext>) -> Result<()> {
        info!("HTTP server listening on {}", self.addr);

        loop {
            let (stream, _) = self.listener.accept().await?;
            let io = TokioIo::new(stream);
            let ctx = Arc::clone(&ctx);

            tokio::spawn(async move {
                let service = service_fn(move |req| route(req, Arc::clone(&ctx)));
                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    error!("HTTP connection error: {e}");
                }
            });
        }
    }
}

// =============================================================================
// Routing
// =============================================================================

/// Dispatch a request and apply the top-level fault boundary.
///
/// Any handler returning an error ends here and nowhere else: the fault is
/// logged, reported as an exception event, and mapped to a generic 500.
pub async fn route<B>(
    req: Request<B>,
    ctx: Arc<ServerContext>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let outcome = match (&method, path.as_str()) {
        (&Method::GET, "/") => Ok(page_response()),
        (&Method::POST, "/crash") => crash_handler(&ctx),
        (_, "/") | (_, "/crash") => Ok(plain_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "method not allowed",
        )),
        _ => Ok(plain_response(StatusCode::NOT_FOUND, "not found")),
    };

    let response = match outcome {
        Ok(response) => response,
        Err(fault) => {
            error!("Unhandled fault in {method} {path}: {fault}");
            ctx.sink.track_exception(fault::FAULT_KIND, &fault.to_string());
            plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    };

    debug!("{method} {path} -> {}", response.status());
    ctx.sink
        .track_request(method.as_str(), &path, response.status().as_u16());
    Ok(response)
}

/// The fault-triggering action. Ignores all input and never succeeds.
fn crash_handler(ctx: &ServerContext) -> Result<Response<Full<Bytes>>> {
    Err(fault::intentional_crash(ctx.sink.as_ref()))
}

fn page_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from_static(PAGE_HTML.as_bytes())))
        .unwrap()
}

fn plain_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{RecordedEvent, RecordingSink, Severity};
    use http_body_util::BodyExt;

    fn test_ctx() -> (Arc<ServerContext>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let ctx = Arc::new(ServerContext::new(
            Arc::clone(&sink) as Arc<dyn TelemetrySink>
        ));
        (ctx, sink)
    }

    fn request(method: Method, path: &str) -> Request<()> {
        Request::builder().method(method).uri(path).body(()).unwrap()
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn get_root_returns_the_page() {
        let (ctx, _) = test_ctx();
        let response = route(request(Method::GET, "/"), ctx).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert_eq!(body.matches("<form").count(), 1);
        assert!(body.contains(r#"action="/crash""#));
    }

    #[tokio::test]
    async fn post_crash_returns_500_with_a_fixed_body() {
        let (ctx, _) = test_ctx();

        let first = route(request(Method::POST, "/crash"), Arc::clone(&ctx))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let first_body = body_string(first).await;

        let second = route(request(Method::POST, "/crash"), ctx).await.unwrap();
        let second_body = body_string(second).await;
        assert_eq!(first_body, second_body);
    }

    #[tokio::test]
    async fn crash_reports_one_critical_trace_and_one_exception() {
        let (ctx, sink) = test_ctx();
        let _ = route(request(Method::POST, "/crash"), ctx).await.unwrap();

        let events = sink.events();
        let critical_traces = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    RecordedEvent::Trace {
                        severity: Severity::Critical,
                        ..
                    }
                )
            })
            .count();
        let exceptions = events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Exception { .. }))
            .count();

        assert_eq!(critical_traces, 1);
        assert_eq!(exceptions, 1);
        assert!(events.contains(&RecordedEvent::Request {
            method: "POST".to_string(),
            path: "/crash".to_string(),
            status: 500,
        }));
    }

    #[tokio::test]
    async fn unknown_paths_return_404() {
        let (ctx, _) = test_ctx();
        let response = route(request(Method::GET, "/nope"), ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_methods_return_405() {
        let (ctx, sink) = test_ctx();

        let response = route(request(Method::POST, "/"), Arc::clone(&ctx))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = route(request(Method::GET, "/crash"), ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        // a GET must never trigger the fault
        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, RecordedEvent::Exception { .. })));
    }
}
