//! Synchronous gateway binding.
//!
//! # Responsibilities
//! - Serve HTTP on the configured port
//! - Hand each request to `process_message` inline (no extra tasks)
//! - Report status line and headers through the `respond` callback, then one body element
//!
//! # Design Decisions
//! - The listener is created when `run` starts and dropped when it returns
//! - Every request must produce a response; the no-reply sentinel is an error here
//! - Concurrency is whatever the HTTP server gives us (one task per connection)

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower_http::trace::TraceLayer;

use super::{Application, Connection, ConnectionError, DispatchError, Reply, SharedApplication};
use crate::http::{HttpResponse, Request};

/// Largest request body the gateway buffers.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// The request as the gateway hands it over.
pub type Environ = axum::http::Request<Bytes>;

/// Callback receiving `"<code> <message>"` and the ordered header list.
pub type StartResponse = Box<dyn FnOnce(String, Vec<(String, String)>) + Send>;

/// Gateway failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The handler returned the no-reply sentinel, which this protocol cannot express.
    #[error("handler produced no response")]
    MissingResult,
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::Dispatch(DispatchError::Parse(_)) => StatusCode::BAD_REQUEST,
            GatewayError::Dispatch(DispatchError::NoRoute(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Connection served by a local HTTP listener.
#[derive(Debug, Clone)]
pub struct GatewayConnection {
    port: u16,
}

impl GatewayConnection {
    pub const DEFAULT_PORT: u16 = 6767;

    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Handle one request: parse, route, invoke, report status and headers, return the body.
    pub async fn handle(
        &self,
        application: &dyn Application,
        environ: Environ,
        respond: StartResponse,
    ) -> Result<Vec<Bytes>, GatewayError> {
        let request = Request::from_gateway(environ).map_err(DispatchError::from)?;
        let handler = application
            .route_message(&request)
            .ok_or_else(|| DispatchError::NoRoute(request.path.clone()))?;

        let reply = handler
            .call(request)
            .await
            .map_err(DispatchError::from)?
            .ok_or(GatewayError::MissingResult)?;

        let response = match reply {
            Reply::Http(response) => response,
            Reply::Raw(body) => HttpResponse::ok(body),
        };
        let status = response.status_line();
        let HttpResponse { headers, body, .. } = response;

        respond(status, headers);
        Ok(vec![body])
    }

    /// Serve on an already-bound listener until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        application: SharedApplication,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ConnectionError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway serving");

        let state = GatewayState {
            connection: Arc::new(self),
            application,
        };
        let app = Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, stopping gateway");
            })
            .await?;

        tracing::info!(address = %addr, "Gateway stopped");
        Ok(())
    }
}

impl Default for GatewayConnection {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PORT)
    }
}

impl Connection for GatewayConnection {
    type Message = (Environ, StartResponse);
    type Output = Result<Vec<Bytes>, GatewayError>;

    fn process_message<'a>(
        &'a self,
        application: &'a dyn Application,
        (environ, respond): Self::Message,
    ) -> BoxFuture<'a, Self::Output> {
        Box::pin(self.handle(application, environ, respond))
    }

    fn run(
        self,
        application: SharedApplication,
        shutdown: broadcast::Receiver<()>,
    ) -> BoxFuture<'static, Result<(), ConnectionError>> {
        Box::pin(async move {
            let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
            let listener = TcpListener::bind(addr).await?;
            self.serve(listener, application, shutdown).await
        })
    }
}

#[derive(Clone)]
struct GatewayState {
    connection: Arc<GatewayConnection>,
    application: SharedApplication,
}

async fn gateway_handler(
    State(state): State<GatewayState>,
    request: axum::extract::Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "Unreadable request body").into_response();
        }
    };
    let environ = axum::http::Request::from_parts(parts, body);

    let (tx, rx) = oneshot::channel();
    let respond: StartResponse = Box::new(move |status, headers| {
        let _ = tx.send((status, headers));
    });

    let chunks = match state
        .connection
        .process_message(state.application.as_ref(), (environ, respond))
        .await
    {
        Ok(chunks) => chunks,
        Err(e) => {
            tracing::warn!(error = %e, "Gateway request failed");
            let status = e.status();
            return (status, status.canonical_reason().unwrap_or("Error")).into_response();
        }
    };

    let Ok((status_line, headers)) = rx.await else {
        tracing::error!("Handler returned a body without a status");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    build_response(&status_line, headers, chunks)
}

fn build_response(status_line: &str, headers: Vec<(String, String)>, chunks: Vec<Bytes>) -> Response {
    let status = status_line
        .split_whitespace()
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Vec<u8> = chunks.iter().flat_map(|chunk| chunk.iter().copied()).collect();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().append(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid response header"),
        }
    }
    response
}
