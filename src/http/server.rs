//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the leave handlers
//! - Install the request gate per route
//! - Wire up middleware (request id, tracing, panics, timeout, body limit)
//! - Apply security headers and CORS
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::middleware::{gate_middleware, GateState};
use crate::http::request::request_id;
use crate::http::response;
use crate::security::headers::{cors_layer, with_security_headers};
use crate::security::{RequestGate, RouteKind};
use crate::service::LeaveService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LeaveService>,
    pub gate: Arc<RequestGate>,
    pub config: Arc<ServiceConfig>,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let gate = state.gate.clone();
    let gate_for = |route| GateState {
        gate: gate.clone(),
        route,
        trust_forwarded_for: config.listener.trust_forwarded_for,
    };

    let router = Router::new()
        .route(
            "/api/leave",
            post(handlers::query_leave).route_layer(from_fn_with_state(gate_for(RouteKind::Query), gate_middleware)),
        )
        .route(
            "/api/add-leave",
            post(handlers::add_leave).route_layer(from_fn_with_state(gate_for(RouteKind::Append), gate_middleware)),
        )
        .route("/api/leaves", get(handlers::list_leaves))
        .route("/health", get(handlers::health))
        .fallback(response::not_found)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(CatchPanicLayer::custom(response::handle_panic));

    let router = match cors_layer(&config.access.allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };
    let router = if config.security.enable_headers {
        with_security_headers(router)
    } else {
        router
    };

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id(request.headers()),
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// HTTP server for the leave service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            stages = ?self.state.gate.stage_names(),
            "HTTP server starting"
        );

        let sweep_every = Duration::from_secs(self.state.config.rate_limit.sweep_interval_secs);
        let sweeper = self.state.gate.clone().spawn_sweeper(sweep_every, shutdown.resubscribe());

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "Counter sweeper ended abnormally");
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
