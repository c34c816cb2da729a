//! Axum middleware running the request gate before a handler.
//!
//! Installed with `route_layer`, so only matched routes are gated and the
//! body is never read for rejected requests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::request::{client_ip, request_id};
use crate::observability::metrics;
use crate::security::{GateRequest, RequestGate, RouteKind};

/// Per-route gate state.
#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<RequestGate>,
    pub route: RouteKind,
    pub trust_forwarded_for: bool,
}

pub async fn gate_middleware(
    State(state): State<GateState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(peer, request.headers(), state.trust_forwarded_for);
    let admitted = {
        let gate_request = GateRequest {
            route: state.route,
            client,
            headers: request.headers(),
        };
        state.gate.admit(&gate_request).await
    };

    match admitted {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::debug!(
                request_id = %request_id(request.headers()),
                route = state.route.as_str(),
                client = %client,
                "Request stopped at gate"
            );
            let response = e.into_response();
            metrics::record_request(state.route.as_str(), response.status().as_u16());
            response
        }
    }
}
