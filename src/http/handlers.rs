//! Route handlers.
//!
//! Handlers only translate between HTTP and [`LeaveService`]; all checks
//! live in the gate and the service.
//!
//! [`LeaveService`]: crate::service::LeaveService

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::error::LeaveResult;
use crate::http::request::client_ip;
use crate::http::response::{AppendResponse, HealthResponse, ListResponse, RecordResponse};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::service::RequestContext;
use crate::validation::parse_body;

/// `POST /api/leave`
pub async fn query_leave(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = context(&state, peer, &headers, &body);
    let result = state.service.query_leave(&ctx).await.map(RecordResponse::new);
    respond("query", result)
}

/// `POST /api/add-leave`
pub async fn add_leave(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = context(&state, peer, &headers, &body);
    let result = state.service.append_leave(&ctx).map(AppendResponse::new);
    respond("append", result)
}

/// `GET /api/leaves`
pub async fn list_leaves(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ctx = context(&state, peer, &headers, &[]);
    let result = state.service.list_leaves(&ctx).map(ListResponse::new);
    respond("list", result)
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
        records: state.service.store().len(),
    })
}

/// Build the service context.
///
/// An unparseable body becomes `null` so the service still authenticates
/// before it validates; validation then rejects it.
fn context(state: &AppState, peer: SocketAddr, headers: &HeaderMap, body: &[u8]) -> RequestContext {
    let client = client_ip(peer, headers, state.config.listener.trust_forwarded_for);
    let payload = if body.is_empty() {
        Value::Null
    } else {
        parse_body(body).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unparseable request body");
            Value::Null
        })
    };
    RequestContext::from_parts(client, headers, payload)
}

fn respond<T: Serialize>(route: &'static str, result: LeaveResult<T>) -> Response {
    let response = match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_request(route, response.status().as_u16());
    response
}
