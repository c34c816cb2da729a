//! Per-request context.

use std::net::IpAddr;

use axum::http::{header, HeaderMap};
use serde_json::Value;

use crate::http::request::request_id;

/// Everything the service needs to know about one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub client_addr: IpAddr,
    pub origin: Option<String>,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    pub request_id: String,
    pub payload: Value,
}

impl RequestContext {
    pub fn from_parts(client_addr: IpAddr, headers: &HeaderMap, payload: Value) -> Self {
        let text = |name| headers.get(name).and_then(|v| v.to_str().ok()).map(String::from);
        Self {
            client_addr,
            origin: text(header::ORIGIN),
            authorization: text(header::AUTHORIZATION),
            request_id: request_id(headers),
            payload,
        }
    }
}
