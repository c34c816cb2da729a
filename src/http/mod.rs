//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers: request id, trace, limits)
//!     → middleware/gate.rs (request gate, before the body is read)
//!     → handlers.rs (build RequestContext, call LeaveService)
//!     → response.rs (envelope, status mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{client_ip, request_id, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer};
