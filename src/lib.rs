//! Leave record lookup and append service.

pub mod auth;
pub mod captcha;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod records;
pub mod security;
pub mod service;
pub mod validation;

pub use config::schema::ServiceConfig;
pub use error::{LeaveError, LeaveResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
