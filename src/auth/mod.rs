//! Bearer-token authentication for the append and list operations.
//!
//! # Data Flow
//! ```text
//! Authorization: Bearer <jwt>
//!     → authenticator.rs (header parsing, scheme check)
//!     → jwt.rs (HS256 signature + expiry)
//!     → Identity
//! ```
//!
//! # Design Decisions
//! - Every failure collapses to one access-denied outcome at the boundary
//! - A missing signing secret is a startup error, never a runtime one
//! - The lookup operation never requires authentication

pub mod authenticator;
pub mod jwt;

pub use authenticator::{AuthError, Authenticator, Identity};
pub use jwt::{issue_token, Claims};
