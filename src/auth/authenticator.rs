//! Authorization header checking.

use thiserror::Error;

use crate::auth::jwt::verify_token;

/// Why authentication failed. Never rendered to callers.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must use the Bearer scheme")]
    NotBearer,

    #[error("invalid or expired token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
}

/// Verifies bearer tokens against the configured signing secret.
#[derive(Clone)]
pub struct Authenticator {
    secret: String,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").field("secret", &"<redacted>").finish()
    }
}

impl Authenticator {
    /// Create an authenticator. An empty secret is refused.
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AuthError::MissingSecret);
        }
        Ok(Self { secret })
    }

    /// Authenticate the raw `Authorization` header value.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let header = authorization.ok_or(AuthError::MissingHeader)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NotBearer)?;

        let claims = verify_token(token, &self.secret)?;
        Ok(Identity { subject: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;

    #[test]
    fn test_empty_secret_refused() {
        assert!(matches!(Authenticator::new("  "), Err(AuthError::MissingSecret)));
    }

    #[test]
    fn test_valid_bearer() {
        let auth = Authenticator::new("s3cret").unwrap();
        let token = issue_token("ops", "s3cret", 300).unwrap();
        let identity = auth.authenticate(Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(identity.subject, "ops");
    }

    #[test]
    fn test_failures() {
        let auth = Authenticator::new("s3cret").unwrap();
        assert!(matches!(auth.authenticate(None), Err(AuthError::MissingHeader)));
        assert!(matches!(auth.authenticate(Some("Basic abc")), Err(AuthError::NotBearer)));
        assert!(matches!(auth.authenticate(Some("Bearer ")), Err(AuthError::NotBearer)));
        assert!(matches!(auth.authenticate(Some("Bearer not.a.jwt")), Err(AuthError::InvalidToken(_))));

        let foreign = issue_token("ops", "different", 300).unwrap();
        assert!(matches!(
            auth.authenticate(Some(&format!("Bearer {foreign}"))),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
