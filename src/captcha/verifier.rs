//! Captcha verification client.

use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::CaptchaConfig;
use crate::observability::metrics;

/// The verification service could not produce an answer.
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("verification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("verification service returned HTTP {0}")]
    Status(u16),
}

/// Reply body of a `siteverify` call.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteVerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
}

impl SiteVerifyResponse {
    /// Whether this reply counts as a pass.
    pub fn passes(&self, min_score: f64) -> bool {
        self.success && self.score.map_or(true, |score| score >= min_score)
    }
}

/// Verifies captcha tokens. Cheap to clone.
#[derive(Clone)]
pub struct CaptchaVerifier {
    client: reqwest::Client,
    secret: Option<String>,
    verify_url: String,
    min_score: f64,
}

impl CaptchaVerifier {
    /// Build a verifier from configuration. The HTTP client always carries
    /// the configured timeout.
    pub fn from_config(config: &CaptchaConfig) -> Result<Self, CaptchaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let secret = config.secret.clone().filter(|s| !s.trim().is_empty());
        if secret.is_none() {
            tracing::info!("Captcha verification disabled (no secret configured)");
        }

        Ok(Self {
            client,
            secret,
            verify_url: config.verify_url.clone(),
            min_score: config.min_score,
        })
    }

    /// A verifier that passes every request.
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            secret: None,
            verify_url: String::new(),
            min_score: 0.5,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Check `token` for the caller at `remote`.
    ///
    /// `Ok(false)` is a definite failure; `Err` means the service could not
    /// be consulted and the request must be denied.
    pub async fn verify(&self, token: Option<&str>, remote: IpAddr) -> Result<bool, CaptchaError> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(true);
        };
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            metrics::record_captcha("missing_token");
            return Ok(false);
        };

        let remote = remote.to_string();
        let params = [("secret", secret), ("response", token), ("remoteip", remote.as_str())];

        let result = self.call(&params).await;
        match &result {
            Ok(reply) => {
                let passed = reply.passes(self.min_score);
                metrics::record_captcha(if passed { "passed" } else { "failed" });
                if !passed {
                    tracing::info!(
                        score = ?reply.score,
                        error_codes = ?reply.error_codes,
                        "Captcha verification failed"
                    );
                }
            }
            Err(e) => {
                metrics::record_captcha("upstream_error");
                tracing::warn!(error = %e, "Captcha verification service unavailable");
            }
        }
        result.map(|reply| reply.passes(self.min_score))
    }

    async fn call(&self, params: &[(&str, &str)]) -> Result<SiteVerifyResponse, CaptchaError> {
        let response = self.client.post(&self.verify_url).form(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CaptchaError::Status(status.as_u16()));
        }
        Ok(response.json::<SiteVerifyResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn enabled(url: &str) -> CaptchaVerifier {
        CaptchaVerifier::from_config(&CaptchaConfig {
            secret: Some("secret".into()),
            verify_url: url.into(),
            timeout_secs: 1,
            min_score: 0.5,
        })
        .unwrap()
    }

    #[test]
    fn test_passes() {
        let reply = |success, score| SiteVerifyResponse { success, score, error_codes: vec![] };
        assert!(reply(true, None).passes(0.5));
        assert!(reply(true, Some(0.5)).passes(0.5));
        assert!(!reply(true, Some(0.49)).passes(0.5));
        assert!(!reply(true, Some(0.0)).passes(0.5));
        assert!(!reply(false, Some(0.9)).passes(0.5));
    }

    #[test]
    fn test_reply_parsing() {
        let reply: SiteVerifyResponse =
            serde_json::from_str(r#"{"success":false,"error-codes":["invalid-input-response"]}"#).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.error_codes, vec!["invalid-input-response"]);
    }

    #[tokio::test]
    async fn test_disabled_passes_without_network() {
        let verifier = CaptchaVerifier::disabled();
        assert!(!verifier.is_enabled());
        assert!(verifier.verify(None, IpAddr::V4(Ipv4Addr::LOCALHOST)).await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_secret_is_disabled() {
        let verifier = CaptchaVerifier::from_config(&CaptchaConfig {
            secret: Some("  ".into()),
            ..CaptchaConfig::default()
        })
        .unwrap();
        assert!(!verifier.is_enabled());
    }

    #[tokio::test]
    async fn test_missing_token_fails_when_enabled() {
        // The URL is never contacted.
        let verifier = enabled("http://127.0.0.1:9/siteverify");
        let remote = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(!verifier.verify(None, remote).await.unwrap());
        assert!(!verifier.verify(Some(""), remote).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_closed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let verifier = enabled(&format!("http://{addr}/siteverify"));
        let result = verifier.verify(Some("token"), IpAddr::V4(Ipv4Addr::LOCALHOST)).await;
        assert!(matches!(result, Err(CaptchaError::Transport(_))));
    }
}
