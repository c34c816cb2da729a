mod common;

use std::sync::atomic::Ordering;

use axum::http::{header, StatusCode};
use serde_json::json;

use common::{bearer, post_json, router, send, start_programmable_backend, test_config, unreachable_addr};
use leave_service::config::ServiceConfig;

const CAPTCHA_SECRET: &str = "captcha-test-secret";

fn captcha_config(addr: std::net::SocketAddr) -> ServiceConfig {
    let mut config = test_config();
    config.captcha.secret = Some(CAPTCHA_SECRET.into());
    config.captcha.verify_url = format!("http://{}/siteverify", addr);
    config.captcha.timeout_secs = 2;
    config
}

async fn seeded(app: &axum::Router) {
    let mut request = post_json(
        "/api/add-leave",
        &json!({
            "claimCode": "GSL25021372778",
            "nationalId": "1088576044",
            "holderName": "Test Holder",
            "reportDate": "2025-02-09",
            "startDate": "2025-02-09",
            "endDate": "2025-02-14",
            "issuingPhysician": "Dr. Example",
            "jobTitle": "Consultant"
        }),
    );
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, bearer().parse().unwrap());
    let (status, _, _) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
}

fn query(token: Option<&str>) -> axum::http::Request<axum::body::Body> {
    let mut body = json!({ "claimCode": "GSL25021372778", "nationalId": "1088576044" });
    if let Some(token) = token {
        body["captchaToken"] = json!(token);
    }
    post_json("/api/leave", &body)
}

#[tokio::test]
async fn test_passing_token_returns_record() {
    let (addr, hits) = start_programmable_backend(|form| async move {
        assert!(form.contains(&format!("secret={}", CAPTCHA_SECRET)));
        assert!(form.contains("response=good-token"));
        assert!(form.contains("remoteip="));
        (200, json!({ "success": true, "score": 0.9 }).to_string())
    })
    .await;
    let app = router(&captcha_config(addr));
    seeded(&app).await;

    let (status, _, body) = send(&app, query(Some("good-token"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["inclusiveDayCount"], 6);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_low_score_denied() {
    let (addr, _) =
        start_programmable_backend(|_| async { (200, json!({ "success": true, "score": 0.1 }).to_string()) }).await;
    let app = router(&captcha_config(addr));
    seeded(&app).await;

    let (status, _, body) = send(&app, query(Some("bot-token"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "success": false, "message": "Access denied." }));
}

#[tokio::test]
async fn test_unsuccessful_verification_denied() {
    let (addr, _) = start_programmable_backend(|_| async {
        (200, json!({ "success": false, "error-codes": ["invalid-input-response"] }).to_string())
    })
    .await;
    let app = router(&captcha_config(addr));
    seeded(&app).await;

    let (status, _, _) = send(&app, query(Some("stale-token"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_token_denied_without_calling_service() {
    let (addr, hits) =
        start_programmable_backend(|_| async { (200, json!({ "success": true }).to_string()) }).await;
    let app = router(&captcha_config(addr));
    seeded(&app).await;

    let (status, _, _) = send(&app, query(None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _, _) = send(&app, query(Some(""))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_payload_skips_verification() {
    let (addr, hits) =
        start_programmable_backend(|_| async { (200, json!({ "success": true }).to_string()) }).await;
    let app = router(&captcha_config(addr));

    let (status, _, _) = send(
        &app,
        post_json("/api/leave", &json!({ "claimCode": "short", "nationalId": "1088576044", "captchaToken": "t" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_service_fails_closed() {
    let app = router(&captcha_config(unreachable_addr()));
    seeded(&app).await;

    let (status, _, body) = send(&app, query(Some("good-token"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_service_error_status_fails_closed() {
    let (addr, _) = start_programmable_backend(|_| async { (500, "{}".to_string()) }).await;
    let app = router(&captcha_config(addr));
    seeded(&app).await;

    let (status, _, _) = send(&app, query(Some("good-token"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
