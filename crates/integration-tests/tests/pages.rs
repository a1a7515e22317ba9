//! Lookup page, static files, health check and response headers.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use ofertas_vin_integration_tests::{ALLOWED_DOMAIN, CLIENT_ID, KNOWN_VIN, TestApp, VALID_TOKEN};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let res = app.get("/healthz", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "ok");
}

#[tokio::test]
async fn test_index_page_is_public() {
    let app = TestApp::new();

    let res = app.get("/", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains(&format!(r#"data-client-id="{CLIENT_ID}""#)));
    assert!(res.body.contains(&format!("@{ALLOWED_DOMAIN}")));
    assert!(res.body.contains("https://accounts.google.com/gsi/client"));
}

#[tokio::test]
async fn test_static_files_are_served() {
    let app = TestApp::new();

    let res = app.get("/static/js/app.js", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("/api/ofertas/html"));
    assert!(res.body.contains("El VIN debe tener ${VIN_LENGTH} caracteres."));

    let res = app.get("/static/css/main.css", None).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.get("/static/missing.js", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = TestApp::new();

    for (uri, token) in [
        ("/", None),
        ("/api/me", None),
        ("/api/ofertas?vin=x", Some(VALID_TOKEN)),
    ] {
        let res = app.get(uri, token).await;
        assert_eq!(res.header("x-frame-options"), Some("DENY"), "{uri}");
        assert_eq!(res.header("x-content-type-options"), Some("nosniff"), "{uri}");
        assert!(res.header("content-security-policy").is_some(), "{uri}");
        assert!(res.header("x-request-id").is_some(), "{uri}");
    }
}

#[tokio::test]
async fn test_lookup_responses_are_not_cached() {
    let app = TestApp::new();

    let res = app
        .get(&format!("/api/ofertas?vin={KNOWN_VIN}"), Some(VALID_TOKEN))
        .await;
    assert_eq!(res.header("cache-control"), Some("no-store, max-age=0"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();

    let res = app.get("/api/nope", Some(VALID_TOKEN)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
