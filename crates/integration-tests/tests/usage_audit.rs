//! Usage audit: one row per authorized lookup, never blocking the response.

use axum::http::StatusCode;
use ofertas_vin_integration_tests::{BROKEN_VIN, KNOWN_VIN, TestApp, UNKNOWN_VIN, VALID_TOKEN};

#[tokio::test]
async fn test_lookup_records_one_row() {
    let mut app = TestApp::new();

    let res = app
        .get(&format!("/api/ofertas?vin={KNOWN_VIN}"), Some(VALID_TOKEN))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let row = app.next_usage().await;
    assert_eq!(row.email, "ana@grupogranauto.mx");
    assert_eq!(row.name, "Ana Torres");
    assert_eq!(row.usage_count, 1);
    assert_eq!(row.date.len(), "2026-01-31".len());
    assert!(row.timestamp.starts_with(&row.date));

    assert!(!app.usage_recorded().await);
}

#[tokio::test]
async fn test_every_authorized_lookup_is_recorded() {
    let mut app = TestApp::new();

    let uris = [
        format!("/api/ofertas?vin={UNKNOWN_VIN}"),
        "/api/ofertas?vin=bad".to_string(),
        format!("/api/ofertas?vin={BROKEN_VIN}"),
        format!("/api/ofertas/html?vin={KNOWN_VIN}"),
    ];

    for uri in &uris {
        app.get(uri, Some(VALID_TOKEN)).await;
        let row = app.next_usage().await;
        assert_eq!(row.email, "ana@grupogranauto.mx", "{uri}");
    }

    assert!(!app.usage_recorded().await);
}
