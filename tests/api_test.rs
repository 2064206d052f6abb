mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{empty_config, service_with, ScriptedOracle};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use zsentinel::api::create_router;
use zsentinel::{Packet, Protocol, Severity};

async fn call(router: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_rule_lifecycle() {
    let service = service_with(empty_config(), Arc::new(ScriptedOracle::clean()), 0.5).await;
    let router = create_router(service.clone());

    let (status, rule) = call(
        router.clone(),
        "POST",
        "/api/rules",
        Some(json!({"kind": "PORT", "value": "3389"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rule["value"], 3389);
    let id = rule["id"].as_str().unwrap().to_string();

    let (status, _) = call(router.clone(), "POST", &format!("/api/rules/{}/toggle", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!service.rules().await[0].active);

    let (status, _) = call(
        router.clone(),
        "POST",
        "/api/rules",
        Some(json!({"kind": "IP", "value": "not-an-ip"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(router.clone(), "DELETE", &format!("/api/rules/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(router, "DELETE", &format!("/api/rules/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inspect_route() {
    let oracle = Arc::new(ScriptedOracle::threat(Severity::High, "exfiltration"));
    let service = service_with(empty_config(), oracle, 0.5).await;
    let stored = service
        .ingest_packet(Packet::new("192.168.1.9", "10.0.0.2", Protocol::Udp, 53, "exfil=dns"))
        .await;
    let router = create_router(service);

    let (status, body) = call(
        router.clone(),
        "POST",
        &format!("/api/packets/{}/inspect", stored.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "INSPECTED");
    assert_eq!(body["packet"]["status"], "BLOCKED_AI");

    let (_, body) = call(router.clone(), "GET", "/api/packets?protocol=UDP", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = call(router.clone(), "GET", "/api/packets?protocol=ICMP", None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = call(router, "POST", "/api/packets/missing/inspect", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dos_routes() {
    let service = service_with(empty_config(), Arc::new(ScriptedOracle::clean()), 0.5).await;
    let router = create_router(service.clone());

    let (_, body) = call(router.clone(), "POST", "/api/dos/mode", Some(json!({"mode": "SLOWLORIS"}))).await;
    assert_eq!(body["mode"], "SLOWLORIS");

    let (_, body) = call(router.clone(), "POST", "/api/dos/mitigation", Some(json!({}))).await;
    assert_eq!(body["mitigation"], true);
    let (_, body) = call(
        router.clone(),
        "POST",
        "/api/dos/mitigation",
        Some(json!({"enabled": false})),
    )
    .await;
    assert_eq!(body["mitigation"], false);

    let (_, body) = call(router.clone(), "POST", "/api/dos/analyze", None).await;
    assert_eq!(body["analysis_type"], "DOS_DDOS");
    assert_eq!(body["source"], "Traffic-Flow-Analyzer");

    let (_, body) = call(router, "GET", "/api/stats", None).await;
    assert_eq!(body["threats"]["total"], 1);
    assert_eq!(body["traffic_mode"], "SLOWLORIS");
}

#[tokio::test]
async fn test_analyze_route() {
    let service = service_with(empty_config(), Arc::new(ScriptedOracle::clean()), 0.5).await;
    let router = create_router(service);

    let (status, body) = call(
        router.clone(),
        "POST",
        "/api/analyze",
        Some(json!({"content": "http://example.com/login", "type": "PHISHING"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isThreat"], false);

    let (status, _) = call(
        router.clone(),
        "POST",
        "/api/analyze",
        Some(json!({"content": "", "type": "MALWARE"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(router, "GET", "/api/logs?limit=5", None).await;
    assert_eq!(body[0]["details"], "URL Scan: Clean");
}
