mod common;

use common::{empty_config, service_with, ScriptedOracle};
use futures::future::join_all;
use std::sync::Arc;
use zsentinel::{AnalysisType, Severity, TrafficMode};

#[tokio::test]
async fn test_http_flood_analyzed_once() {
    let oracle = Arc::new(ScriptedOracle::threat(Severity::High, "HTTP flood from botnet"));
    let service = service_with(empty_config(), oracle.clone(), 0.5).await;
    service.set_traffic_mode(TrafficMode::HttpFlood).await;

    for _ in 0..10 {
        let report = service.dos_tick().await.unwrap();
        assert!(report.sample.rps > 500.0);
        if let Some(handle) = report.analysis {
            handle.await.unwrap();
        }
    }

    let logs = service.logs(None).await;
    let dos_entries: Vec<_> = logs
        .iter()
        .filter(|entry| entry.analysis_type == AnalysisType::DosDdos)
        .collect();
    assert_eq!(dos_entries.len(), 1);
    assert_eq!(dos_entries[0].source, "Traffic-Flow-Analyzer");
    assert_eq!(dos_entries[0].details, "HTTP flood from botnet");
    assert!(!dos_entries[0].blocked);
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn test_mitigation_scales_traffic() {
    let service = service_with(empty_config(), Arc::new(ScriptedOracle::clean()), 0.401).await;
    service.set_traffic_mode(TrafficMode::HttpFlood).await;
    service.set_mitigation(true).await;

    let report = service.dos_tick().await.unwrap();
    assert!((report.sample.rps - 100.0).abs() < 1e-9);
    // latence brute 400 + floor(0.401 * 200) = 480
    assert!((report.sample.latency_ms - 96.0).abs() < 1e-9);
    assert!(report.analysis.is_none());

    let snapshot = service.dos_snapshot().await;
    assert_eq!(snapshot.dropped, 900);
    assert!(snapshot.mitigation);
    assert!(!snapshot.analyzed_this_session);
}

#[tokio::test]
async fn test_mode_change_resets_latch() {
    let oracle = Arc::new(ScriptedOracle::threat(Severity::Critical, "volumetric"));
    let service = service_with(empty_config(), oracle.clone(), 0.5).await;

    service.set_traffic_mode(TrafficMode::UdpFlood).await;
    let report = service.dos_tick().await.unwrap();
    report.analysis.unwrap().await.unwrap();
    assert!(service.dos_snapshot().await.analyzed_this_session);
    assert!(service.dos_tick().await.unwrap().analysis.is_none());

    service.set_traffic_mode(TrafficMode::HttpFlood).await;
    assert!(!service.dos_snapshot().await.analyzed_this_session);
    let report = service.dos_tick().await.unwrap();
    report.analysis.unwrap().await.unwrap();

    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn test_mitigation_toggle_keeps_session() {
    let oracle = Arc::new(ScriptedOracle::threat(Severity::High, "flood"));
    let service = service_with(empty_config(), oracle.clone(), 0.5).await;
    service.set_traffic_mode(TrafficMode::HttpFlood).await;
    service.dos_tick().await.unwrap().analysis.unwrap().await.unwrap();

    assert!(service.toggle_mitigation().await);
    assert!(service.dos_tick().await.unwrap().analysis.is_none());
    assert!(!service.toggle_mitigation().await);

    // Même activation du mode: pas de seconde analyse automatique
    for _ in 0..5 {
        assert!(service.dos_tick().await.unwrap().analysis.is_none());
    }
    assert!(service.dos_snapshot().await.analyzed_this_session);
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mitigation_toggles() {
    let service = service_with(empty_config(), Arc::new(ScriptedOracle::clean()), 0.5).await;

    let states = join_all((0..16).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.toggle_mitigation().await })
    }))
    .await;

    let enabled = states.into_iter().filter(|state| *state.as_ref().unwrap()).count();
    assert_eq!(enabled, 8);
    assert!(!service.dos_snapshot().await.mitigation);
}

#[tokio::test]
async fn test_normal_mode_never_analyzed() {
    let oracle = Arc::new(ScriptedOracle::threat(Severity::High, "unused"));
    let service = service_with(empty_config(), oracle.clone(), 0.99).await;

    for _ in 0..5 {
        assert!(service.dos_tick().await.unwrap().analysis.is_none());
    }
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn test_peak_and_window() {
    let service = service_with(empty_config(), Arc::new(ScriptedOracle::clean()), 0.5).await;
    service.set_traffic_mode(TrafficMode::UdpFlood).await;
    for _ in 0..3 {
        if let Some(handle) = service.dos_tick().await.unwrap().analysis {
            handle.await.unwrap();
        }
    }

    service.set_traffic_mode(TrafficMode::Normal).await;
    for _ in 0..25 {
        service.dos_tick().await.unwrap();
    }

    let snapshot = service.dos_snapshot().await;
    assert_eq!(snapshot.window.len(), 20);
    assert_eq!(snapshot.peak_rps, 2500.0);
    assert_eq!(snapshot.latest.unwrap().rps, 35.0);
}

#[tokio::test]
async fn test_failed_auto_analysis_logs_fail_open_entry() {
    let service = service_with(empty_config(), Arc::new(ScriptedOracle::failing()), 0.5).await;
    service.set_traffic_mode(TrafficMode::Slowloris).await;
    service.dos_tick().await.unwrap().analysis.unwrap().await.unwrap();

    let logs = service.logs(None).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].severity, Severity::Low);
    assert_eq!(
        logs[0].details,
        "Analysis failed due to API error. Defaulting to fail-open (safe)."
    );
}

#[tokio::test]
async fn test_manual_analysis_ignores_latch() {
    let oracle = Arc::new(ScriptedOracle::clean());
    let service = service_with(empty_config(), oracle.clone(), 0.5).await;

    let entry = service.analyze_traffic().await;
    assert_eq!(entry.analysis_type, AnalysisType::DosDdos);
    service.analyze_traffic().await;

    assert_eq!(oracle.calls(), 2);
    assert!(!service.dos_snapshot().await.analyzed_this_session);
}
