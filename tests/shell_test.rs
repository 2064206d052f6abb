mod common;

use common::{empty_config, service_with, ScriptedOracle};
use std::sync::Arc;
use zsentinel::config::Config;
use zsentinel::Severity;

#[tokio::test]
async fn test_rule_commands() {
    let service = service_with(empty_config(), Arc::new(ScriptedOracle::clean()), 0.5).await;

    let output = service.handle_command("rule add keyword DROP TABLE").await.unwrap();
    assert!(output.contains("L7_KEYWORD DROP TABLE"));
    let id = service.rules().await[0].id.clone();

    let output = service.handle_command(&format!("rule toggle {}", id)).await.unwrap();
    assert!(output.ends_with("désactivée"));
    assert!(service.handle_command("rule toggle nope").await.is_err());

    assert!(service.handle_command("rule add port 70000").await.is_err());
    assert!(service.handle_command("rule add proto 80").await.is_err());

    let listing = service.handle_command("rules").await.unwrap();
    assert!(listing.contains("inactive"));
}

#[tokio::test]
async fn test_packet_and_dos_commands() {
    let oracle = Arc::new(ScriptedOracle::threat(Severity::High, "flood detected"));
    let service = service_with(empty_config(), oracle, 0.5).await;

    let generated = service.handle_command("generate").await.unwrap();
    let id = generated.split_whitespace().next().unwrap().to_string();
    let inspected = service.handle_command(&format!("inspect {}", id)).await.unwrap();
    assert!(inspected.contains("BLOCKED_AI"));
    let again = service.handle_command(&format!("inspect {}", id)).await.unwrap();
    assert!(again.starts_with("Déjà inspecté"));

    service.handle_command("dos mode http-flood").await.unwrap();
    let tick = service.handle_command("dos tick").await.unwrap();
    assert!(tick.starts_with("rps=1050.0"));
    let status = service.handle_command("dos status").await.unwrap();
    assert!(status.contains("HTTP_FLOOD"));
    assert!(status.contains("Analysé: oui"));

    let logs = service.handle_command("logs 1").await.unwrap();
    assert!(logs.contains("DOS_DDOS"));
    assert!(service.handle_command("dos mitigation maybe").await.is_err());
    assert!(service.handle_command("unknown").await.is_err());
}

#[tokio::test]
async fn test_dashboard_report() {
    let service = service_with(Config::default(), Arc::new(ScriptedOracle::clean()), 0.5).await;
    service.handle_command("analyze sql SELECT 1").await.unwrap();

    let report = service.handle_command("stats").await.unwrap();
    assert!(report.contains("Événements journalisés: 1"));
    assert!(report.contains("Règles: 3 (2 actives)"));
    assert!(report.contains("Mode: NORMAL"));
}
