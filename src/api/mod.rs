//! API JSON de contrôle de l'appliance

use crate::buffer::ProtocolFilter;
use crate::dos::DosSnapshot;
use crate::models::{AnalysisResult, AnalysisType, Packet, Rule, RuleKind, ThreatLogEntry, TrafficMode};
use crate::services::stats::DashboardSummary;
use crate::services::{InspectOutcome, SentinelService};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiResponse>)>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

fn ok(message: String) -> Json<ApiResponse> {
    Json(ApiResponse {
        success: true,
        message,
    })
}

fn failure(status: StatusCode, message: String) -> (StatusCode, Json<ApiResponse>) {
    (
        status,
        Json(ApiResponse {
            success: false,
            message,
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    pub kind: RuleKind,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct PacketQuery {
    pub protocol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: TrafficMode,
}

/// Sans `enabled`, l'état de la mitigation est inversé
#[derive(Debug, Deserialize)]
pub struct MitigationRequest {
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
    #[serde(rename = "type")]
    pub analysis_type: AnalysisType,
}

#[derive(Debug, Serialize)]
pub struct MonitoringStatus {
    pub monitoring: bool,
}

pub fn create_router(service: Arc<SentinelService>) -> Router {
    Router::new()
        .route("/api/rules", get(list_rules).post(add_rule))
        .route("/api/rules/:id", axum::routing::delete(remove_rule))
        .route("/api/rules/:id/toggle", post(toggle_rule))
        .route("/api/packets", get(list_packets))
        .route("/api/packets/generate", post(generate_packet))
        .route("/api/packets/:id", get(get_packet))
        .route("/api/packets/:id/inspect", post(inspect_packet))
        .route("/api/monitoring", get(monitoring_status))
        .route("/api/monitoring/start", post(start_monitoring))
        .route("/api/monitoring/stop", post(stop_monitoring))
        .route("/api/dos", get(dos_status))
        .route("/api/dos/mode", post(set_dos_mode))
        .route("/api/dos/mitigation", post(set_mitigation))
        .route("/api/dos/analyze", post(analyze_traffic))
        .route("/api/logs", get(list_logs))
        .route("/api/stats", get(stats))
        .route("/api/analyze", post(analyze_content))
        .with_state(service)
}

async fn list_rules(State(service): State<Arc<SentinelService>>) -> Json<Vec<Rule>> {
    Json(service.rules().await)
}

async fn add_rule(
    State(service): State<Arc<SentinelService>>,
    Json(payload): Json<RuleRequest>,
) -> ApiResult<Rule> {
    service
        .add_rule(payload.kind, &payload.value)
        .await
        .map(Json)
        .map_err(|e| failure(StatusCode::BAD_REQUEST, format!("Règle refusée: {}", e)))
}

async fn toggle_rule(
    State(service): State<Arc<SentinelService>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    match service.toggle_rule(&id).await {
        Some(active) => Ok(ok(format!(
            "Règle {} {}",
            id,
            if active { "activée" } else { "désactivée" }
        ))),
        None => Err(failure(StatusCode::NOT_FOUND, format!("Règle inconnue: {}", id))),
    }
}

async fn remove_rule(
    State(service): State<Arc<SentinelService>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    if service.remove_rule(&id).await {
        Ok(ok(format!("Règle {} supprimée", id)))
    } else {
        Err(failure(StatusCode::NOT_FOUND, format!("Règle inconnue: {}", id)))
    }
}

async fn list_packets(
    State(service): State<Arc<SentinelService>>,
    Query(query): Query<PacketQuery>,
) -> ApiResult<Vec<Packet>> {
    let filter = match query.protocol.as_deref() {
        Some(raw) => raw
            .parse::<ProtocolFilter>()
            .map_err(|e| failure(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => ProtocolFilter::All,
    };
    Ok(Json(service.packets(filter).await))
}

async fn generate_packet(State(service): State<Arc<SentinelService>>) -> ApiResult<Packet> {
    service.generate_packet().await.map(Json).ok_or_else(|| {
        failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Génération de paquet impossible".to_string(),
        )
    })
}

async fn get_packet(
    State(service): State<Arc<SentinelService>>,
    Path(id): Path<String>,
) -> ApiResult<Packet> {
    service
        .packet(&id)
        .await
        .map(Json)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, format!("Paquet inconnu: {}", id)))
}

async fn inspect_packet(
    State(service): State<Arc<SentinelService>>,
    Path(id): Path<String>,
) -> ApiResult<InspectOutcome> {
    match service.inspect_packet(&id).await {
        InspectOutcome::NotFound => Err(failure(StatusCode::NOT_FOUND, format!("Paquet inconnu: {}", id))),
        outcome => Ok(Json(outcome)),
    }
}

async fn monitoring_status(State(service): State<Arc<SentinelService>>) -> Json<MonitoringStatus> {
    Json(MonitoringStatus {
        monitoring: service.is_monitoring().await,
    })
}

async fn start_monitoring(State(service): State<Arc<SentinelService>>) -> Json<ApiResponse> {
    if service.start_monitoring().await {
        ok("Surveillance démarrée".to_string())
    } else {
        ok("La surveillance est déjà active".to_string())
    }
}

async fn stop_monitoring(State(service): State<Arc<SentinelService>>) -> Json<ApiResponse> {
    if service.stop_monitoring().await {
        ok("Surveillance arrêtée".to_string())
    } else {
        ok("La surveillance n'était pas active".to_string())
    }
}

async fn dos_status(State(service): State<Arc<SentinelService>>) -> Json<DosSnapshot> {
    Json(service.dos_snapshot().await)
}

async fn set_dos_mode(
    State(service): State<Arc<SentinelService>>,
    Json(payload): Json<ModeRequest>,
) -> Json<DosSnapshot> {
    service.set_traffic_mode(payload.mode).await;
    Json(service.dos_snapshot().await)
}

async fn set_mitigation(
    State(service): State<Arc<SentinelService>>,
    Json(payload): Json<MitigationRequest>,
) -> Json<DosSnapshot> {
    match payload.enabled {
        Some(enabled) => service.set_mitigation(enabled).await,
        None => {
            service.toggle_mitigation().await;
        }
    }
    Json(service.dos_snapshot().await)
}

async fn analyze_traffic(State(service): State<Arc<SentinelService>>) -> Json<ThreatLogEntry> {
    Json(service.analyze_traffic().await)
}

async fn list_logs(
    State(service): State<Arc<SentinelService>>,
    Query(query): Query<LogQuery>,
) -> Json<Vec<ThreatLogEntry>> {
    Json(service.logs(query.limit).await)
}

async fn stats(State(service): State<Arc<SentinelService>>) -> Json<DashboardSummary> {
    Json(service.dashboard_summary().await)
}

async fn analyze_content(
    State(service): State<Arc<SentinelService>>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<AnalysisResult> {
    service
        .analyze_content(payload.analysis_type, &payload.content)
        .await
        .map(Json)
        .map_err(|e| failure(StatusCode::BAD_REQUEST, e.to_string()))
}
