//! Tableau de bord: agrégats en lecture seule sur l'état du service

use crate::models::{PacketStatus, Severity, TrafficMode};
use crate::services::SentinelService;
use crate::threat_log::ThreatStats;
use num_format::{Locale, ToFormattedString};
use serde::Serialize;

/// Répartition des paquets du tampon par état
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PacketCounts {
    pub total: usize,
    pub analyzing: usize,
    pub allowed: usize,
    pub blocked_l4: usize,
    pub blocked_l7: usize,
    pub blocked_ai: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub threats: ThreatStats,
    pub packets: PacketCounts,
    pub rules_total: usize,
    pub rules_active: usize,
    pub monitoring: bool,
    pub traffic_mode: TrafficMode,
    pub mitigation: bool,
    pub current_rps: f64,
    pub peak_rps: f64,
    pub dropped: u64,
}

impl SentinelService {
    pub async fn dashboard_summary(&self) -> DashboardSummary {
        let packets = {
            let buffer = self.buffer.read().await;
            buffer.iter().fold(
                PacketCounts {
                    total: buffer.len(),
                    ..PacketCounts::default()
                },
                |mut counts, packet| {
                    match packet.status {
                        PacketStatus::Pending => counts.analyzing += 1,
                        PacketStatus::Allowed => counts.allowed += 1,
                        PacketStatus::BlockedL4 => counts.blocked_l4 += 1,
                        PacketStatus::BlockedL7 => counts.blocked_l7 += 1,
                        PacketStatus::BlockedAi => counts.blocked_ai += 1,
                    }
                    counts
                },
            )
        };

        let rules = self.rules.snapshot().await;
        let dos = self.dos.snapshot().await;

        DashboardSummary {
            threats: self.threat_log.stats().await,
            packets,
            rules_total: rules.len(),
            rules_active: rules.iter().filter(|rule| rule.active).count(),
            monitoring: self.is_monitoring().await,
            traffic_mode: dos.mode,
            mitigation: dos.mitigation,
            current_rps: dos.latest.map(|sample| sample.rps).unwrap_or(0.0),
            peak_rps: dos.peak_rps,
            dropped: dos.dropped,
        }
    }

    /// Rendu texte du tableau de bord
    pub async fn dashboard_report(&self) -> String {
        let summary = self.dashboard_summary().await;
        let threats = &summary.threats;

        let mut response = String::new();
        response.push_str("=== Tableau de bord ===\n");
        response.push_str(&format!(
            "Événements journalisés: {}\n",
            threats.total.to_formatted_string(&Locale::fr)
        ));
        response.push_str(&format!(
            "Menaces: {} (bloquées: {}, alertes: {})\n",
            threats.total_threats.to_formatted_string(&Locale::fr),
            threats.blocked.to_formatted_string(&Locale::fr),
            threats.alerts.to_formatted_string(&Locale::fr)
        ));
        for severity in Severity::ALL.iter().rev() {
            response.push_str(&format!("  {:<8} {}\n", severity.as_str(), threats.severity_count(*severity)));
        }
        for (analysis_type, count) in &threats.by_type {
            response.push_str(&format!("  {:<18} {}\n", analysis_type, count));
        }

        response.push_str("\n=== Pare-feu ===\n");
        response.push_str(&format!(
            "Règles: {} ({} actives)\n",
            summary.rules_total, summary.rules_active
        ));
        response.push_str(&format!(
            "Surveillance: {}\n",
            if summary.monitoring { "active" } else { "arrêtée" }
        ));
        let packets = &summary.packets;
        response.push_str(&format!(
            "Paquets en mémoire: {} (analyse: {}, autorisés: {}, L4: {}, L7: {}, IA: {})\n",
            packets.total,
            packets.analyzing,
            packets.allowed,
            packets.blocked_l4,
            packets.blocked_l7,
            packets.blocked_ai
        ));

        response.push_str("\n=== Trafic ===\n");
        response.push_str(&format!("Mode: {}\n", summary.traffic_mode));
        response.push_str(&format!(
            "Mitigation: {}\n",
            if summary.mitigation { "active" } else { "inactive" }
        ));
        response.push_str(&format!(
            "Requêtes/s: {:.0} (pic: {:.0})\n",
            summary.current_rps, summary.peak_rps
        ));
        response.push_str(&format!(
            "Requêtes écartées: {}\n",
            summary.dropped.to_formatted_string(&Locale::fr)
        ));

        response
    }
}
