//! Pipeline de classification des paquets
//!
//! Ordre strict, le premier filtre qui correspond l'emporte:
//! 1. filtre de paquets L4 (port puis IP source)
//! 2. proxy L7 (mot-clé dans la charge utile)
//! 3. inspection profonde par l'oracle, uniquement sur demande
//!
//! Les deux premières couches sont des fonctions pures sur un instantané des
//! règles; la troisième est pilotée par `services::inspection`.

use crate::models::{
    AnalysisResult, AnalysisType, Packet, PacketStatus, Rule, RuleKind, RuleValue, Severity,
    ThreatLogEntry,
};
use log::debug;

pub const L4_SOURCE: &str = "Packet Filter (L4)";
pub const L7_SOURCE: &str = "Proxy Filter (L7)";
pub const AI_SOURCE: &str = "NGFW-AI-Engine";

/// Score attribué aux paquets bloqués par une règle statique
pub const STATIC_BLOCK_RISK: u8 = 100;
pub const AI_BLOCK_RISK: u8 = 95;
pub const AI_ALLOW_RISK: u8 = 5;

fn active_rules(rules: &[Rule], kind: RuleKind) -> impl Iterator<Item = &Rule> {
    rules.iter().filter(move |rule| rule.active && rule.kind == kind)
}

/// Couche L4: renvoie la raison du blocage si un port ou une IP est sur liste noire
pub fn check_l4(packet: &Packet, rules: &[Rule]) -> Option<String> {
    let port_match = active_rules(rules, RuleKind::Port)
        .any(|rule| rule.value == RuleValue::Port(packet.port));
    if port_match {
        return Some(format!("Port {} is blacklisted via Packet Filter.", packet.port));
    }

    let ip_match = active_rules(rules, RuleKind::Ip).any(|rule| match &rule.value {
        RuleValue::Text(ip) => *ip == packet.source_ip,
        RuleValue::Port(_) => false,
    });
    if ip_match {
        return Some(format!("IP {} is blacklisted via Packet Filter.", packet.source_ip));
    }

    None
}

/// Couche L7: première règle (dans l'ordre du magasin) dont le mot-clé apparaît dans la charge utile
pub fn check_l7(packet: &Packet, rules: &[Rule]) -> Option<String> {
    active_rules(rules, RuleKind::Keyword).find_map(|rule| match &rule.value {
        RuleValue::Text(keyword) if packet.payload.contains(keyword.as_str()) => {
            Some(format!("Payload contains forbidden keyword: \"{}\"", keyword))
        }
        _ => None,
    })
}

/// Applique les couches statiques à un paquet en attente.
///
/// Un paquet bloqué passe immédiatement dans son état final et produit une
/// entrée de journal; l'oracle ne sera jamais consulté pour lui.
pub fn classify_static(packet: &mut Packet, rules: &[Rule]) -> Option<ThreatLogEntry> {
    if packet.status != PacketStatus::Pending {
        return None;
    }

    let (status, source, reason) = if let Some(reason) = check_l4(packet, rules) {
        (PacketStatus::BlockedL4, L4_SOURCE, reason)
    } else if let Some(reason) = check_l7(packet, rules) {
        (PacketStatus::BlockedL7, L7_SOURCE, reason)
    } else {
        return None;
    };

    debug!("Paquet {} bloqué statiquement: {}", packet.id, reason);
    packet.status = status;
    packet.risk_score = Some(STATIC_BLOCK_RISK);
    packet.verdict_reason = Some(reason.clone());

    Some(ThreatLogEntry::new(
        AnalysisType::PacketInspection,
        Severity::Medium,
        source,
        reason,
        true,
    ))
}

/// Contenu soumis à l'oracle pour l'inspection profonde
pub fn inspection_content(packet: &Packet) -> String {
    format!(
        "Payload: {}\nProtocol: {}\nPort: {}",
        packet.payload, packet.protocol, packet.port
    )
}

/// Applique le verdict de l'oracle à un paquet en attente
pub fn apply_oracle_verdict(packet: &mut Packet, result: &AnalysisResult) -> Option<ThreatLogEntry> {
    if packet.status != PacketStatus::Pending {
        return None;
    }

    packet.verdict_reason = Some(result.reasoning.clone());

    if result.is_threat {
        packet.status = PacketStatus::BlockedAi;
        packet.risk_score = Some(AI_BLOCK_RISK);
        Some(ThreatLogEntry::new(
            AnalysisType::PacketInspection,
            result.severity,
            AI_SOURCE,
            result.reasoning.clone(),
            true,
        ))
    } else {
        packet.status = PacketStatus::Allowed;
        packet.risk_score = Some(AI_ALLOW_RISK);
        None
    }
}
