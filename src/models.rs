use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;
use uuid::Uuid;

/// Génère un identifiant opaque
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Protocole d'un paquet synthétique
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Http,
}

impl Protocol {
    /// Ordre de tirage utilisé par le générateur de trafic
    pub const ALL: [Protocol; 4] = [Protocol::Tcp, Protocol::Udp, Protocol::Icmp, Protocol::Http];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Icmp => "ICMP",
            Self::Http => "HTTP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            "ICMP" => Ok(Self::Icmp),
            "HTTP" => Ok(Self::Http),
            other => Err(ParseError::UnknownProtocol(other.to_string())),
        }
    }
}

/// État d'un paquet dans le pipeline de classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PacketStatus {
    /// En attente d'une inspection profonde (affiché "ANALYZING")
    Pending,
    Allowed,
    /// Bloqué par le filtre de paquets (port ou IP)
    BlockedL4,
    /// Bloqué par le proxy applicatif (mot-clé)
    BlockedL7,
    /// Bloqué par le moteur d'inspection
    BlockedAi,
}

impl PacketStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::BlockedL4 | Self::BlockedL7 | Self::BlockedAi)
    }

    /// Libellé affiché par la couche de présentation
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "ANALYZING",
            Self::Allowed => "ALLOWED",
            Self::BlockedL4 => "BLOCKED_L4",
            Self::BlockedL7 => "BLOCKED_L7",
            Self::BlockedAi => "BLOCKED_AI",
        }
    }
}

impl fmt::Display for PacketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Paquet réseau synthétique
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Packet {
    pub id: String,
    pub created_at: SystemTime,
    pub source_ip: String,
    pub dest_ip: String,
    pub protocol: Protocol,
    pub port: u16,
    pub payload: String,
    pub status: PacketStatus,
    pub verdict_reason: Option<String>,
    /// Score de risque 0-100
    pub risk_score: Option<u8>,
}

impl Packet {
    pub fn new(
        source_ip: impl Into<String>,
        dest_ip: impl Into<String>,
        protocol: Protocol,
        port: u16,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            created_at: SystemTime::now(),
            source_ip: source_ip.into(),
            dest_ip: dest_ip.into(),
            protocol,
            port,
            payload: payload.into(),
            status: PacketStatus::Pending,
            verdict_reason: None,
            risk_score: None,
        }
    }
}

/// Type de règle de pare-feu
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// Filtre L4 sur le port
    Port,
    /// Filtre L4 sur l'IP source
    Ip,
    /// Filtre L7 sur le contenu
    Keyword,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Port => "L4_PORT",
            Self::Ip => "L4_IP",
            Self::Keyword => "L7_KEYWORD",
        })
    }
}

impl FromStr for RuleKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PORT" | "L4_PORT" => Ok(Self::Port),
            "IP" | "L4_IP" => Ok(Self::Ip),
            "KEYWORD" | "L7_KEYWORD" => Ok(Self::Keyword),
            other => Err(ParseError::UnknownRuleKind(other.to_string())),
        }
    }
}

/// Valeur d'une règle, dont le type est fixé par son genre
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RuleValue {
    Port(u16),
    Text(String),
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port(port) => write!(f, "{}", port),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Règle de pare-feu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub id: String,
    pub kind: RuleKind,
    pub value: RuleValue,
    pub active: bool,
}

/// Catégorie d'analyse demandée à l'oracle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisType {
    SqlInjection,
    Phishing,
    Malware,
    PacketInspection,
    DosDdos,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 5] = [
        AnalysisType::SqlInjection,
        AnalysisType::Phishing,
        AnalysisType::Malware,
        AnalysisType::PacketInspection,
        AnalysisType::DosDdos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlInjection => "SQL_INJECTION",
            Self::Phishing => "PHISHING",
            Self::Malware => "MALWARE",
            Self::PacketInspection => "PACKET_INSPECTION",
            Self::DosDdos => "DOS_DDOS",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or(ParseError::UnknownAnalysisType(wanted))
    }
}

/// Sévérité d'une menace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Safe,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entrée du journal des menaces (immuable)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatLogEntry {
    pub id: String,
    pub timestamp: SystemTime,
    pub analysis_type: AnalysisType,
    pub severity: Severity,
    pub source: String,
    pub details: String,
    pub blocked: bool,
}

impl ThreatLogEntry {
    pub fn new(
        analysis_type: AnalysisType,
        severity: Severity,
        source: impl Into<String>,
        details: impl Into<String>,
        blocked: bool,
    ) -> Self {
        Self {
            id: new_id(),
            timestamp: SystemTime::now(),
            analysis_type,
            severity,
            source: source.into(),
            details: details.into(),
            blocked,
        }
    }
}

/// Verdict renvoyé par l'oracle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub is_threat: bool,
    pub severity: Severity,
    pub reasoning: String,
    pub suggested_action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_details: Option<String>,
}

impl AnalysisResult {
    /// Verdict par défaut lorsque l'oracle échoue
    pub fn fail_open() -> Self {
        Self {
            is_threat: false,
            severity: Severity::Low,
            reasoning: "Analysis failed due to API error. Defaulting to fail-open (safe).".to_string(),
            suggested_action: "Check API Key and connectivity.".to_string(),
            technical_details: None,
        }
    }
}

/// Mode de trafic simulé
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficMode {
    #[default]
    Normal,
    HttpFlood,
    UdpFlood,
    Slowloris,
}

impl TrafficMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::HttpFlood => "HTTP_FLOOD",
            Self::UdpFlood => "UDP_FLOOD",
            Self::Slowloris => "SLOWLORIS",
        }
    }

    pub fn is_attack(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl fmt::Display for TrafficMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrafficMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "NORMAL" => Ok(Self::Normal),
            "HTTP_FLOOD" => Ok(Self::HttpFlood),
            "UDP_FLOOD" => Ok(Self::UdpFlood),
            "SLOWLORIS" => Ok(Self::Slowloris),
            other => Err(ParseError::UnknownTrafficMode(other.to_string())),
        }
    }
}

/// Échantillon de métriques de trafic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrafficSample {
    pub time: SystemTime,
    pub rps: f64,
    pub latency_ms: f64,
    pub active_ips: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(PacketStatus::Pending.label(), "ANALYZING");
        assert!(!PacketStatus::Pending.is_terminal());
        assert!(PacketStatus::Allowed.is_terminal());
        assert!(!PacketStatus::Allowed.is_blocked());
        assert!(PacketStatus::BlockedAi.is_blocked());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&PacketStatus::BlockedL4).unwrap();
        assert_eq!(json, "\"BLOCKED_L4\"");
        let json = serde_json::to_string(&AnalysisType::DosDdos).unwrap();
        assert_eq!(json, "\"DOS_DDOS\"");
        let json = serde_json::to_string(&RuleValue::Port(8080)).unwrap();
        assert_eq!(json, "8080");
    }

    #[test]
    fn test_oracle_json_shape() {
        let raw = r#"{"isThreat":true,"severity":"HIGH","reasoning":"C2 beacon","suggestedAction":"Drop"}"#;
        let result: AnalysisResult = serde_json::from_str(raw).unwrap();
        assert!(result.is_threat);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.technical_details, None);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("http".parse::<Protocol>().unwrap(), Protocol::Http);
        assert_eq!("http-flood".parse::<TrafficMode>().unwrap(), TrafficMode::HttpFlood);
        assert_eq!("l7_keyword".parse::<RuleKind>().unwrap(), RuleKind::Keyword);
        assert_eq!("sql_injection".parse::<AnalysisType>().unwrap(), AnalysisType::SqlInjection);
        assert!("SCTP".parse::<Protocol>().is_err());
    }
}
