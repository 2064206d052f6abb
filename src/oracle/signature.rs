//! Moteur de verdict local à base de signatures
//!
//! Remplace le service d'analyse distant pour faire tourner le simulateur
//! hors ligne. Les signatures sont de simples motifs recherchés sans tenir
//! compte de la casse; la sévérité retenue est la plus haute des signatures
//! trouvées.

use super::VerdictOracle;
use crate::models::{AnalysisResult, AnalysisType, Severity};
use crate::random::{draw_index, shared, SharedRandom, ThreadRandom};
use anyhow::anyhow;
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;

struct Signature {
    pattern: &'static str,
    severity: Severity,
    description: &'static str,
}

const fn sig(pattern: &'static str, severity: Severity, description: &'static str) -> Signature {
    Signature {
        pattern,
        severity,
        description,
    }
}

const SAMPLE_PAYLOADS: &[&str] = &[
    "GET / HTTP/1.1",
    "GET /index.html HTTP/1.1\r\nHost: intranet.local",
    "POST /login HTTP/1.1\r\n\r\nuser=admin' OR 1=1 --",
    "GET /../../etc/passwd HTTP/1.1",
    "BEACON id=7f3a interval=60 exfil=dns",
    "PING 192.168.1.1",
    "SSH-2.0-OpenSSH_8.9",
    "GET /search?q=<script>alert(1)</script> HTTP/1.1",
    "cmd.exe /c whoami",
    "DNS QUERY A updates.example.com",
];

/// Seuils de l'heuristique volumétrique appliquée aux rapports de trafic
const VOLUMETRIC_RPS: f64 = 1500.0;
const FLOOD_RPS: f64 = 500.0;
const SLOW_LATENCY_MS: f64 = 1000.0;
const SLOW_MAX_RPS: f64 = 100.0;

pub struct SignatureOracle {
    signatures: HashMap<AnalysisType, Vec<Signature>>,
    random: SharedRandom,
}

impl SignatureOracle {
    pub fn new() -> Self {
        Self::with_random(shared(ThreadRandom::new()))
    }

    /// Oracle dont la synthèse de charges utiles suit la source fournie
    pub fn with_random(random: SharedRandom) -> Self {
        let mut oracle = Self {
            signatures: HashMap::new(),
            random,
        };
        oracle.initialize_signatures();
        oracle
    }

    fn initialize_signatures(&mut self) {
        self.signatures.insert(
            AnalysisType::SqlInjection,
            vec![
                sig("or 1=1", Severity::High, "tautology-based injection"),
                sig("union select", Severity::High, "UNION-based data extraction"),
                sig("drop table", Severity::Critical, "destructive stacked query"),
                sig("xp_cmdshell", Severity::Critical, "command execution through the database"),
                sig("sleep(", Severity::Medium, "time-based blind injection"),
                sig("' --", Severity::Medium, "comment-terminated quote"),
                sig("'--", Severity::Medium, "comment-terminated quote"),
            ],
        );

        self.signatures.insert(
            AnalysisType::Phishing,
            vec![
                sig("xn--", Severity::High, "punycode homograph domain"),
                sig("verify your account", Severity::High, "credential harvesting lure"),
                sig("paypa1", Severity::High, "brand impersonation"),
                sig("urgent", Severity::Medium, "urgency cue"),
                sig("password", Severity::Medium, "credential request"),
                sig("bit.ly", Severity::Low, "shortened link hiding the destination"),
            ],
        );

        self.signatures.insert(
            AnalysisType::Malware,
            vec![
                sig("powershell -enc", Severity::Critical, "encoded PowerShell launcher"),
                sig("vssadmin delete shadows", Severity::Critical, "shadow copy destruction"),
                sig("eval(base64", Severity::High, "obfuscated script loader"),
                sig("cmd.exe", Severity::High, "shell invocation"),
                sig("/bin/sh", Severity::High, "shell invocation"),
                sig("wget http", Severity::Medium, "second-stage download"),
                sig("chmod +x", Severity::Medium, "dropped binary made executable"),
            ],
        );

        self.signatures.insert(
            AnalysisType::PacketInspection,
            vec![
                sig("\\x90\\x90", Severity::Critical, "NOP sled"),
                sig("drop table", Severity::Critical, "SQL payload in transit"),
                sig("cmd.exe", Severity::High, "remote command execution"),
                sig("/etc/passwd", Severity::High, "path traversal to system files"),
                sig("union select", Severity::High, "SQL payload in transit"),
                sig("or 1=1", Severity::High, "SQL payload in transit"),
                sig("beacon", Severity::High, "command and control heartbeat"),
                sig("exfil", Severity::High, "data exfiltration channel"),
                sig("<script>", Severity::Medium, "reflected script injection"),
                sig("../", Severity::Medium, "path traversal"),
            ],
        );

        debug!("Signatures locales initialisées");
    }

    fn match_signatures(&self, content: &str, analysis_type: AnalysisType) -> AnalysisResult {
        let lowered = content.to_lowercase();
        let matched: Vec<&Signature> = self
            .signatures
            .get(&analysis_type)
            .map(|signatures| {
                signatures
                    .iter()
                    .filter(|signature| lowered.contains(signature.pattern))
                    .collect()
            })
            .unwrap_or_default();

        let Some(worst) = matched.iter().max_by_key(|signature| signature.severity) else {
            return AnalysisResult {
                is_threat: false,
                severity: Severity::Safe,
                reasoning: "No known attack signature matched the content.".to_string(),
                suggested_action: "Allow.".to_string(),
                technical_details: None,
            };
        };

        let descriptions: Vec<&str> = matched.iter().map(|signature| signature.description).collect();
        let patterns: Vec<&str> = matched.iter().map(|signature| signature.pattern).collect();

        AnalysisResult {
            is_threat: true,
            severity: worst.severity,
            reasoning: format!("Detected {}.", descriptions.join(", ")),
            suggested_action: "Block the source and review related traffic.".to_string(),
            technical_details: Some(format!("Matched patterns: {}", patterns.join(" | "))),
        }
    }

    /// Heuristique sur un rapport de trafic: lit le débit et la latence
    fn judge_traffic(&self, report: &str) -> AnalysisResult {
        let rps = read_metric(report, "Current RPS:").unwrap_or(0.0);
        let latency = read_metric(report, "Average Latency:").unwrap_or(0.0);
        let udp_heavy = report.contains("UDP");

        let (severity, reasoning, action) = if rps > VOLUMETRIC_RPS && udp_heavy {
            (
                Severity::Critical,
                format!("Volumetric UDP flood: {:.0} requests per second.", rps),
                "Enable upstream scrubbing and rate-limit UDP at the edge.",
            )
        } else if latency > SLOW_LATENCY_MS && rps < SLOW_MAX_RPS {
            (
                Severity::High,
                format!(
                    "Slowloris pattern: {:.0}ms latency with only {:.0} requests per second.",
                    latency, rps
                ),
                "Lower connection timeouts and cap concurrent connections per source.",
            )
        } else if rps > FLOOD_RPS {
            (
                Severity::High,
                format!("HTTP flood: {:.0} requests per second.", rps),
                "Rate-limit per source IP and challenge suspicious clients.",
            )
        } else {
            return AnalysisResult {
                is_threat: false,
                severity: Severity::Safe,
                reasoning: format!("Traffic within baseline ({:.0} rps, {:.0}ms).", rps, latency),
                suggested_action: "No action required.".to_string(),
                technical_details: None,
            };
        };

        AnalysisResult {
            is_threat: true,
            severity,
            reasoning,
            suggested_action: action.to_string(),
            technical_details: Some(format!("rps={:.2} latency_ms={:.2} udp={}", rps, latency, udp_heavy)),
        }
    }
}

impl Default for SignatureOracle {
    fn default() -> Self {
        Self::new()
    }
}

/// Lit la valeur numérique qui suit `label` sur sa ligne
fn read_metric(report: &str, label: &str) -> Option<f64> {
    let line = report.lines().find(|line| line.contains(label))?;
    let (_, rest) = line.split_once(label)?;
    let number: String = rest
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    number.parse().ok()
}

#[async_trait]
impl VerdictOracle for SignatureOracle {
    async fn analyze(&self, content: &str, analysis_type: AnalysisType) -> anyhow::Result<AnalysisResult> {
        let result = match analysis_type {
            AnalysisType::DosDdos => self.judge_traffic(content),
            other => self.match_signatures(content, other),
        };
        debug!(
            "Verdict local {}: menace={} sévérité={}",
            analysis_type, result.is_threat, result.severity
        );
        Ok(result)
    }

    async fn synthesize_packet_payload(&self) -> anyhow::Result<String> {
        let mut random = self
            .random
            .lock()
            .map_err(|_| anyhow!("source d'aléa empoisonnée"))?;
        let index = draw_index(&mut **random, SAMPLE_PAYLOADS.len());
        Ok(SAMPLE_PAYLOADS[index].to_string())
    }
}
