//! Portes d'analyse de contenu à la demande (WAF, phishing, malware)

use crate::error::AnalysisError;
use crate::models::{AnalysisResult, AnalysisType, ThreatLogEntry};
use crate::oracle::analyze_fail_open;
use crate::services::SentinelService;

pub const SQL_GATE_SOURCE: &str = "WAF-Input-Gate-01";
pub const PHISHING_GATE_SOURCE: &str = "Phishing-URL-Scanner";
pub const MALWARE_GATE_SOURCE: &str = "Malware-Heuristic-Engine";

/// Longueur de l'extrait de requête recopié dans le journal
const SQL_EXCERPT_CHARS: usize = 30;

/// Source et détails de l'entrée de journal produite par une porte
pub fn gate_entry_fields(
    analysis_type: AnalysisType,
    content: &str,
    is_threat: bool,
) -> Result<(&'static str, String), AnalysisError> {
    match analysis_type {
        AnalysisType::SqlInjection => {
            let excerpt: String = content.chars().take(SQL_EXCERPT_CHARS).collect();
            let verdict = if is_threat { "Detected" } else { "Clean" };
            Ok((SQL_GATE_SOURCE, format!("Pattern: {}... Result: {}", excerpt, verdict)))
        }
        AnalysisType::Phishing => {
            let verdict = if is_threat { "Malicious" } else { "Clean" };
            Ok((PHISHING_GATE_SOURCE, format!("URL Scan: {}", verdict)))
        }
        AnalysisType::Malware => {
            let verdict = if is_threat { "Malicious" } else { "Clean" };
            Ok((MALWARE_GATE_SOURCE, format!("Heuristic Scan: {}", verdict)))
        }
        other => Err(AnalysisError::UnsupportedGate(other)),
    }
}

impl SentinelService {
    /// Soumet un contenu à l'oracle et journalise le verdict.
    /// Le contenu est bloqué exactement quand l'oracle y voit une menace.
    pub async fn analyze_content(
        &self,
        analysis_type: AnalysisType,
        content: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        if content.trim().is_empty() {
            return Err(AnalysisError::EmptyContent);
        }
        // Valide la porte avant tout appel à l'oracle
        gate_entry_fields(analysis_type, content, false)?;

        let result = analyze_fail_open(self.oracle.as_ref(), content, analysis_type).await;
        let (source, details) = gate_entry_fields(analysis_type, content, result.is_threat)?;
        self.threat_log
            .append(ThreatLogEntry::new(
                analysis_type,
                result.severity,
                source,
                details,
                result.is_threat,
            ))
            .await;

        Ok(result)
    }

    pub async fn analyze_sql(&self, query: &str) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_content(AnalysisType::SqlInjection, query).await
    }

    pub async fn scan_phishing(&self, content: &str) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_content(AnalysisType::Phishing, content).await
    }

    pub async fn scan_malware(&self, content: &str) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_content(AnalysisType::Malware, content).await
    }
}
