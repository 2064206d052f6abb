//! Journal des menaces
//!
//! Ajout seul, consulté du plus récent au plus ancien. Les agrégats sont des
//! replis en lecture qui ne modifient jamais le journal.

use crate::logger::Logger;
use crate::models::{AnalysisType, Severity, ThreatLogEntry};
use log::{info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Agrégats pour le tableau de bord
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ThreatStats {
    pub total: usize,
    /// Entrées dont la sévérité n'est pas SAFE
    pub total_threats: usize,
    pub blocked: usize,
    /// Entrées non bloquées (simples alertes)
    pub alerts: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<String, usize>,
}

impl ThreatStats {
    pub fn severity_count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn type_count(&self, analysis_type: AnalysisType) -> usize {
        self.by_type.get(analysis_type.as_str()).copied().unwrap_or(0)
    }
}

pub struct ThreatLog {
    entries: RwLock<VecDeque<ThreatLogEntry>>,
    logger: Option<Arc<Logger>>,
}

impl ThreatLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            logger: None,
        }
    }

    /// Recopie chaque entrée dans le journal texte
    pub fn with_logger(logger: Arc<Logger>) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            logger: Some(logger),
        }
    }

    pub async fn append(&self, entry: ThreatLogEntry) {
        match entry.severity {
            Severity::Safe | Severity::Low => info!(
                "[{}] {} - {} ({})",
                entry.analysis_type, entry.source, entry.details, entry.severity
            ),
            _ => warn!(
                "[{}] {} - {} ({})",
                entry.analysis_type, entry.source, entry.details, entry.severity
            ),
        }

        if let Some(logger) = &self.logger {
            logger.log_threat(&entry);
        }

        self.entries.write().await.push_front(entry);
    }

    /// Toutes les entrées, de la plus récente à la plus ancienne
    pub async fn entries(&self) -> Vec<ThreatLogEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn recent(&self, count: usize) -> Vec<ThreatLogEntry> {
        self.entries.read().await.iter().take(count).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> ThreatStats {
        let entries = self.entries.read().await;
        aggregate(entries.iter())
    }
}

impl Default for ThreatLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Replie une suite d'entrées en agrégats
pub fn aggregate<'a>(entries: impl Iterator<Item = &'a ThreatLogEntry>) -> ThreatStats {
    entries.fold(ThreatStats::default(), |mut stats, entry| {
        stats.total += 1;
        if entry.severity != Severity::Safe {
            stats.total_threats += 1;
        }
        if entry.blocked {
            stats.blocked += 1;
        } else {
            stats.alerts += 1;
        }
        *stats.by_severity.entry(entry.severity).or_insert(0) += 1;
        *stats
            .by_type
            .entry(entry.analysis_type.as_str().to_string())
            .or_insert(0) += 1;
        stats
    })
}
