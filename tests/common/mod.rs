#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use zsentinel::config::Config;
use zsentinel::logger::Logger;
use zsentinel::random::{shared, ScriptedRandom};
use zsentinel::{AnalysisResult, AnalysisType, SentinelService, Severity, VerdictOracle};

/// Oracle de test: verdict fixe, panne simulée et compteur d'appels
pub struct ScriptedOracle {
    verdict: Option<AnalysisResult>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn threat(severity: Severity, reasoning: &str) -> Self {
        Self::with_verdict(AnalysisResult {
            is_threat: true,
            severity,
            reasoning: reasoning.to_string(),
            suggested_action: "Drop".to_string(),
            technical_details: None,
        })
    }

    pub fn clean() -> Self {
        Self::with_verdict(AnalysisResult {
            is_threat: false,
            severity: Severity::Safe,
            reasoning: "Benign traffic".to_string(),
            suggested_action: "Allow".to_string(),
            technical_details: None,
        })
    }

    pub fn failing() -> Self {
        Self {
            verdict: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_verdict(verdict: AnalysisResult) -> Self {
        Self {
            verdict: Some(verdict),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Retarde chaque analyse
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerdictOracle for ScriptedOracle {
    async fn analyze(&self, _content: &str, _analysis_type: AnalysisType) -> anyhow::Result<AnalysisResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.verdict.clone().ok_or_else(|| anyhow!("quota dépassé"))
    }

    async fn synthesize_packet_payload(&self) -> anyhow::Result<String> {
        Err(anyhow!("synthèse indisponible"))
    }
}

/// Configuration de test sans règles initiales
pub fn empty_config() -> Config {
    Config {
        default_rules: Vec::new(),
        ..Config::default()
    }
}

/// Service de test: journal texte désactivé, aléa constant
pub async fn service_with(config: Config, oracle: Arc<ScriptedOracle>, random: f64) -> Arc<SentinelService> {
    Arc::new(
        SentinelService::with_logger(
            Arc::new(RwLock::new(config)),
            oracle,
            shared(ScriptedRandom::constant(random)),
            Arc::new(Logger::disabled()),
        )
        .await,
    )
}
