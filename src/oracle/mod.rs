//! Oracle de verdict
//!
//! Collaborateur externe qui juge un contenu arbitraire. Toute erreur de
//! l'oracle est absorbée ici: l'appelant reçoit toujours un verdict, au pire
//! le verdict "fail-open".

mod signature;

pub use signature::SignatureOracle;

use crate::models::{AnalysisResult, AnalysisType};
use anyhow::anyhow;
use async_trait::async_trait;
use log::warn;

/// Interface du service d'analyse de contenu
#[async_trait]
pub trait VerdictOracle: Send + Sync {
    /// Juge un contenu pour une catégorie d'analyse
    async fn analyze(&self, content: &str, analysis_type: AnalysisType) -> anyhow::Result<AnalysisResult>;

    /// Produit une charge utile de paquet réaliste pour la simulation
    async fn synthesize_packet_payload(&self) -> anyhow::Result<String>;
}

/// Analyse un contenu, en renvoyant le verdict sûr en cas d'échec de l'oracle
pub async fn analyze_fail_open(
    oracle: &dyn VerdictOracle,
    content: &str,
    analysis_type: AnalysisType,
) -> AnalysisResult {
    match oracle.analyze(content, analysis_type).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Échec de l'analyse {} par l'oracle, fail-open: {:#}", analysis_type, e);
            AnalysisResult::fail_open()
        }
    }
}

/// Synthétise une charge utile, ou renvoie la valeur de repli
pub async fn synthesize_or_fallback(oracle: &dyn VerdictOracle, fallback: &str) -> String {
    match oracle.synthesize_packet_payload().await {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Synthèse de charge utile impossible, repli sur {:?}: {:#}", fallback, e);
            fallback.to_string()
        }
    }
}

/// Oracle hors service: chaque appel échoue
pub struct UnavailableOracle;

#[async_trait]
impl VerdictOracle for UnavailableOracle {
    async fn analyze(&self, _content: &str, _analysis_type: AnalysisType) -> anyhow::Result<AnalysisResult> {
        Err(anyhow!("service d'analyse injoignable"))
    }

    async fn synthesize_packet_payload(&self) -> anyhow::Result<String> {
        Err(anyhow!("service d'analyse injoignable"))
    }
}
