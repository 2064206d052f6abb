//! Analyse des rapports de trafic par l'oracle

use super::{traffic_report, DosSimulator, DosState};
use crate::models::{AnalysisType, ThreatLogEntry, TrafficMode, TrafficSample};
use crate::oracle::analyze_fail_open;
use log::info;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::task::JoinHandle;

pub const DOS_SOURCE: &str = "Traffic-Flow-Analyzer";

impl DosSimulator {
    /// Métrique surveillée et seuil associé: latence pour un Slowloris, débit sinon
    fn watched_metric(&self, mode: TrafficMode, sample: &TrafficSample) -> (f64, f64) {
        match mode {
            TrafficMode::Slowloris => (sample.latency_ms, self.settings.latency_threshold),
            _ => (sample.rps, self.settings.rps_threshold),
        }
    }

    /// Réserve l'analyse automatique de la session si toutes les conditions
    /// sont réunies. Le verrou est posé avant tout appel à l'oracle.
    pub(crate) fn claim_auto_analysis(&self, state: &DosState, sample: &TrafficSample) -> bool {
        if !state.mode.is_attack() || state.mitigation {
            return false;
        }

        let (metric, threshold) = self.watched_metric(state.mode, sample);
        if metric <= threshold {
            return false;
        }

        self.analyzed_this_session
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Lance l'analyse en tâche de fond; le tick n'attend jamais l'oracle
    pub(crate) fn spawn_analysis(&self, report: String, mitigation: bool) -> JoinHandle<()> {
        let oracle = Arc::clone(&self.oracle);
        let threat_log = Arc::clone(&self.threat_log);
        info!("Seuil dépassé, analyse automatique du trafic");

        tokio::spawn(async move {
            let result = analyze_fail_open(oracle.as_ref(), &report, AnalysisType::DosDdos).await;
            let entry = ThreatLogEntry::new(
                AnalysisType::DosDdos,
                result.severity,
                DOS_SOURCE,
                result.reasoning,
                mitigation,
            );
            threat_log.append(entry).await;
        })
    }

    /// Analyse manuelle du dernier échantillon (zéros avant le premier tick).
    /// Ignore le verrou de session et ne le modifie pas.
    pub async fn manual_analysis(&self) -> ThreatLogEntry {
        let (report, mitigation) = {
            let state = self.state.read().await;
            let sample = state.latest.clone().unwrap_or(TrafficSample {
                time: SystemTime::now(),
                rps: 0.0,
                latency_ms: 0.0,
                active_ips: 0,
            });
            (traffic_report(&sample, state.mode), state.mitigation)
        };

        let result = analyze_fail_open(self.oracle.as_ref(), &report, AnalysisType::DosDdos).await;
        let entry = ThreatLogEntry::new(
            AnalysisType::DosDdos,
            result.severity,
            DOS_SOURCE,
            result.reasoning,
            mitigation,
        );
        self.threat_log.append(entry.clone()).await;
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dos::DosSettings;
    use crate::logger::Logger;
    use crate::models::Severity;
    use crate::oracle::{SignatureOracle, UnavailableOracle, VerdictOracle};
    use crate::random::{shared, ScriptedRandom};
    use crate::threat_log::ThreatLog;

    fn simulator(oracle: Arc<dyn VerdictOracle>, random: f64) -> DosSimulator {
        DosSimulator::new(
            DosSettings::from(&Config::default()),
            Arc::new(ThreatLog::new()),
            oracle,
            shared(ScriptedRandom::constant(random)),
            Arc::new(Logger::disabled()),
        )
    }

    #[tokio::test]
    async fn test_auto_analysis_once_per_session() {
        let simulator = simulator(Arc::new(SignatureOracle::new()), 0.5);
        simulator.set_mode(TrafficMode::HttpFlood).await;

        let mut launched = 0;
        for _ in 0..10 {
            let report = simulator.tick().await.unwrap();
            assert!(report.sample.rps > 500.0);
            if let Some(handle) = report.analysis {
                handle.await.unwrap();
                launched += 1;
            }
        }

        assert_eq!(launched, 1);
        assert!(simulator.analyzed_this_session());
        let entries = simulator.threat_log.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].analysis_type, AnalysisType::DosDdos);
        assert_eq!(entries[0].source, DOS_SOURCE);
        assert!(!entries[0].blocked);
    }

    #[tokio::test]
    async fn test_slowloris_watches_latency() {
        let simulator = simulator(Arc::new(SignatureOracle::new()), 0.5);
        simulator.set_mode(TrafficMode::Slowloris).await;

        let report = simulator.tick().await.unwrap();
        assert!(report.sample.rps < 500.0);
        let handle = report.analysis.expect("latence au-dessus du seuil");
        handle.await.unwrap();

        let entries = simulator.threat_log.entries().await;
        assert_eq!(entries[0].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_manual_analysis_keeps_latch() {
        let simulator = simulator(Arc::new(UnavailableOracle), 0.5);

        // Avant le premier tick: métriques nulles, verdict fail-open
        let entry = simulator.manual_analysis().await;
        assert_eq!(entry.severity, Severity::Low);
        assert!(!simulator.analyzed_this_session());

        simulator.set_mode(TrafficMode::UdpFlood).await;
        simulator.set_mitigation(true).await;
        simulator.tick().await.unwrap();
        let entry = simulator.manual_analysis().await;
        assert!(entry.blocked);
        assert!(!simulator.analyzed_this_session());
        assert_eq!(simulator.threat_log.len().await, 2);
    }
}
