//! Service principal de l'appliance simulée
//!
//! `SentinelService` possède tout l'état partagé (règles, tampon de paquets,
//! journal des menaces, simulateur DoS) et expose les commandes de la couche
//! de présentation. Il n'existe aucun état global en dehors de lui.

mod command_handler;
mod gates;
mod inspection;
pub mod stats;

pub use gates::*;
pub use inspection::*;

use crate::buffer::{PacketBuffer, ProtocolFilter};
use crate::classifier::classify_static;
use crate::config::Config;
use crate::dos::{DosSettings, DosSimulator, DosSnapshot, TickReport};
use crate::error::RuleError;
use crate::generator::{GeneratorSettings, TrafficGenerator};
use crate::logger::Logger;
use crate::models::{Packet, Rule, RuleKind, ThreatLogEntry, TrafficMode};
use crate::oracle::VerdictOracle;
use crate::random::SharedRandom;
use crate::rules::RuleStore;
use crate::threat_log::{ThreatLog, ThreatStats};
use dashmap::DashSet;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct SentinelService {
    config: Arc<RwLock<Config>>,
    logger: Arc<Logger>,
    rules: Arc<RuleStore>,
    buffer: Arc<RwLock<PacketBuffer>>,
    threat_log: Arc<ThreatLog>,
    oracle: Arc<dyn VerdictOracle>,
    /// Paquets dont l'inspection profonde est en cours
    in_flight: DashSet<String>,
    generator: Arc<TrafficGenerator>,
    dos: Arc<DosSimulator>,
}

impl SentinelService {
    /// Crée le service avec le journal texte décrit par la configuration
    pub async fn new(
        config: Arc<RwLock<Config>>,
        oracle: Arc<dyn VerdictOracle>,
        random: SharedRandom,
    ) -> Self {
        let logger = {
            let config_guard = config.read().await;
            Arc::new(Logger::new_with_mode(
                config_guard.log_file.clone(),
                config_guard.log_mode,
            ))
        };
        Self::with_logger(config, oracle, random, logger).await
    }

    pub async fn with_logger(
        config: Arc<RwLock<Config>>,
        oracle: Arc<dyn VerdictOracle>,
        random: SharedRandom,
        logger: Arc<Logger>,
    ) -> Self {
        let (generator_settings, dos_settings, capacity, seeds) = {
            let config_guard = config.read().await;
            (
                GeneratorSettings::from(&*config_guard),
                DosSettings::from(&*config_guard),
                config_guard.packet_buffer_capacity,
                config_guard.default_rules.clone(),
            )
        };

        let rules = Arc::new(RuleStore::with_seeds(&seeds));
        let buffer = Arc::new(RwLock::new(PacketBuffer::new(capacity)));
        let threat_log = Arc::new(ThreatLog::with_logger(logger.clone()));

        let generator = Arc::new(TrafficGenerator::new(
            generator_settings,
            rules.clone(),
            buffer.clone(),
            threat_log.clone(),
            oracle.clone(),
            random.clone(),
            logger.clone(),
        ));
        let dos = Arc::new(DosSimulator::new(
            dos_settings,
            threat_log.clone(),
            oracle.clone(),
            random,
            logger.clone(),
        ));

        info!("Service initialisé avec {} règles", rules.len().await);

        Self {
            config,
            logger,
            rules,
            buffer,
            threat_log,
            oracle,
            in_flight: DashSet::new(),
            generator,
            dos,
        }
    }

    pub fn config(&self) -> Arc<RwLock<Config>> {
        self.config.clone()
    }

    pub fn threat_log(&self) -> &Arc<ThreatLog> {
        &self.threat_log
    }

    // --- Règles ---

    pub async fn add_rule(&self, kind: RuleKind, value: &str) -> Result<Rule, RuleError> {
        self.rules.add(kind, value).await
    }

    pub async fn toggle_rule(&self, id: &str) -> Option<bool> {
        self.rules.toggle(id).await
    }

    pub async fn remove_rule(&self, id: &str) -> bool {
        self.rules.remove(id).await
    }

    pub async fn rules(&self) -> Vec<Rule> {
        self.rules.snapshot().await
    }

    // --- Paquets ---

    /// Classe statiquement un paquet puis le place dans le tampon
    pub async fn ingest_packet(&self, mut packet: Packet) -> Packet {
        let rules = self.rules.snapshot().await;
        if let Some(entry) = classify_static(&mut packet, &rules) {
            self.logger.log_packet(&packet);
            self.threat_log.append(entry).await;
        }

        for evicted in self.buffer.write().await.push(packet.clone()) {
            debug!("Paquet {} évincé du tampon", evicted.id);
        }
        packet
    }

    /// Génère immédiatement un paquet synthétique, hors minuteur
    pub async fn generate_packet(&self) -> Option<Packet> {
        self.generator.generate_once().await
    }

    pub async fn packets(&self, filter: ProtocolFilter) -> Vec<Packet> {
        self.buffer.read().await.filter_by_protocol(filter)
    }

    pub async fn packet(&self, id: &str) -> Option<Packet> {
        self.buffer.read().await.select(id)
    }

    // --- Surveillance ---

    pub async fn start_monitoring(&self) -> bool {
        self.generator.start().await
    }

    pub async fn stop_monitoring(&self) -> bool {
        self.generator.stop().await
    }

    pub async fn is_monitoring(&self) -> bool {
        self.generator.is_running().await
    }

    // --- Simulateur DoS ---

    pub async fn start_dos_simulation(&self) -> bool {
        self.dos.start().await
    }

    pub async fn stop_dos_simulation(&self) -> bool {
        self.dos.stop().await
    }

    pub async fn set_traffic_mode(&self, mode: TrafficMode) {
        self.dos.set_mode(mode).await;
    }

    pub async fn set_mitigation(&self, enabled: bool) {
        self.dos.set_mitigation(enabled).await;
    }

    pub async fn toggle_mitigation(&self) -> bool {
        self.dos.toggle_mitigation().await
    }

    /// Tick manuel du simulateur DoS
    pub async fn dos_tick(&self) -> Option<TickReport> {
        self.dos.tick().await
    }

    pub async fn dos_snapshot(&self) -> DosSnapshot {
        self.dos.snapshot().await
    }

    /// Analyse manuelle du trafic courant
    pub async fn analyze_traffic(&self) -> ThreatLogEntry {
        self.dos.manual_analysis().await
    }

    // --- Journal des menaces ---

    pub async fn logs(&self, limit: Option<usize>) -> Vec<ThreatLogEntry> {
        match limit {
            Some(count) => self.threat_log.recent(count).await,
            None => self.threat_log.entries().await,
        }
    }

    pub async fn threat_stats(&self) -> ThreatStats {
        self.threat_log.stats().await
    }

    /// Arrête toutes les tâches périodiques
    pub async fn shutdown(&self) {
        self.generator.stop().await;
        self.dos.stop().await;
        info!("Service arrêté");
    }
}
