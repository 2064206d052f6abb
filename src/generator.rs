//! Générateur de trafic synthétique
//!
//! Tant que la surveillance est active, produit un paquet à intervalle fixe,
//! lui applique les filtres statiques puis le place en tête du tampon.
//! L'inspection profonde n'est jamais déclenchée ici.

use crate::buffer::PacketBuffer;
use crate::classifier::classify_static;
use crate::config::Config;
use crate::logger::Logger;
use crate::models::{Packet, Protocol};
use crate::oracle::{synthesize_or_fallback, VerdictOracle};
use crate::random::{draw_index, draw_range, SharedRandom};
use crate::rules::RuleStore;
use crate::threat_log::ThreatLog;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::{JoinHandle, JoinSet};

/// Paramètres de génération extraits de la configuration
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub interval: Duration,
    pub source_subnet: String,
    pub dest_subnet: String,
    pub max_port: u16,
    pub fallback_payload: String,
}

impl From<&Config> for GeneratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: Duration::from_millis(config.generator_interval_ms),
            source_subnet: config.source_subnet.clone(),
            dest_subnet: config.dest_subnet.clone(),
            max_port: config.max_generated_port,
            fallback_payload: config.fallback_payload.clone(),
        }
    }
}

pub struct TrafficGenerator {
    settings: GeneratorSettings,
    rules: Arc<RuleStore>,
    buffer: Arc<RwLock<PacketBuffer>>,
    threat_log: Arc<ThreatLog>,
    oracle: Arc<dyn VerdictOracle>,
    random: SharedRandom,
    logger: Arc<Logger>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl TrafficGenerator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: GeneratorSettings,
        rules: Arc<RuleStore>,
        buffer: Arc<RwLock<PacketBuffer>>,
        threat_log: Arc<ThreatLog>,
        oracle: Arc<dyn VerdictOracle>,
        random: SharedRandom,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            settings,
            rules,
            buffer,
            threat_log,
            oracle,
            random,
            logger,
            timer: Mutex::new(None),
        }
    }

    /// Tire l'en-tête d'un paquet (protocole, port, adresses)
    fn draw_header(&self) -> Option<(Protocol, u16, String, String)> {
        let mut random = match self.random.lock() {
            Ok(guard) => guard,
            Err(e) => {
                error!("Source d'aléa inutilisable: {}", e);
                return None;
            }
        };
        let source = &mut **random;

        let protocol = Protocol::ALL[draw_index(source, Protocol::ALL.len())];
        let port = draw_range(source, 0, u64::from(self.settings.max_port)) as u16;
        let source_ip = format!("{}.{}", self.settings.source_subnet, draw_range(source, 0, 255));
        let dest_ip = format!("{}.{}", self.settings.dest_subnet, draw_range(source, 0, 50));

        Some((protocol, port, source_ip, dest_ip))
    }

    /// Produit un paquet, le classe statiquement et l'ajoute au tampon
    pub async fn generate_once(&self) -> Option<Packet> {
        let (protocol, port, source_ip, dest_ip) = self.draw_header()?;
        let payload = synthesize_or_fallback(self.oracle.as_ref(), &self.settings.fallback_payload).await;

        let mut packet = Packet::new(source_ip, dest_ip, protocol, port, payload);
        let rules = self.rules.snapshot().await;
        if let Some(entry) = classify_static(&mut packet, &rules) {
            self.logger.log_packet(&packet);
            self.threat_log.append(entry).await;
        }

        let evicted = self.buffer.write().await.push(packet.clone());
        for old in evicted {
            debug!("Paquet {} évincé du tampon", old.id);
        }

        Some(packet)
    }

    /// Démarre la surveillance. Sans effet si elle tourne déjà.
    pub async fn start(self: &Arc<Self>) -> bool {
        let mut timer = self.timer.lock().await;
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            info!("La surveillance est déjà active");
            return false;
        }

        let generator = Arc::clone(self);
        let period = self.settings.interval;
        *timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // Générations en cours, annulées avec le minuteur
            let mut ticks = JoinSet::new();
            // Le premier tick est immédiat
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let generator = Arc::clone(&generator);
                        ticks.spawn(async move {
                            generator.generate_once().await;
                        });
                    }
                    Some(_) = ticks.join_next() => {}
                }
            }
        }));

        info!("Surveillance du trafic démarrée (période {:?})", period);
        true
    }

    /// Arrête le minuteur et les générations en cours; les inspections continuent
    pub async fn stop(&self) -> bool {
        match self.timer.lock().await.take() {
            Some(handle) => {
                handle.abort();
                info!("Surveillance du trafic arrêtée");
                true
            }
            None => false,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, AnalysisType, PacketStatus, RuleKind};
    use crate::oracle::{SignatureOracle, UnavailableOracle};
    use crate::random::{shared, ScriptedRandom};

    fn generator(oracle: Arc<dyn VerdictOracle>, rules: Arc<RuleStore>, random: f64) -> TrafficGenerator {
        let config = Config::default();
        TrafficGenerator::new(
            GeneratorSettings::from(&config),
            rules,
            Arc::new(RwLock::new(PacketBuffer::new(config.packet_buffer_capacity))),
            Arc::new(ThreatLog::new()),
            oracle,
            shared(ScriptedRandom::constant(random)),
            Arc::new(Logger::disabled()),
        )
    }

    #[tokio::test]
    async fn test_generated_packet_ranges() {
        let generator = generator(Arc::new(UnavailableOracle), Arc::new(RuleStore::new()), 0.999);
        let packet = generator.generate_once().await.unwrap();

        assert_eq!(packet.protocol, Protocol::Http);
        assert_eq!(packet.port, 9990);
        assert_eq!(packet.source_ip, "192.168.1.254");
        assert_eq!(packet.dest_ip, "10.0.0.49");
        assert_eq!(packet.payload, "GET / HTTP/1.1");
        assert_eq!(packet.status, PacketStatus::Pending);
        assert_eq!(generator.buffer.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_static_block_before_push() {
        let rules = Arc::new(RuleStore::new());
        rules.add(RuleKind::Ip, "192.168.1.0").await.unwrap();
        let generator = generator(
            Arc::new(SignatureOracle::with_random(shared(ScriptedRandom::constant(0.0)))),
            rules,
            0.0,
        );

        let packet = generator.generate_once().await.unwrap();
        assert_eq!(packet.status, PacketStatus::BlockedL4);
        assert_eq!(packet.risk_score, Some(100));

        let stored = generator.buffer.read().await.select(&packet.id).unwrap();
        assert_eq!(stored.status, PacketStatus::BlockedL4);
        assert_eq!(generator.threat_log.len().await, 1);
    }

    /// Oracle dont la synthèse de charge utile ne répond qu'après un long délai
    struct SlowPayloadOracle;

    #[async_trait::async_trait]
    impl VerdictOracle for SlowPayloadOracle {
        async fn analyze(&self, _content: &str, _analysis_type: AnalysisType) -> anyhow::Result<AnalysisResult> {
            Err(anyhow::anyhow!("non utilisé"))
        }

        async fn synthesize_packet_payload(&self) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("GET /slow HTTP/1.1".to_string())
        }
    }

    #[tokio::test]
    async fn test_stop_cancels_pending_generation() {
        let config = Config {
            generator_interval_ms: 10,
            ..Config::default()
        };
        let generator = Arc::new(TrafficGenerator::new(
            GeneratorSettings::from(&config),
            Arc::new(RuleStore::new()),
            Arc::new(RwLock::new(PacketBuffer::new(config.packet_buffer_capacity))),
            Arc::new(ThreatLog::new()),
            Arc::new(SlowPayloadOracle),
            shared(ScriptedRandom::constant(0.5)),
            Arc::new(Logger::disabled()),
        ));

        assert!(generator.start().await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(generator.stop().await);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(generator.buffer.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_start_stop() {
        let generator = Arc::new(generator(Arc::new(UnavailableOracle), Arc::new(RuleStore::new()), 0.5));
        assert!(generator.start().await);
        assert!(!generator.start().await);
        assert!(generator.is_running().await);
        assert!(generator.stop().await);
        assert!(!generator.is_running().await);
        assert!(!generator.stop().await);
    }
}
