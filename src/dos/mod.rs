//! Simulateur de trafic DoS/DDoS
//!
//! Processus numérique piloté par un mode de trafic. À chaque tick un
//! échantillon est tiré, atténué si la mitigation est active, puis ajouté à
//! une fenêtre glissante. Une analyse automatique est déclenchée au plus une
//! fois par session d'attaque.

mod analysis;
mod mitigation;
mod traffic;

pub use analysis::*;
pub use mitigation::*;
pub use traffic::*;

use crate::config::Config;
use crate::logger::Logger;
use crate::models::{TrafficMode, TrafficSample};
use crate::oracle::VerdictOracle;
use crate::random::SharedRandom;
use crate::threat_log::ThreatLog;
use log::{error, info};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Paramètres du simulateur extraits de la configuration
#[derive(Debug, Clone)]
pub struct DosSettings {
    pub tick_interval: Duration,
    pub window_size: usize,
    pub rps_threshold: f64,
    pub latency_threshold: f64,
}

impl From<&Config> for DosSettings {
    fn from(config: &Config) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.dos_tick_interval_ms),
            window_size: config.traffic_window_size,
            rps_threshold: config.ddos_rps_threshold,
            latency_threshold: config.slowloris_latency_threshold,
        }
    }
}

/// État mutable, protégé par un seul verrou
#[derive(Debug, Default)]
pub(crate) struct DosState {
    pub(crate) mode: TrafficMode,
    pub(crate) mitigation: bool,
    pub(crate) window: VecDeque<TrafficSample>,
    pub(crate) latest: Option<TrafficSample>,
    pub(crate) peak_rps: f64,
    pub(crate) dropped: u64,
}

/// Vue figée du simulateur pour la présentation
#[derive(Debug, Clone, Serialize)]
pub struct DosSnapshot {
    pub mode: TrafficMode,
    pub mitigation: bool,
    pub analyzed_this_session: bool,
    pub latest: Option<TrafficSample>,
    pub window: Vec<TrafficSample>,
    pub peak_rps: f64,
    pub dropped: u64,
}

/// Résultat d'un tick
#[derive(Debug)]
pub struct TickReport {
    pub sample: TrafficSample,
    /// Analyse automatique lancée pendant ce tick
    pub analysis: Option<JoinHandle<()>>,
}

pub struct DosSimulator {
    pub(crate) settings: DosSettings,
    pub(crate) state: RwLock<DosState>,
    /// Verrou "déjà analysé pour cette session d'attaque"
    pub(crate) analyzed_this_session: AtomicBool,
    pub(crate) threat_log: Arc<ThreatLog>,
    pub(crate) oracle: Arc<dyn VerdictOracle>,
    pub(crate) random: SharedRandom,
    pub(crate) logger: Arc<Logger>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl DosSimulator {
    pub fn new(
        settings: DosSettings,
        threat_log: Arc<ThreatLog>,
        oracle: Arc<dyn VerdictOracle>,
        random: SharedRandom,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            settings,
            state: RwLock::new(DosState::default()),
            analyzed_this_session: AtomicBool::new(false),
            threat_log,
            oracle,
            random,
            logger,
            timer: Mutex::new(None),
        }
    }

    /// Change de mode. Un changement de mode ouvre une nouvelle session d'attaque.
    pub async fn set_mode(&self, mode: TrafficMode) {
        let mut state = self.state.write().await;
        if state.mode != mode {
            info!("Mode de trafic: {} -> {}", state.mode, mode);
            state.mode = mode;
            self.logger.log_mode_change(mode);
            self.analyzed_this_session.store(false, Ordering::SeqCst);
        }
    }

    pub async fn mode(&self) -> TrafficMode {
        self.state.read().await.mode
    }

    pub fn analyzed_this_session(&self) -> bool {
        self.analyzed_this_session.load(Ordering::SeqCst)
    }

    /// Produit un échantillon, l'atténue si besoin et déclenche l'analyse automatique
    pub async fn tick(&self) -> Option<TickReport> {
        let mut state = self.state.write().await;

        let raw = {
            let mut random = match self.random.lock() {
                Ok(guard) => guard,
                Err(e) => {
                    error!("Source d'aléa inutilisable: {}", e);
                    return None;
                }
            };
            draw_sample(state.mode, &mut **random)
        };

        let (sample, dropped) = apply_mitigation(raw, state.mode, state.mitigation);
        state.dropped += dropped;

        let analysis = self.claim_auto_analysis(&state, &sample).then(|| {
            self.spawn_analysis(traffic_report(&sample, state.mode), state.mitigation)
        });

        if sample.rps > state.peak_rps {
            state.peak_rps = sample.rps;
        }
        state.window.push_back(sample.clone());
        while state.window.len() > self.settings.window_size {
            state.window.pop_front();
        }
        state.latest = Some(sample.clone());

        Some(TickReport { sample, analysis })
    }

    pub async fn snapshot(&self) -> DosSnapshot {
        let state = self.state.read().await;
        DosSnapshot {
            mode: state.mode,
            mitigation: state.mitigation,
            analyzed_this_session: self.analyzed_this_session(),
            latest: state.latest.clone(),
            window: state.window.iter().cloned().collect(),
            peak_rps: state.peak_rps,
            dropped: state.dropped,
        }
    }

    /// Démarre le tick périodique. Sans effet s'il tourne déjà.
    pub async fn start(self: &Arc<Self>) -> bool {
        let mut timer = self.timer.lock().await;
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let simulator = Arc::clone(self);
        let period = self.settings.tick_interval;
        *timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                simulator.tick().await;
            }
        }));

        info!("Simulateur DoS démarré (période {:?})", period);
        true
    }

    pub async fn stop(&self) -> bool {
        match self.timer.lock().await.take() {
            Some(handle) => {
                handle.abort();
                info!("Simulateur DoS arrêté");
                true
            }
            None => false,
        }
    }
}
