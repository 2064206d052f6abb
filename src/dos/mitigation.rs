//! Mitigation: filtrage de 90% du trafic d'attaque

use super::{DosSimulator, DosState};
use crate::models::{TrafficMode, TrafficSample};
use log::warn;

/// Part du trafic qui traverse le filtre
pub const RPS_PASS_FACTOR: f64 = 0.1;
pub const LATENCY_FACTOR: f64 = 0.2;
/// Requêtes écartées pour chaque requête qui passe
pub const DROPPED_PER_PASSED: f64 = 9.0;

/// Atténue un échantillon brut. Renvoie l'échantillon effectif et le nombre
/// de requêtes écartées. Sans effet en mode normal ou mitigation inactive.
pub fn apply_mitigation(raw: TrafficSample, mode: TrafficMode, mitigation: bool) -> (TrafficSample, u64) {
    if !mitigation || !mode.is_attack() {
        return (raw, 0);
    }

    let rps = raw.rps * RPS_PASS_FACTOR;
    let latency_ms = raw.latency_ms * LATENCY_FACTOR;
    let dropped = (rps * DROPPED_PER_PASSED).floor() as u64;

    (
        TrafficSample {
            rps,
            latency_ms,
            ..raw
        },
        dropped,
    )
}

impl DosSimulator {
    /// Active ou désactive la mitigation. Le verrou d'analyse automatique
    /// n'est pas réarmé: seul un changement de mode ouvre une nouvelle session.
    pub async fn set_mitigation(&self, enabled: bool) {
        let mut state = self.state.write().await;
        self.switch_mitigation(&mut state, enabled);
    }

    /// Inverse l'état de la mitigation et renvoie le nouvel état
    pub async fn toggle_mitigation(&self) -> bool {
        let mut state = self.state.write().await;
        let enabled = !state.mitigation;
        self.switch_mitigation(&mut state, enabled);
        enabled
    }

    fn switch_mitigation(&self, state: &mut DosState, enabled: bool) {
        if state.mitigation == enabled {
            return;
        }
        state.mitigation = enabled;
        if enabled {
            warn!("Mitigation DDoS activée: 90% du trafic d'attaque filtré");
        } else {
            warn!("Mitigation DDoS désactivée");
        }
        self.logger.log_mitigation(enabled);
    }

    pub async fn mitigation(&self) -> bool {
        self.state.read().await.mitigation
    }

    /// Total cumulé des requêtes écartées
    pub async fn dropped(&self) -> u64 {
        self.state.read().await.dropped
    }
}
