//! Tirage des métriques de trafic selon le mode

use crate::models::{TrafficMode, TrafficSample};
use crate::random::{draw_range, RandomSource};
use std::time::SystemTime;

/// Bornes semi-ouvertes [bas, haut) d'une métrique
pub type Range = (u64, u64);

/// Profil statistique d'un mode de trafic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficProfile {
    pub rps: Range,
    pub latency_ms: Range,
    pub active_ips: Range,
}

impl TrafficProfile {
    pub fn for_mode(mode: TrafficMode) -> Self {
        match mode {
            TrafficMode::Normal => Self {
                rps: (20, 50),
                latency_ms: (30, 50),
                active_ips: (100, 110),
            },
            // Botnet: beaucoup de sources, latence dégradée
            TrafficMode::HttpFlood => Self {
                rps: (800, 1300),
                latency_ms: (400, 600),
                active_ips: (1000, 1500),
            },
            // Sources souvent usurpées, peu de connexions réelles
            TrafficMode::UdpFlood => Self {
                rps: (2000, 3000),
                latency_ms: (100, 150),
                active_ips: (50, 100),
            },
            // Peu de requêtes, connexions maintenues ouvertes
            TrafficMode::Slowloris => Self {
                rps: (30, 50),
                latency_ms: (5000, 7000),
                active_ips: (200, 250),
            },
        }
    }
}

/// Tire un échantillon brut (avant mitigation), dans l'ordre rps, latence, IPs
pub fn draw_sample(mode: TrafficMode, source: &mut dyn RandomSource) -> TrafficSample {
    let profile = TrafficProfile::for_mode(mode);
    let rps = draw_range(source, profile.rps.0, profile.rps.1);
    let latency_ms = draw_range(source, profile.latency_ms.0, profile.latency_ms.1);
    let active_ips = draw_range(source, profile.active_ips.0, profile.active_ips.1);

    TrafficSample {
        time: SystemTime::now(),
        rps: rps as f64,
        latency_ms: latency_ms as f64,
        active_ips: active_ips as u32,
    }
}

/// Rapport de trafic soumis à l'oracle
pub fn traffic_report(sample: &TrafficSample, mode: TrafficMode) -> String {
    let pattern = if mode == TrafficMode::Normal {
        "Steady baseline"
    } else {
        "Sudden spike detected"
    };
    let distribution = if mode == TrafficMode::UdpFlood {
        "90% UDP"
    } else {
        "95% TCP/HTTP"
    };

    format!(
        "Traffic Analysis Report:\n    - Current RPS: {}\n    - Average Latency: {}ms\n    - Active Source IPs: {}\n    - Traffic Pattern: {}\n    - Protocol Distribution: {}\n\n    Determine the type of attack (if any) and recommend mitigation strategies.",
        sample.rps, sample.latency_ms, sample.active_ips, pattern, distribution
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_samples_stay_in_profile() {
        for mode in [
            TrafficMode::Normal,
            TrafficMode::HttpFlood,
            TrafficMode::UdpFlood,
            TrafficMode::Slowloris,
        ] {
            let profile = TrafficProfile::for_mode(mode);
            for value in [0.0, 0.5, 1.0] {
                let sample = draw_sample(mode, &mut ScriptedRandom::constant(value));
                assert!(sample.rps >= profile.rps.0 as f64 && sample.rps < profile.rps.1 as f64);
                assert!(sample.latency_ms >= profile.latency_ms.0 as f64);
                assert!(sample.latency_ms < profile.latency_ms.1 as f64);
                assert!(u64::from(sample.active_ips) >= profile.active_ips.0);
                assert!(u64::from(sample.active_ips) < profile.active_ips.1);
            }
        }
    }

    #[test]
    fn test_report_wording() {
        let sample = TrafficSample {
            time: SystemTime::now(),
            rps: 2500.0,
            latency_ms: 120.0,
            active_ips: 75,
        };
        let report = traffic_report(&sample, TrafficMode::UdpFlood);
        assert!(report.contains("- Current RPS: 2500\n"));
        assert!(report.contains("- Average Latency: 120ms"));
        assert!(report.contains("Sudden spike detected"));
        assert!(report.contains("90% UDP"));

        let report = traffic_report(&sample, TrafficMode::Normal);
        assert!(report.contains("Steady baseline"));
        assert!(report.contains("95% TCP/HTTP"));
    }
}
