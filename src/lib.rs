//! Bibliothèque zsentinel: simulateur d'appliance de défense réseau
//!
//! Les paquets synthétiques traversent un pipeline de classification
//! ordonné (filtre L4 port/IP, proxy L7 par mots-clés, inspection profonde
//! par un oracle de verdict). Un simulateur de trafic DoS/DDoS tourne en
//! parallèle avec mitigation et analyse automatique une fois par session
//! d'attaque. Tous les verdicts alimentent un journal des menaces.

// Modèle et configuration
pub mod config;   // Configuration du système
pub mod error;    // Erreurs typées
pub mod log_mode; // Modes de journalisation
pub mod logger;   // Journal texte des événements
pub mod models;   // Structures de données

// Pipeline de classification
pub mod buffer;     // Tampon borné des paquets
pub mod classifier; // Filtres L4/L7 et application des verdicts
pub mod rules;      // Magasin de règles de pare-feu

// Simulation
pub mod dos;       // Simulateur de trafic DoS/DDoS
pub mod generator; // Générateur de paquets synthétiques
pub mod random;    // Source d'aléa interchangeable

// Verdicts et journal
pub mod oracle;     // Oracle de verdict et moteur local
pub mod threat_log; // Journal des menaces et agrégats

// Surfaces de contrôle
pub mod api;      // API JSON
pub mod cli;      // Interface en ligne de commande
pub mod services; // Service principal

// Re-export des structures principales pour faciliter l'utilisation
pub use config::Config;
pub use log_mode::LogMode;
pub use models::{
    AnalysisResult, AnalysisType, Packet, PacketStatus, Protocol, Rule, RuleKind, RuleValue, Severity,
    ThreatLogEntry, TrafficMode, TrafficSample,
};
pub use oracle::{SignatureOracle, UnavailableOracle, VerdictOracle};
pub use services::{InspectOutcome, SentinelService};
