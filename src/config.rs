use crate::log_mode::LogMode;
use crate::models::RuleKind;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "/etc/zsentinel/config.json";

/// Règle chargée au démarrage du magasin de règles
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RuleSeed {
    pub kind: RuleKind,
    pub value: String,
    pub active: bool,
}

impl RuleSeed {
    pub fn new(kind: RuleKind, value: &str, active: bool) -> Self {
        Self {
            kind,
            value: value.to_string(),
            active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Version actuelle du logiciel
    pub version: String,

    /// Chemin vers le journal texte des verdicts
    pub log_file: String,

    /// Niveau de log
    pub log_level: String,

    /// Mode de journalisation (fichier ou systemd-journal)
    pub log_mode: LogMode,

    /// Cadence du générateur de trafic (ms)
    pub generator_interval_ms: u64,

    /// Cadence du simulateur DoS (ms)
    pub dos_tick_interval_ms: u64,

    /// Nombre maximal de paquets conservés dans le tampon
    pub packet_buffer_capacity: usize,

    /// Taille de la fenêtre glissante d'échantillons de trafic
    pub traffic_window_size: usize,

    /// Préfixe /24 des IPs sources synthétiques
    pub source_subnet: String,

    /// Préfixe /24 des IPs de destination synthétiques
    pub dest_subnet: String,

    /// Borne supérieure (exclue) des ports générés
    pub max_generated_port: u16,

    /// Charge utile de repli si l'oracle ne peut pas en synthétiser
    pub fallback_payload: String,

    /// Seuil de requêtes/s déclenchant l'analyse automatique
    pub ddos_rps_threshold: f64,

    /// Seuil de latence (ms) déclenchant l'analyse d'un Slowloris
    pub slowloris_latency_threshold: f64,

    /// Règles chargées au démarrage
    pub default_rules: Vec<RuleSeed>,

    /// Adresse d'écoute de l'API de contrôle
    pub api_bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: env!("CARGO_PKG_VERSION").to_string(),
            log_file: "/var/log/zsentinel/zsentinel.log".to_string(),
            log_level: "info".to_string(),
            log_mode: LogMode::File,
            generator_interval_ms: 1500,
            dos_tick_interval_ms: 1000,
            packet_buffer_capacity: 50,
            traffic_window_size: 20,
            source_subnet: "192.168.1".to_string(),
            dest_subnet: "10.0.0".to_string(),
            max_generated_port: 10000,
            fallback_payload: "GET / HTTP/1.1".to_string(),
            ddos_rps_threshold: 500.0,
            slowloris_latency_threshold: 1000.0,
            default_rules: vec![
                RuleSeed::new(RuleKind::Port, "8080", true),
                RuleSeed::new(RuleKind::Keyword, "cmd.exe", true),
                RuleSeed::new(RuleKind::Ip, "192.168.1.100", false),
            ],
            api_bind: "127.0.0.1:8088".to_string(),
        }
    }
}

impl Config {
    /// Charge la configuration depuis le fichier par défaut
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Charge la configuration, en créant le fichier par défaut s'il n'existe pas
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let default_config = Config::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("lecture de {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("configuration invalide dans {}", path.display()))?;

        Ok(config)
    }

    /// Sauvegarde la configuration dans le fichier
    pub fn save_to(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();

        // Créer le répertoire si nécessaire
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let config_json = serde_json::to_string_pretty(self)?;
        fs::write(path, config_json)?;

        Ok(())
    }
}
