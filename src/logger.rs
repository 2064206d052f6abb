use crate::log_mode::LogMode;
use crate::models::{Packet, Severity, ThreatLogEntry, TrafficMode};
use chrono::{DateTime, Local};
use log::{error, info, warn};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;

/// Journal texte des verdicts, des menaces et des changements d'état
pub struct Logger {
    log_file: Mutex<Option<File>>,
    log_path: String,
    log_mode: LogMode,
}

fn format_time(time: SystemTime) -> String {
    let timestamp: DateTime<Local> = time.into();
    timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

impl Logger {
    pub fn new(log_path: String) -> Self {
        Self::new_with_mode(log_path, LogMode::File)
    }

    /// Logger sans fichier: tout passe par la façade `log`
    pub fn disabled() -> Self {
        Self {
            log_file: Mutex::new(None),
            log_path: String::new(),
            log_mode: LogMode::SystemdJournal,
        }
    }

    pub fn new_with_mode(log_path: String, log_mode: LogMode) -> Self {
        let file = if log_mode.writes_file() {
            Self::open(&log_path)
        } else {
            None
        };

        Self {
            log_file: Mutex::new(file),
            log_path,
            log_mode,
        }
    }

    fn open(log_path: &str) -> Option<File> {
        if let Some(parent) = Path::new(log_path).parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!("Erreur lors de la création du répertoire de logs: {}", e);
            }
        }

        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => Some(file),
            Err(e) => {
                error!("Erreur lors de l'ouverture du fichier de log {}: {}", log_path, e);
                None
            }
        }
    }

    /// Verdict final (ou statique) d'un paquet
    pub fn log_packet(&self, packet: &Packet) {
        let log_entry = format!(
            "[{}] [PACKET] {} -> {}:{} | Protocol: {} | Status: {} | Risk: {} | {}",
            format_time(packet.created_at),
            packet.source_ip,
            packet.dest_ip,
            packet.port,
            packet.protocol,
            packet.status,
            packet
                .risk_score
                .map(|score| score.to_string())
                .unwrap_or_else(|| "-".to_string()),
            packet.verdict_reason.as_deref().unwrap_or("")
        );

        match self.log_mode {
            LogMode::File => self.write_to_log(&log_entry),
            LogMode::SystemdJournal => info!("{}", log_entry),
        }
    }

    pub fn log_threat(&self, entry: &ThreatLogEntry) {
        let log_entry = format!(
            "[{}] [{}] [{}] [{}] {} (blocked={})",
            format_time(entry.timestamp),
            entry.analysis_type,
            entry.severity,
            entry.source,
            entry.details,
            entry.blocked
        );

        match self.log_mode {
            LogMode::File => self.write_to_log(&log_entry),
            LogMode::SystemdJournal => match entry.severity {
                Severity::Safe | Severity::Low => info!("{}", log_entry),
                Severity::Medium => warn!("{}", log_entry),
                Severity::High | Severity::Critical => error!("{}", log_entry),
            },
        }
    }

    pub fn log_mode_change(&self, mode: TrafficMode) {
        let log_entry = format!("[{}] [DOS] Mode de trafic: {}", format_time(SystemTime::now()), mode);

        match self.log_mode {
            LogMode::File => self.write_to_log(&log_entry),
            LogMode::SystemdJournal => info!("{}", log_entry),
        }
    }

    pub fn log_mitigation(&self, enabled: bool) {
        let status = if enabled { "activée" } else { "désactivée" };
        let log_entry = format!("[{}] [MITIGATION] Mitigation {}", format_time(SystemTime::now()), status);

        match self.log_mode {
            LogMode::File => self.write_to_log(&log_entry),
            LogMode::SystemdJournal => warn!("{}", log_entry),
        }
    }

    fn write_to_log(&self, message: &str) {
        let mut log_file_guard = match self.log_file.lock() {
            Ok(guard) => guard,
            Err(e) => {
                error!("Erreur lors de l'acquisition du verrou pour le fichier de log: {}", e);
                return;
            }
        };

        if let Some(file) = log_file_guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", message) {
                error!("Erreur lors de l'écriture dans le fichier de log: {}", e);

                // Essayer de réouvrir le fichier
                *log_file_guard = Self::open(&self.log_path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisType, Protocol};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_journal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("zsentinel.log");
        let logger = Logger::new(path.to_string_lossy().to_string());

        let packet = Packet::new("192.168.1.7", "10.0.0.3", Protocol::Tcp, 22, "SSH-2.0");
        logger.log_packet(&packet);
        logger.log_threat(&ThreatLogEntry::new(
            AnalysisType::PacketInspection,
            Severity::Medium,
            "Packet Filter (L4)",
            "Port 22 is blacklisted via Packet Filter.",
            true,
        ));
        logger.log_mitigation(true);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Status: ANALYZING"));
        assert!(lines[1].contains("[PACKET_INSPECTION] [MEDIUM] [Packet Filter (L4)]"));
        assert!(lines[2].contains("Mitigation activée"));
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let logger = Logger::disabled();
        logger.log_mode_change(TrafficMode::UdpFlood);
        assert!(logger.log_file.lock().unwrap().is_none());
    }
}
