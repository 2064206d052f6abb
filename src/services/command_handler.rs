use crate::buffer::ProtocolFilter;
use crate::models::{AnalysisType, Packet, ThreatLogEntry};
use crate::services::{InspectOutcome, SentinelService};
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local};

const HELP: &str = "\
Commandes disponibles:
  stats                              tableau de bord
  rules                              liste des règles
  rule add <port|ip|keyword> <val>   ajoute une règle active
  rule toggle <id>                   active/désactive une règle
  rule remove <id>                   supprime une règle
  generate                           génère un paquet synthétique
  packets [ALL|TCP|UDP|ICMP|HTTP]    paquets en mémoire
  packet <id>                        détail d'un paquet
  inspect <id>                       inspection profonde d'un paquet
  monitor start|stop                 surveillance du trafic
  dos status                         état du simulateur DoS
  dos mode <mode>                    NORMAL, HTTP_FLOOD, UDP_FLOOD, SLOWLORIS
  dos mitigation on|off|toggle       filtrage du trafic d'attaque
  dos tick                           tick manuel
  dos analyze                        analyse manuelle du trafic
  logs [n]                           journal des menaces
  analyze <sql|phishing|malware> <contenu>
  help";

fn format_packet(packet: &Packet) -> String {
    format!(
        "{} {} -> {}:{} {} [{}] risque={} {}",
        packet.id,
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
    )
}

fn format_entry(entry: &ThreatLogEntry) -> String {
    let timestamp: DateTime<Local> = entry.timestamp.into();
    format!(
        "{} [{}] [{}] {} - {} ({})",
        timestamp.format("%H:%M:%S"),
        entry.analysis_type,
        entry.severity,
        entry.source,
        entry.details,
        if entry.blocked { "BLOCKED" } else { "ALERT" }
    )
}

impl SentinelService {
    /// Exécute une commande texte du shell interactif
    pub async fn handle_command(&self, command: &str) -> anyhow::Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();

        match parts.as_slice() {
            [] => Ok(String::new()),
            ["help"] => Ok(HELP.to_string()),
            ["stats"] | ["dashboard"] => Ok(self.dashboard_report().await),

            ["rules"] => {
                let rules = self.rules().await;
                if rules.is_empty() {
                    return Ok("Aucune règle".to_string());
                }
                Ok(rules
                    .iter()
                    .map(|rule| {
                        format!(
                            "{} {:<10} {:<16} {}",
                            rule.id,
                            rule.kind,
                            rule.value,
                            if rule.active { "active" } else { "inactive" }
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            ["rule", "add", kind, value @ ..] if !value.is_empty() => {
                let kind = kind.parse()?;
                let rule = self.add_rule(kind, &value.join(" ")).await?;
                Ok(format!("Règle {} ajoutée: {} {}", rule.id, rule.kind, rule.value))
            }
            ["rule", "toggle", id] => match self.toggle_rule(id).await {
                Some(true) => Ok(format!("Règle {} activée", id)),
                Some(false) => Ok(format!("Règle {} désactivée", id)),
                None => bail!("Règle inconnue: {}", id),
            },
            ["rule", "remove", id] => {
                if self.remove_rule(id).await {
                    Ok(format!("Règle {} supprimée", id))
                } else {
                    bail!("Règle inconnue: {}", id)
                }
            }

            ["generate"] => {
                let packet = self
                    .generate_packet()
                    .await
                    .ok_or_else(|| anyhow!("génération impossible"))?;
                Ok(format_packet(&packet))
            }
            ["packets"] | ["packets", _] => {
                let filter: ProtocolFilter = match parts.get(1) {
                    Some(raw) => raw.parse()?,
                    None => ProtocolFilter::All,
                };
                let packets = self.packets(filter).await;
                if packets.is_empty() {
                    return Ok("Aucun paquet".to_string());
                }
                Ok(packets.iter().map(format_packet).collect::<Vec<_>>().join("\n"))
            }
            ["packet", id] => self
                .packet(id)
                .await
                .map(|packet| format_packet(&packet))
                .ok_or_else(|| anyhow!("Paquet inconnu: {}", id)),
            ["inspect", id] => match self.inspect_packet(id).await {
                InspectOutcome::NotFound => bail!("Paquet inconnu: {}", id),
                InspectOutcome::InProgress => Ok(format!("Inspection du paquet {} déjà en cours", id)),
                InspectOutcome::AlreadyResolved(packet) => {
                    Ok(format!("Déjà inspecté: {}", format_packet(&packet)))
                }
                InspectOutcome::Inspected(packet) => Ok(format_packet(&packet)),
            },

            ["monitor", "start"] => Ok(if self.start_monitoring().await {
                "Surveillance démarrée".to_string()
            } else {
                "La surveillance est déjà active".to_string()
            }),
            ["monitor", "stop"] => Ok(if self.stop_monitoring().await {
                "Surveillance arrêtée".to_string()
            } else {
                "La surveillance n'était pas active".to_string()
            }),

            ["dos", "status"] => {
                let snapshot = self.dos_snapshot().await;
                Ok(format!(
                    "Mode: {} | Mitigation: {} | Requêtes/s: {:.1} | Pic: {:.1} | Écartées: {} | Analysé: {}",
                    snapshot.mode,
                    if snapshot.mitigation { "on" } else { "off" },
                    snapshot.latest.as_ref().map(|sample| sample.rps).unwrap_or(0.0),
                    snapshot.peak_rps,
                    snapshot.dropped,
                    if snapshot.analyzed_this_session { "oui" } else { "non" }
                ))
            }
            ["dos", "mode", mode] => {
                let mode = mode.parse()?;
                self.set_traffic_mode(mode).await;
                Ok(format!("Mode de trafic: {}", mode))
            }
            ["dos", "mitigation", state] => {
                let enabled = match *state {
                    "on" => {
                        self.set_mitigation(true).await;
                        true
                    }
                    "off" => {
                        self.set_mitigation(false).await;
                        false
                    }
                    "toggle" => self.toggle_mitigation().await,
                    other => bail!("État de mitigation invalide: {}", other),
                };
                Ok(format!("Mitigation {}", if enabled { "activée" } else { "désactivée" }))
            }
            ["dos", "tick"] => {
                let report = self
                    .dos_tick()
                    .await
                    .ok_or_else(|| anyhow!("tick impossible"))?;
                if let Some(handle) = report.analysis {
                    handle.await.context("analyse automatique interrompue")?;
                }
                Ok(format!(
                    "rps={:.1} latence={:.1}ms ips={}",
                    report.sample.rps, report.sample.latency_ms, report.sample.active_ips
                ))
            }
            ["dos", "analyze"] => Ok(format_entry(&self.analyze_traffic().await)),

            ["logs"] | ["logs", _] => {
                let limit = match parts.get(1) {
                    Some(raw) => Some(raw.parse::<usize>().context("nombre d'entrées invalide")?),
                    None => None,
                };
                let entries = self.logs(limit).await;
                if entries.is_empty() {
                    return Ok("Journal vide".to_string());
                }
                Ok(entries.iter().map(format_entry).collect::<Vec<_>>().join("\n"))
            }

            ["analyze", kind, content @ ..] if !content.is_empty() => {
                let analysis_type = match kind.to_lowercase().as_str() {
                    "sql" => AnalysisType::SqlInjection,
                    "phishing" => AnalysisType::Phishing,
                    "malware" => AnalysisType::Malware,
                    other => other.parse()?,
                };
                let result = self.analyze_content(analysis_type, &content.join(" ")).await?;
                Ok(format!(
                    "{} | menace: {} | {}\nAction: {}",
                    result.severity,
                    if result.is_threat { "oui" } else { "non" },
                    result.reasoning,
                    result.suggested_action
                ))
            }

            _ => bail!("Commande inconnue: {} (tapez 'help')", command.trim()),
        }
    }
}
