//! Inspection profonde à la demande
//!
//! Un paquet en attente n'est soumis qu'une seule fois à l'oracle: le premier
//! appel réserve l'identifiant dans l'ensemble `in_flight`, les suivants
//! reçoivent `InProgress` ou `AlreadyResolved` sans appel supplémentaire.

use crate::classifier::{apply_oracle_verdict, inspection_content};
use crate::models::{AnalysisType, Packet};
use crate::oracle::analyze_fail_open;
use crate::services::SentinelService;
use dashmap::DashSet;
use log::{debug, info};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "packet", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectOutcome {
    /// Identifiant absent du tampon
    NotFound,
    /// Verdict déjà rendu, aucun appel à l'oracle
    AlreadyResolved(Packet),
    /// Une autre inspection est en cours pour ce paquet
    InProgress,
    /// Verdict rendu par cet appel
    Inspected(Packet),
}

impl InspectOutcome {
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            Self::AlreadyResolved(packet) | Self::Inspected(packet) => Some(packet),
            Self::NotFound | Self::InProgress => None,
        }
    }
}

/// Réservation d'un identifiant dans `in_flight`, libérée au drop
///
/// Si l'appelant abandonne l'inspection pendant l'appel à l'oracle, la
/// réservation est tout de même rendue et le paquet reste inspectable.
struct InFlightClaim<'a> {
    in_flight: &'a DashSet<String>,
    id: String,
}

impl<'a> InFlightClaim<'a> {
    fn acquire(in_flight: &'a DashSet<String>, id: &str) -> Option<Self> {
        in_flight.insert(id.to_string()).then(|| Self {
            in_flight,
            id: id.to_string(),
        })
    }
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.id);
    }
}

impl SentinelService {
    pub async fn inspect_packet(&self, id: &str) -> InspectOutcome {
        let Some(packet) = self.buffer.read().await.select(id) else {
            return InspectOutcome::NotFound;
        };
        if packet.status.is_terminal() {
            return InspectOutcome::AlreadyResolved(packet);
        }

        let Some(claim) = InFlightClaim::acquire(&self.in_flight, id) else {
            debug!("Inspection du paquet {} déjà en cours", id);
            return InspectOutcome::InProgress;
        };

        // Une inspection concurrente a pu se terminer entre la lecture et la réservation
        if let Some(current) = self.buffer.read().await.select(id) {
            if current.status.is_terminal() {
                return InspectOutcome::AlreadyResolved(current);
            }
        }

        let content = inspection_content(&packet);
        let result = analyze_fail_open(self.oracle.as_ref(), &content, AnalysisType::PacketInspection).await;

        let (resolved, entry) = {
            let mut buffer = self.buffer.write().await;
            match buffer.get_mut(id) {
                Some(stored) => {
                    let entry = apply_oracle_verdict(stored, &result);
                    (stored.clone(), entry)
                }
                None => {
                    // Évincé pendant l'analyse: le verdict reste journalisé
                    let mut detached = packet;
                    let entry = apply_oracle_verdict(&mut detached, &result);
                    (detached, entry)
                }
            }
        };
        drop(claim);

        info!("Paquet {} inspecté: {}", resolved.id, resolved.status);
        self.logger.log_packet(&resolved);
        if let Some(entry) = entry {
            self.threat_log.append(entry).await;
        }

        InspectOutcome::Inspected(resolved)
    }
}
