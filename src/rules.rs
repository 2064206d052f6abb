//! Magasin de règles de pare-feu
//!
//! Toutes les opérations passent par un unique verrou: un instantané n'observe
//! jamais un ensemble de règles partiellement modifié.

use crate::config::RuleSeed;
use crate::error::RuleError;
use crate::models::{new_id, Rule, RuleKind, RuleValue};
use log::{debug, info, warn};
use std::net::IpAddr;
use tokio::sync::RwLock;

pub struct RuleStore {
    rules: RwLock<Vec<Rule>>,
}

/// Convertit une valeur brute dans le type imposé par le genre de règle
pub fn parse_rule_value(kind: RuleKind, raw: &str) -> Result<RuleValue, RuleError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(RuleError::EmptyValue(kind));
    }

    match kind {
        RuleKind::Port => value
            .parse::<u16>()
            .map(RuleValue::Port)
            .map_err(|_| RuleError::InvalidPort(value.to_string())),
        RuleKind::Ip => value
            .parse::<IpAddr>()
            .map(|_| RuleValue::Text(value.to_string()))
            .map_err(|_| RuleError::InvalidIp(value.to_string())),
        // Le mot-clé est conservé tel quel, espaces compris
        RuleKind::Keyword => Ok(RuleValue::Text(raw.to_string())),
    }
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
        }
    }

    /// Crée le magasin à partir des règles de la configuration.
    /// Les entrées invalides sont ignorées avec un avertissement.
    pub fn with_seeds(seeds: &[RuleSeed]) -> Self {
        let mut rules = Vec::with_capacity(seeds.len());
        for seed in seeds {
            match parse_rule_value(seed.kind, &seed.value) {
                Ok(value) => rules.push(Rule {
                    id: new_id(),
                    kind: seed.kind,
                    value,
                    active: seed.active,
                }),
                Err(e) => warn!("Règle initiale ignorée ({} {}): {}", seed.kind, seed.value, e),
            }
        }

        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Ajoute une règle active
    pub async fn add(&self, kind: RuleKind, raw_value: &str) -> Result<Rule, RuleError> {
        let value = parse_rule_value(kind, raw_value)?;
        let rule = Rule {
            id: new_id(),
            kind,
            value,
            active: true,
        };

        self.rules.write().await.push(rule.clone());
        info!("Règle ajoutée: {} {}", rule.kind, rule.value);
        Ok(rule)
    }

    /// Inverse l'état d'une règle. Renvoie le nouvel état, ou `None` si l'id est inconnu.
    pub async fn toggle(&self, id: &str) -> Option<bool> {
        let mut rules = self.rules.write().await;
        let rule = rules.iter_mut().find(|rule| rule.id == id)?;
        rule.active = !rule.active;
        debug!("Règle {} {}", rule.id, if rule.active { "activée" } else { "désactivée" });
        Some(rule.active)
    }

    /// Supprime une règle. Renvoie `false` si l'id est inconnu.
    pub async fn remove(&self, id: &str) -> bool {
        let mut rules = self.rules.write().await;
        let before = rules.len();
        rules.retain(|rule| rule.id != id);
        let removed = rules.len() != before;
        if removed {
            info!("Règle {} supprimée", id);
        }
        removed
    }

    /// Copie cohérente des règles, dans l'ordre d'insertion
    pub async fn snapshot(&self) -> Vec<Rule> {
        self.rules.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rules.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rules.read().await.is_empty()
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}
