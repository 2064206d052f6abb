//! Erreurs typées aux frontières de la bibliothèque

use crate::models::RuleKind;
use thiserror::Error;

/// Rejet d'une règle à l'entrée du magasin de règles
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("valeur vide pour une règle {0}")]
    EmptyValue(RuleKind),
    #[error("port invalide: {0}")]
    InvalidPort(String),
    #[error("adresse IP invalide: {0}")]
    InvalidIp(String),
}

/// Rejet d'une demande d'analyse de contenu
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("contenu vide, analyse ignorée")]
    EmptyContent,
    #[error("le type d'analyse {0} n'est pas une passerelle de contenu")]
    UnsupportedGate(crate::models::AnalysisType),
}

/// Erreur de lecture d'une énumération depuis du texte
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("protocole inconnu: {0}")]
    UnknownProtocol(String),
    #[error("type de règle inconnu: {0}")]
    UnknownRuleKind(String),
    #[error("type d'analyse inconnu: {0}")]
    UnknownAnalysisType(String),
    #[error("mode de trafic inconnu: {0}")]
    UnknownTrafficMode(String),
}
