use crate::models::{AnalysisType, TrafficMode};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// zsentinel: simulateur de pare-feu nouvelle génération et de protection DDoS.
///
/// Les paquets synthétiques traversent un filtre L4 (port/IP), un proxy L7
/// (mots-clés) puis, à la demande, une inspection profonde. Un simulateur de
/// trafic DoS tourne en parallèle avec mitigation et analyse automatique.
#[derive(Parser, Debug)]
#[command(name = "zsentinel", version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration JSON (créé avec les valeurs par défaut s'il est absent)
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Moteur de verdict utilisé pour l'inspection profonde
    #[arg(long = "oracle", value_enum, default_value_t = OracleChoice::Signature, global = true)]
    pub oracle: OracleChoice,

    /// Graine de l'aléa, pour des simulations reproductibles
    #[arg(long = "seed", value_name = "N", global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleChoice {
    /// Signatures locales, fonctionne hors ligne
    Signature,
    /// Oracle injoignable: toutes les analyses échouent en mode fail-open
    Unavailable,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lance une simulation limitée dans le temps puis affiche le tableau de bord
    Simulate {
        /// Durée de la simulation en secondes
        #[arg(short = 'd', long = "duration", value_name = "SECS", default_value_t = 30)]
        duration: u64,

        /// Mode de trafic DoS (NORMAL, HTTP_FLOOD, UDP_FLOOD, SLOWLORIS)
        #[arg(short = 'm', long = "mode", default_value = "NORMAL")]
        mode: TrafficMode,

        /// Active la mitigation dès le départ
        #[arg(long = "mitigation")]
        mitigation: bool,

        /// Inspecte automatiquement les paquets en attente à chaque seconde
        #[arg(long = "inspect")]
        inspect: bool,
    },

    /// Démarre l'API JSON de contrôle
    Serve {
        /// Adresse d'écoute (remplace `api_bind` de la configuration)
        #[arg(short = 'b', long = "bind", value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Shell interactif (tapez 'help')
    Shell,

    /// Analyse ponctuelle d'un contenu (SQL_INJECTION, PHISHING, MALWARE)
    Analyze {
        #[arg(value_name = "TYPE")]
        analysis_type: AnalysisType,

        #[arg(value_name = "CONTENT")]
        content: String,
    },
}
