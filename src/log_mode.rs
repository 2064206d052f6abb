use serde::{Deserialize, Serialize};

/// Destination des journaux de verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogMode {
    /// Journal texte local, en plus du logger standard
    #[default]
    File,
    /// Tout passe par systemd-journal (feature `systemd`)
    SystemdJournal,
}

impl LogMode {
    pub fn writes_file(&self) -> bool {
        *self == LogMode::File
    }
}
