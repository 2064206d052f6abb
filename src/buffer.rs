use crate::error::ParseError;
use crate::models::{Packet, Protocol};
use std::collections::VecDeque;
use std::str::FromStr;

/// Filtre de lecture du tampon de paquets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolFilter {
    #[default]
    All,
    Only(Protocol),
}

impl ProtocolFilter {
    pub fn accepts(&self, packet: &Packet) -> bool {
        match self {
            Self::All => true,
            Self::Only(protocol) => packet.protocol == *protocol,
        }
    }
}

impl FromStr for ProtocolFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("ALL") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Tampon borné des paquets inspectés ou en attente, du plus récent au plus ancien
pub struct PacketBuffer {
    packets: VecDeque<Packet>,
    capacity: usize,
}

impl PacketBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            packets: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Ajoute en tête puis évince les plus anciens au-delà de la capacité.
    /// Renvoie les paquets évincés.
    pub fn push(&mut self, packet: Packet) -> Vec<Packet> {
        self.packets.push_front(packet);
        let mut evicted = Vec::new();
        while self.packets.len() > self.capacity {
            if let Some(oldest) = self.packets.pop_back() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn filter_by_protocol(&self, filter: ProtocolFilter) -> Vec<Packet> {
        self.packets
            .iter()
            .filter(|packet| filter.accepts(packet))
            .cloned()
            .collect()
    }

    pub fn select(&self, id: &str) -> Option<Packet> {
        self.packets.iter().find(|packet| packet.id == id).cloned()
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Packet> {
        self.packets.iter_mut().find(|packet| packet.id == id)
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter()
    }
}
