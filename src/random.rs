//! Source d'aléa interchangeable pour la simulation
//!
//! Les générateurs de trafic et le simulateur DoS ne tirent jamais leurs
//! valeurs directement de `rand`: ils passent par [`RandomSource`], ce qui
//! permet aux tests d'injecter une séquence déterministe.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// Fournit des valeurs uniformes dans [0, 1)
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// Source partagée entre les tâches périodiques
pub type SharedRandom = Arc<Mutex<Box<dyn RandomSource>>>;

pub fn shared(source: impl RandomSource + 'static) -> SharedRandom {
    Arc::new(Mutex::new(Box::new(source)))
}

/// Entier dans [low, high), tiré comme `low + floor(u * (high - low))`
pub fn draw_range(source: &mut dyn RandomSource, low: u64, high: u64) -> u64 {
    if high <= low {
        return low;
    }
    let span = high - low;
    let offset = (source.next_unit() * span as f64).floor() as u64;
    low + offset.min(span - 1)
}

/// Indice dans une liste de `len` éléments
pub fn draw_index(source: &mut dyn RandomSource, len: usize) -> usize {
    draw_range(source, 0, len as u64) as usize
}

/// Source de production basée sur `StdRng`
pub struct ThreadRandom {
    rng: StdRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Source reproductible
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Rejoue une séquence fixe, en boucle
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Renvoie toujours la même valeur
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        // Une source uniforme ne renvoie jamais 1.0
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
