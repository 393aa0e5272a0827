// nereus_node/src/scenario/prng.rs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// A newtype wrapper around `ChaCha8Rng`.
/// This is the one pseudo-random number generator a scenario draws from.
#[derive(Debug, Clone)]
pub struct SimulationRng(pub ChaCha8Rng);

impl SimulationRng {
    /// Seeded when a seed is given, from OS entropy otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => {
                info!("Using scenario seed {}", seed);
                Self(ChaCha8Rng::seed_from_u64(seed))
            }
            None => Self(ChaCha8Rng::from_entropy()),
        }
    }
}
