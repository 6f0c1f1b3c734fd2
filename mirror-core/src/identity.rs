//! Committer identity selection

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::CommitterIdentity;
use crate::{Error, Result};

/// Picks a committer uniformly at random from an injected random source
#[derive(Debug, Clone)]
pub struct IdentityPicker<G: Rng> {
    rng: G,
}

impl IdentityPicker<StdRng> {
    /// Picker seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Picker with a fixed seed, for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<G: Rng> IdentityPicker<G> {
    pub fn new(rng: G) -> Self {
        Self { rng }
    }

    /// Index into a list of `len` identities, in `[0, len)`
    pub fn pick_index(&mut self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(Error::NoCommitters);
        }
        Ok(self.rng.gen_range(0..len))
    }

    pub fn pick<'c>(&mut self, identities: &'c [CommitterIdentity]) -> Result<&'c CommitterIdentity> {
        let index = self.pick_index(identities.len())?;
        Ok(&identities[index])
    }
}
