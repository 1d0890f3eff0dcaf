//! Randomized novelty term, isolated behind a trait so ranking can be pinned.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_NOVELTY_MAX: f64 = 1.5;

pub trait NoveltySource: Send {
    /// Next novelty bonus, in `[0, max)`.
    fn sample(&mut self) -> f64;
}

/// Uniform draws from `[0, max)`.
pub struct UniformNovelty {
    rng: StdRng,
    max: f64,
}

impl UniformNovelty {
    #[must_use]
    pub fn from_entropy(max: f64) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            max,
        }
    }

    #[must_use]
    pub fn seeded(seed: u64, max: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max,
        }
    }
}

impl NoveltySource for UniformNovelty {
    fn sample(&mut self) -> f64 {
        if self.max > 0.0 {
            self.rng.random_range(0.0..self.max)
        } else {
            0.0
        }
    }
}

/// Always the same value; `FixedNovelty(0.0)` disables the term.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedNovelty(pub f64);

impl NoveltySource for FixedNovelty {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Build the production source: seeded when a seed is configured.
#[must_use]
pub fn novelty_source(max: f64, seed: Option<u64>) -> Box<dyn NoveltySource> {
    match seed {
        Some(seed) => Box::new(UniformNovelty::seeded(seed, max)),
        None => Box::new(UniformNovelty::from_entropy(max)),
    }
}
