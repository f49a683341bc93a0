//! Weighted random variant selection for A/B tests.

use crate::domain::entities::AbVariant;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of uniform random draws used by variant selection.
///
/// Injected into the redirect service so tests can force specific draws
/// without weakening production randomness.
pub trait EntropySource: Send + Sync {
    /// Returns a uniformly distributed value in `0..bound`. `bound` is never 0.
    fn next_below(&self, bound: u64) -> u64;
}

/// Production entropy backed by the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadEntropy;

impl EntropySource for ThreadEntropy {
    fn next_below(&self, bound: u64) -> u64 {
        rand::rng().random_range(0..bound)
    }
}

/// Deterministic entropy from a seeded generator.
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn next_below(&self, bound: u64) -> u64 {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.random_range(0..bound)
    }
}

/// Picks one variant with probability proportional to its weight.
///
/// Draws a single `r` in `[0, W)` where `W` is the total weight, then returns
/// the first variant whose cumulative weight exceeds `r`. A zero-weight
/// variant is therefore never chosen while any variant has positive weight.
/// When every weight is zero the variants are treated as equally weighted.
/// Returns `None` for an empty slice.
pub fn select_random_variant<'a>(
    variants: &'a [AbVariant],
    entropy: &dyn EntropySource,
) -> Option<&'a AbVariant> {
    if variants.is_empty() {
        return None;
    }

    let total: u64 = variants.iter().map(|v| u64::from(v.weight)).sum();

    if total == 0 {
        let index = entropy.next_below(variants.len() as u64) as usize;
        return variants.get(index);
    }

    let r = entropy.next_below(total);
    let mut cumulative = 0u64;

    for variant in variants {
        cumulative += u64::from(variant.weight);
        if cumulative > r {
            return Some(variant);
        }
    }

    // Unreachable for a well-behaved source (r < total); keep the last
    // positively-weighted variant so a misbehaving source cannot pick weight 0.
    variants.iter().rev().find(|v| v.weight > 0)
}
