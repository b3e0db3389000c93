//! # Random Source
//!
//! Cosmetic stage timings and run ids. Injected into the generator so tests
//! can pin exact values instead of only asserting ranges.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Inclusive lower bound of a stage's cosmetic duration
pub const STAGE_MS_MIN: u64 = 50;
/// Exclusive upper bound of a stage's cosmetic duration
pub const STAGE_MS_MAX: u64 = 170;

const RUN_ID_LEN: usize = 6;
const RUN_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of the randomized parts of a run trace
pub trait RandomSource: Send + Sync {
    /// A stage duration in `[STAGE_MS_MIN, STAGE_MS_MAX)`
    fn stage_ms(&self) -> u64;

    /// A short opaque run token
    fn run_id(&self) -> String;
}

fn sample_run_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..RUN_ID_LEN)
        .map(|_| RUN_ID_ALPHABET[rng.gen_range(0..RUN_ID_ALPHABET.len())] as char)
        .collect()
}

/// Thread-local RNG; the production source
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn stage_ms(&self) -> u64 {
        rand::thread_rng().gen_range(STAGE_MS_MIN..STAGE_MS_MAX)
    }

    fn run_id(&self) -> String {
        sample_run_id(&mut rand::thread_rng())
    }
}

/// Deterministic source seeded once; same seed, same sequence
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn stage_ms(&self) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(STAGE_MS_MIN..STAGE_MS_MAX)
    }

    fn run_id(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        sample_run_id(&mut *rng)
    }
}

/// Constant values, clamped into the valid stage range
#[derive(Debug, Clone)]
pub struct FixedRandom {
    ms: u64,
    run_id: String,
}

impl FixedRandom {
    pub fn new(ms: u64, run_id: impl Into<String>) -> Self {
        Self {
            ms: ms.clamp(STAGE_MS_MIN, STAGE_MS_MAX - 1),
            run_id: run_id.into(),
        }
    }
}

impl RandomSource for FixedRandom {
    fn stage_ms(&self) -> u64 {
        self.ms
    }

    fn run_id(&self) -> String {
        self.run_id.clone()
    }
}
