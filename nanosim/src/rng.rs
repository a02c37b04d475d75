//! Thread-local random number generation for simulation.
//!
//! Deterministic randomness through thread-local storage keeps the API
//! clean (no RNG threaded through every call) while each thread holds its
//! own state, so parallel test execution stays independent and each run
//! replays bit-for-bit from its seed.

use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Standard};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;

thread_local! {
    /// Thread-local random number generator for simulation.
    ///
    /// Uses ChaCha8Rng for deterministic, reproducible randomness.
    static SIM_RNG: RefCell<ChaCha8Rng> = RefCell::new(ChaCha8Rng::seed_from_u64(0));

    /// The seed last installed via [`set_sim_seed`], kept for reporting.
    static CURRENT_SEED: RefCell<u64> = const { RefCell::new(0) };
}

/// Resets the thread-local RNG to the default seed (0).
///
/// Called by the simulator constructors so consecutive simulations on the
/// same thread never observe each other's RNG state.
pub fn reset_sim_rng() {
    SIM_RNG.with(|rng| *rng.borrow_mut() = ChaCha8Rng::seed_from_u64(0));
    CURRENT_SEED.with(|seed| *seed.borrow_mut() = 0);
}

/// Installs a specific seed for this thread's simulation RNG.
///
/// The same seed always produces the same sequence of random values
/// within a single thread.
pub fn set_sim_seed(seed: u64) {
    SIM_RNG.with(|rng| *rng.borrow_mut() = ChaCha8Rng::seed_from_u64(seed));
    CURRENT_SEED.with(|s| *s.borrow_mut() = seed);
}

/// Returns the seed currently installed on this thread.
pub fn current_sim_seed() -> u64 {
    CURRENT_SEED.with(|seed| *seed.borrow())
}

/// Generates a random value using the thread-local simulation RNG.
pub fn sim_random<T>() -> T
where
    Standard: Distribution<T>,
{
    SIM_RNG.with(|rng| rng.borrow_mut().sample(Standard))
}

/// Generates a random value within a range using the thread-local
/// simulation RNG. The upper bound is exclusive.
pub fn sim_random_range<T>(range: std::ops::Range<T>) -> T
where
    T: SampleUniform + PartialOrd,
{
    SIM_RNG.with(|rng| rng.borrow_mut().gen_range(range))
}
