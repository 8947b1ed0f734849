//! Monte Carlo permutation test for Moran's I
//!
//! Each trial shuffles the attribute over the fixed units, recomputes I with
//! the unchanged weights and records it. The pseudo p-value ranks the
//! observed statistic among the simulated ones:
//!
//! ```text
//! G = #{ simulated > observed }
//! p = min(G + 1, n + 1 - G) / (n + 1)
//! ```
//!
//! Trial `k` draws its permutation from a ChaCha8 stream `k` of the run
//! seed, so the simulated sequence does not depend on how trials are
//! scheduled across threads.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use arealstat_core::{Error, Result};

use super::moran::MoranKernel;
use crate::maybe_rayon::*;
use crate::weights::SpatialWeights;

/// Cooperative cancellation flag shared with a running simulation
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; trials not yet started will not run.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Parameters for the permutation test
#[derive(Debug, Clone)]
pub struct PermutationParams {
    /// Number of simulated permutations (default: 599)
    pub n_simulations: usize,
    /// Run seed; `None` draws one from the thread RNG
    pub seed: Option<u64>,
    /// Checked before each trial
    pub cancel: Option<CancelToken>,
}

impl Default for PermutationParams {
    fn default() -> Self {
        Self {
            n_simulations: 599,
            seed: None,
            cancel: None,
        }
    }
}

impl PermutationParams {
    /// Seeded, reproducible parameters
    pub fn seeded(n_simulations: usize, seed: u64) -> Self {
        Self {
            n_simulations,
            seed: Some(seed),
            cancel: None,
        }
    }
}

/// Result of the permutation test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationTest {
    /// Observed Moran's I
    pub statistic: f64,
    /// Count of simulated values strictly greater than the observed
    pub greater_count: usize,
    /// Pseudo p-value, in `[1/(n+1), 1]`
    pub p_value: f64,
    /// Seed that reproduces `simulated`
    pub seed: u64,
    /// Simulated statistics in trial order
    pub simulated: Vec<f64>,
}

impl PermutationTest {
    pub fn n_simulations(&self) -> usize {
        self.simulated.len()
    }

    /// Mean of the simulated null distribution
    pub fn simulated_mean(&self) -> f64 {
        self.simulated.iter().sum::<f64>() / self.simulated.len() as f64
    }

    /// Sample variance of the simulated null distribution
    pub fn simulated_variance(&self) -> f64 {
        let n = self.simulated.len() as f64;
        let mean = self.simulated_mean();
        self.simulated.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)
    }
}

/// Rank-based pseudo p-value from `greater` exceedances in `n_simulations` trials.
pub fn pseudo_p_value(greater: usize, n_simulations: usize) -> f64 {
    debug_assert!(greater <= n_simulations);
    let tail = (greater + 1).min(n_simulations + 1 - greater);
    tail as f64 / (n_simulations + 1) as f64
}

/// Permutation (Monte Carlo) test of Moran's I.
///
/// # Errors
/// - Everything [`super::morans_i`] rejects
/// - `Error::Configuration` if `n_simulations == 0`
/// - `Error::Cancelled` if the cancel token fires before all trials ran
pub fn moran_permutation_test(
    attribute: &[f64],
    weights: &SpatialWeights,
    params: PermutationParams,
) -> Result<PermutationTest> {
    let n_sim = params.n_simulations;
    if n_sim == 0 {
        return Err(Error::config("n_simulations", n_sim, "must be at least 1"));
    }
    let kernel = MoranKernel::new(attribute, weights)?;
    let statistic = kernel.statistic();
    let seed = params.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let cancel = params.cancel.as_ref();

    debug!(n_simulations = n_sim, seed, "starting permutation test");

    let simulated: Vec<f64> = (0..n_sim)
        .into_par_iter()
        .map(|trial| {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(Error::Cancelled);
            }
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(trial as u64);
            let mut perm: Vec<usize> = (0..kernel.n()).collect();
            perm.shuffle(&mut rng);
            Ok(kernel.statistic_permuted(&perm))
        })
        .collect::<Result<_>>()?;

    let greater_count = simulated.iter().filter(|&&v| v > statistic).count();
    let p_value = pseudo_p_value(greater_count, n_sim);

    debug!(statistic, greater_count, p_value, "permutation test finished");

    Ok(PermutationTest {
        statistic,
        greater_count,
        p_value,
        seed,
        simulated,
    })
}
