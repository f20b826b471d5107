//! Seeded permutation null distributions for the randomization test.
//!
//! Shuffles the temporal labels of the cases (a label shuffle, never a
//! resample: every permutation sees exactly the original multiset of
//! event times), re-splits the proximity values into within/outside the
//! window, and recomputes the statistic of interest. The empirical
//! percentile rank of the unpermuted statistic within this distribution
//! is the randomization-test p-value.

use std::sync::Arc;

use epi_zone_models::TimeWindow;
use epi_zone_models::progress::ProgressCallback;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::StatsError;

/// Splits `values` into those whose paired time falls inside the window
/// and those outside it.
#[must_use]
pub fn split_by_window(
    values: &[f64],
    times: &[i64],
    window: TimeWindow,
) -> (Vec<f64>, Vec<f64>) {
    let mut within = Vec::new();
    let mut outside = Vec::new();
    for (&value, &time) in values.iter().zip(times) {
        if window.contains(time) {
            within.push(value);
        } else {
            outside.push(value);
        }
    }
    (within, outside)
}

/// Builds an empirical null distribution of `statistic` under random
/// permutations of the temporal labels.
///
/// The generator is seeded once per call, so a given
/// `(seed, n_permutations)` pair is fully reproducible. Permutations for
/// which the statistic is undefined (e.g., the shuffle left one side of
/// the split empty) are skipped, so the returned distribution may be
/// shorter than `n_permutations`. `n_permutations == 0` yields an empty
/// distribution; percentile ranks against it are rejected downstream by
/// [`crate::ranks::empirical_p_value`].
pub fn permutation_null_distribution<F>(
    values: &[f64],
    times: &[i64],
    window: TimeWindow,
    statistic: F,
    n_permutations: usize,
    seed: u64,
    progress: &Arc<dyn ProgressCallback>,
) -> Vec<f64>
where
    F: Fn(&[f64], &[f64]) -> Result<f64, StatsError>,
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut shuffled: Vec<i64> = times.to_vec();
    let mut null = Vec::with_capacity(n_permutations);
    let mut skipped = 0_u64;

    progress.set_total(n_permutations as u64);

    for _ in 0..n_permutations {
        shuffled.shuffle(&mut rng);
        let (within, outside) = split_by_window(values, &shuffled, window);
        match statistic(&within, &outside) {
            Ok(stat) => null.push(stat),
            Err(_) => skipped += 1,
        }
        progress.inc(1);
    }

    if skipped > 0 {
        log::warn!(
            "{skipped}/{n_permutations} permutations skipped (statistic undefined on the shuffled split)"
        );
    }
    progress.finish(format!("{} permutations", null.len()));

    null
}
