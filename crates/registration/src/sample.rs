use pointalign_core::PointCloud;
use rand::seq::index;
use rand::Rng;

/// Draws `min(k, n)` distinct indices in `[0, n)` uniformly at random
/// without replacement. No order guarantee.
pub fn sample_indices<R: Rng>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    index::sample(rng, n, k.min(n)).into_vec()
}

/// Draws a random subset of `min(k, |points|)` distinct points from the
/// cloud. The input is not modified.
///
/// Callers that require exactly `k` points must check the input length
/// themselves; a short cloud yields a short subset.
pub fn random_subset<R: Rng>(points: &PointCloud, k: usize, rng: &mut R) -> PointCloud {
    points.select(&sample_indices(points.len(), k, rng))
}
