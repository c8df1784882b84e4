use log::debug;
use pointalign_core::PointCloud;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::estimate::{estimate_from_triples, TransformModel};
use crate::sample::sample_indices;
use crate::transform::{apply_transform, SimilarityTransform};

/// Points needed to estimate one candidate transform.
const MIN_SAMPLE_SIZE: usize = 3;

/// How the per-trial triples are drawn from the two sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Each set is sampled on its own; the drawn triples are then treated
    /// as corresponding by position even though nothing links them. With
    /// more than a handful of points a trial rarely draws a truly
    /// corresponding triple, so recovery leans entirely on the trial
    /// budget.
    Independent,
    /// One index triple is drawn from `0..min(|source|, |target|)` and
    /// applied to both sets, so sampled triples respect the by-index
    /// correspondence of the inputs.
    Paired,
}

/// Search configuration for [`align`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RansacParams {
    /// Trial budget. Every trial runs; there is no adaptive early exit.
    pub iterations: usize,
    /// Pairs closer than this after transformation count as inliers.
    pub inlier_threshold: f32,
    pub model: TransformModel,
    pub sampling: SamplingMode,
    /// Optional validity gate: when set, a best trial below this count is
    /// reported as [`AlignError::InsufficientInliers`] instead of a result.
    pub min_inliers: Option<usize>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            iterations: 1000,
            inlier_threshold: 0.1,
            model: TransformModel::Rigid,
            sampling: SamplingMode::Independent,
            min_inliers: None,
        }
    }
}

/// Outcome of a completed alignment search.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    /// Best-scoring transform found; identity if no trial produced inliers.
    pub transform: SimilarityTransform,
    /// Inliers the best transform scored against the target set.
    pub inlier_count: usize,
    /// Inlier fraction over the scored (index-paired) positions.
    pub fitness: f32,
    /// The source cloud with the best transform applied.
    pub aligned: PointCloud,
}

/// Which input a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSet {
    Source,
    Target,
}

impl std::fmt::Display for InputSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSet::Source => write!(f, "source"),
            InputSet::Target => write!(f, "target"),
        }
    }
}

/// Error type for the alignment search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    /// An input set is empty; nothing can be aligned.
    EmptyPointSet { which: InputSet },
    /// An input set is smaller than the minimal sample, so no trial could
    /// estimate a transform.
    TooFewPoints { which: InputSet, len: usize },
    /// The configured minimum-inlier gate was missed. Carries the best
    /// count actually reached so callers can still report it.
    InsufficientInliers { best: usize, required: usize },
}

impl std::fmt::Display for AlignError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlignError::EmptyPointSet { which } => write!(f, "{} point set is empty", which),
            AlignError::TooFewPoints { which, len } => write!(
                f,
                "{} point set has {} points; at least {} are required",
                which, len, MIN_SAMPLE_SIZE
            ),
            AlignError::InsufficientInliers { best, required } => write!(
                f,
                "best trial reached {} inliers but {} are required",
                best, required
            ),
        }
    }
}

impl std::error::Error for AlignError {}

/// Counts index-paired positions whose Euclidean distance is strictly below
/// `threshold`. Pairs beyond the shorter length are ignored.
pub fn count_inliers(reference: &PointCloud, candidate: &PointCloud, threshold: f32) -> usize {
    let n = reference.len().min(candidate.len());
    let mut count = 0;
    for i in 0..n {
        let dx = reference.x[i] - candidate.x[i];
        let dy = reference.y[i] - candidate.y[i];
        let dz = reference.z[i] - candidate.z[i];
        if (dx * dx + dy * dy + dz * dz).sqrt() < threshold {
            count += 1;
        }
    }
    count
}

/// Index triples for one trial, one per set.
#[derive(Debug, Clone, Copy)]
struct TrialSample {
    source: [usize; 3],
    target: [usize; 3],
}

/// Aligns `source` onto `target` with a random (non-deterministic) seed.
///
/// See [`align_seeded`] for the search itself; use it directly when
/// reproducible runs are needed.
///
/// # Errors
///
/// Returns [`AlignError`] on empty or too-small inputs, or when a configured
/// `min_inliers` gate is missed.
pub fn align(
    source: &PointCloud,
    target: &PointCloud,
    params: &RansacParams,
) -> Result<AlignmentResult, AlignError> {
    let seed = rand::thread_rng().next_u64();
    align_seeded(source, target, params, seed)
}

/// Aligns `source` onto `target` with a deterministic seed.
///
/// Runs `params.iterations` trials. Each trial draws a triple from each set
/// (per `params.sampling`), estimates a candidate transform from the triples,
/// applies it to the entire source cloud, and counts index-paired inliers
/// against the target. A trial replaces the best only when its count is
/// strictly greater, so the earliest-found maximum wins; degenerate draws
/// are skipped and never abort the search. The full trial budget always
/// runs.
///
/// Trials are independent, so large inputs are scored in parallel; the
/// keep-first merge of per-trial results makes the outcome identical to the
/// sequential run.
///
/// # Errors
///
/// Returns [`AlignError`] on empty or too-small inputs, or when a configured
/// `min_inliers` gate is missed.
pub fn align_seeded(
    source: &PointCloud,
    target: &PointCloud,
    params: &RansacParams,
    seed: u64,
) -> Result<AlignmentResult, AlignError> {
    validate(source, InputSet::Source)?;
    validate(target, InputSet::Target)?;

    // Pre-generate all random draws for determinism.
    let mut rng = StdRng::seed_from_u64(seed);
    let samples: Vec<TrialSample> = match params.sampling {
        SamplingMode::Independent => (0..params.iterations)
            .map(|_| TrialSample {
                source: triple(sample_indices(source.len(), MIN_SAMPLE_SIZE, &mut rng)),
                target: triple(sample_indices(target.len(), MIN_SAMPLE_SIZE, &mut rng)),
            })
            .collect(),
        SamplingMode::Paired => {
            let n = source.len().min(target.len());
            (0..params.iterations)
                .map(|_| {
                    let shared = triple(sample_indices(n, MIN_SAMPLE_SIZE, &mut rng));
                    TrialSample {
                        source: shared,
                        target: shared,
                    }
                })
                .collect()
        }
    };

    debug!(
        "aligning {} -> {} points: {} trials, threshold {}",
        source.len(),
        target.len(),
        samples.len(),
        params.inlier_threshold
    );

    let run_trial = |sample: &TrialSample| -> Option<(SimilarityTransform, usize)> {
        let moving = triple_points(source, &sample.source);
        let fixed = triple_points(target, &sample.target);
        let candidate = estimate_from_triples(&moving, &fixed, params.model).ok()?;
        let transformed = apply_transform(source, &candidate);
        let count = count_inliers(target, &transformed, params.inlier_threshold);
        Some((candidate, count))
    };

    let use_parallel = source.len() >= 10_000 && samples.len() >= 16;

    let (best, best_count) = if use_parallel {
        // reduce_with combines in sequence order, and keeping the left
        // operand on ties preserves the earliest-maximum rule.
        samples
            .par_iter()
            .filter_map(run_trial)
            .reduce_with(|a, b| if a.1 >= b.1 { a } else { b })
            .filter(|(_, count)| *count > 0)
            .unwrap_or((SimilarityTransform::identity(), 0))
    } else {
        let mut best = SimilarityTransform::identity();
        let mut best_count: usize = 0;

        for (iter, sample) in samples.iter().enumerate() {
            let (candidate, count) = match run_trial(sample) {
                Some(outcome) => outcome,
                None => continue,
            };

            if count > best_count {
                debug!("trial {}: new best with {} inliers", iter, count);
                best_count = count;
                best = candidate;
            }
        }

        (best, best_count)
    };

    if let Some(required) = params.min_inliers {
        if best_count < required {
            return Err(AlignError::InsufficientInliers {
                best: best_count,
                required,
            });
        }
    }

    let scored = source.len().min(target.len());
    let fitness = best_count as f32 / scored as f32;
    let aligned = apply_transform(source, &best);

    Ok(AlignmentResult {
        transform: best,
        inlier_count: best_count,
        fitness,
        aligned,
    })
}

fn validate(cloud: &PointCloud, which: InputSet) -> Result<(), AlignError> {
    if cloud.is_empty() {
        return Err(AlignError::EmptyPointSet { which });
    }
    if cloud.len() < MIN_SAMPLE_SIZE {
        return Err(AlignError::TooFewPoints {
            which,
            len: cloud.len(),
        });
    }
    Ok(())
}

fn triple(indices: Vec<usize>) -> [usize; 3] {
    [indices[0], indices[1], indices[2]]
}

fn triple_points(cloud: &PointCloud, indices: &[usize; 3]) -> [[f32; 3]; 3] {
    [
        cloud.point(indices[0]),
        cloud.point(indices[1]),
        cloud.point(indices[2]),
    ]
}
