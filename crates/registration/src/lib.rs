#![forbid(unsafe_code)]

pub mod estimate;
pub mod ransac;
pub mod sample;
pub mod transform;

pub use estimate::{estimate_from_triples, DegenerateSampleError, TransformModel};
pub use ransac::{
    align, align_seeded, count_inliers, AlignError, AlignmentResult, InputSet, RansacParams,
    SamplingMode,
};
pub use sample::{random_subset, sample_indices};
pub use transform::{apply_transform, SimilarityTransform};
