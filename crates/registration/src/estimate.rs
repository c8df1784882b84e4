use nalgebra::{Matrix3, Unit, UnitQuaternion, Vector3};

use crate::transform::SimilarityTransform;

/// Minimum edge length for a sample triple to support rotation estimation.
const EDGE_EPS: f32 = 1e-6;

/// Which transform family a trial estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformModel {
    /// Rotation and translation only; scale is fixed at 1.
    Rigid,
    /// Rotation, translation, and a uniform scale taken from the ratio of
    /// the corresponding sampled edge lengths.
    Scaled,
}

/// A sampled triple cannot support estimation because its leading edge has
/// (near) zero length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegenerateSampleError;

impl std::fmt::Display for DegenerateSampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sampled triple has a zero-length edge; rotation is undefined"
        )
    }
}

impl std::error::Error for DegenerateSampleError {}

/// Estimates a transform mapping the `moving` triple onto the `fixed`
/// triple, assuming the points correspond by index.
///
/// The rotation is the shortest-arc rotation taking the moving edge
/// `moving[1] - moving[0]` onto the fixed edge `fixed[1] - fixed[0]`; the
/// translation then matches the triple centroids. Only the relative geometry
/// of the first two points constrains orientation, so rotation about the
/// edge axis is unconstrained and the third point contributes to the
/// centroid alone. The fit is exact whenever the true motion is itself the
/// shortest-arc rotation between the edges (e.g. a rotation about an axis
/// perpendicular to the sampled edge); for general triples it is an
/// approximation.
///
/// # Errors
///
/// Returns [`DegenerateSampleError`] when either leading edge is shorter
/// than the degeneracy threshold (coincident sample points).
pub fn estimate_from_triples(
    moving: &[[f32; 3]; 3],
    fixed: &[[f32; 3]; 3],
    model: TransformModel,
) -> Result<SimilarityTransform, DegenerateSampleError> {
    let moving_edge = to_vector(&moving[1]) - to_vector(&moving[0]);
    let fixed_edge = to_vector(&fixed[1]) - to_vector(&fixed[0]);

    let moving_norm = moving_edge.norm();
    let fixed_norm = fixed_edge.norm();
    if moving_norm < EDGE_EPS || fixed_norm < EDGE_EPS {
        return Err(DegenerateSampleError);
    }

    let scale = match model {
        TransformModel::Rigid => 1.0,
        TransformModel::Scaled => fixed_norm / moving_norm,
    };

    let rotation = shortest_arc(&moving_edge, &fixed_edge);

    let moving_centroid = centroid3(moving);
    let fixed_centroid = centroid3(fixed);
    let translation = fixed_centroid - rotation * (scale * moving_centroid);

    Ok(SimilarityTransform {
        rotation: mat3_to_arrays(&rotation.to_rotation_matrix().into_inner()),
        translation: [translation[0], translation[1], translation[2]],
        scale,
    })
}

/// The minimal rotation taking `from` onto `to`. Both must be non-zero.
///
/// Antiparallel vectors have no unique shortest arc; any axis perpendicular
/// to `from` realizes the 180-degree rotation.
fn shortest_arc(from: &Vector3<f32>, to: &Vector3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::rotation_between(from, to).unwrap_or_else(|| {
        let mut axis = from.cross(&Vector3::x());
        if axis.norm_squared() < EDGE_EPS * EDGE_EPS {
            axis = from.cross(&Vector3::y());
        }
        UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), std::f32::consts::PI)
    })
}

fn centroid3(pts: &[[f32; 3]; 3]) -> Vector3<f32> {
    (to_vector(&pts[0]) + to_vector(&pts[1]) + to_vector(&pts[2])) / 3.0
}

fn to_vector(p: &[f32; 3]) -> Vector3<f32> {
    Vector3::new(p[0], p[1], p[2])
}

/// Convert a nalgebra Matrix3 to a [[f32; 3]; 3] array (row-major).
fn mat3_to_arrays(m: &Matrix3<f32>) -> [[f32; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn apply(t: &SimilarityTransform, p: &[f32; 3]) -> [f32; 3] {
        t.apply_to_point(p)
    }

    fn rot_z(theta: f32, p: &[f32; 3]) -> [f32; 3] {
        let (s, c) = theta.sin_cos();
        [c * p[0] - s * p[1], s * p[0] + c * p[1], p[2]]
    }

    #[test]
    fn pure_translation_is_recovered_exactly() {
        let moving = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let t = [3.0, -2.0, 7.0];
        let fixed = [
            [3.0, -2.0, 7.0],
            [4.0, -2.0, 7.0],
            [3.0, -1.0, 7.0],
        ];

        let est = estimate_from_triples(&moving, &fixed, TransformModel::Rigid).unwrap();

        assert!(!est.is_identity(1e-5));
        assert_relative_eq!(est.scale, 1.0);
        for k in 0..3 {
            let mapped = apply(&est, &moving[k]);
            for a in 0..3 {
                assert_relative_eq!(mapped[a], fixed[k][a], epsilon = 1e-4);
            }
        }
        for a in 0..3 {
            assert_relative_eq!(est.translation[a], t[a], epsilon = 1e-4);
        }
    }

    #[test]
    fn coincident_leading_points_are_degenerate() {
        let moving = [[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]];
        let fixed = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert_eq!(
            estimate_from_triples(&moving, &fixed, TransformModel::Rigid),
            Err(DegenerateSampleError)
        );
        // Degenerate on the fixed side as well.
        assert_eq!(
            estimate_from_triples(&fixed, &moving, TransformModel::Scaled),
            Err(DegenerateSampleError)
        );
    }

    #[test]
    fn antiparallel_edges_get_a_half_turn() {
        let moving = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let fixed = [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]];

        let est = estimate_from_triples(&moving, &fixed, TransformModel::Rigid).unwrap();

        // The edge direction must be exactly reversed, whichever
        // perpendicular axis was chosen for the half turn.
        let m0 = apply(&est, &moving[0]);
        let m1 = apply(&est, &moving[1]);
        let edge = [m1[0] - m0[0], m1[1] - m0[1], m1[2] - m0[2]];
        assert_relative_eq!(edge[0], -1.0, epsilon = 1e-4);
        assert_relative_eq!(edge[1], 0.0, epsilon = 1e-4);
        assert_relative_eq!(edge[2], 0.0, epsilon = 1e-4);
    }

    #[test]
    fn rotation_matrix_is_orthonormal() {
        let moving = [[0.0, 0.0, 0.0], [1.0, 2.0, 3.0], [0.5, -1.0, 0.0]];
        let fixed = [[1.0, 1.0, 1.0], [-2.0, 0.5, 2.0], [0.0, 0.0, 0.0]];

        let est = estimate_from_triples(&moving, &fixed, TransformModel::Rigid).unwrap();
        let r = est.rotation;
        for i in 0..3 {
            for j in 0..3 {
                let dot: f32 = (0..3).map(|k| r[i][k] * r[j][k]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(dot, expected, epsilon = 1e-4);
            }
        }
    }

    proptest! {
        /// Motions whose rotation axis is perpendicular to the sampled edge
        /// are exactly the regime the two-point estimator can represent:
        /// here the edge lies in the XY plane and the motion is a rotation
        /// about Z plus an arbitrary translation.
        #[test]
        fn recovers_planar_rigid_motion_exactly(
            p0 in (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
            edge in (-10.0f32..10.0, -10.0f32..10.0),
            p2 in (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
            theta in -3.0f32..3.0,
            t in (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
        ) {
            prop_assume!((edge.0 * edge.0 + edge.1 * edge.1).sqrt() > 0.1);

            let moving = [
                [p0.0, p0.1, p0.2],
                [p0.0 + edge.0, p0.1 + edge.1, p0.2],
                [p2.0, p2.1, p2.2],
            ];
            let fixed = {
                let mut out = [[0.0f32; 3]; 3];
                for k in 0..3 {
                    let r = rot_z(theta, &moving[k]);
                    out[k] = [r[0] + t.0, r[1] + t.1, r[2] + t.2];
                }
                out
            };

            let est = estimate_from_triples(&moving, &fixed, TransformModel::Rigid).unwrap();
            prop_assert!((est.scale - 1.0).abs() < 1e-6);
            for k in 0..3 {
                let mapped = apply(&est, &moving[k]);
                for a in 0..3 {
                    prop_assert!(
                        (mapped[a] - fixed[k][a]).abs() < 1e-2,
                        "point {} axis {}: {} vs {}", k, a, mapped[a], fixed[k][a]
                    );
                }
            }
        }

        /// Same regime with a uniform scale: the edge-length ratio recovers
        /// the scale factor and the mapping stays exact.
        #[test]
        fn recovers_planar_scaled_motion_exactly(
            p0 in (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
            edge in (-10.0f32..10.0, -10.0f32..10.0),
            p2 in (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
            theta in -3.0f32..3.0,
            scale in 0.2f32..5.0,
            t in (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
        ) {
            prop_assume!((edge.0 * edge.0 + edge.1 * edge.1).sqrt() > 0.1);

            let moving = [
                [p0.0, p0.1, p0.2],
                [p0.0 + edge.0, p0.1 + edge.1, p0.2],
                [p2.0, p2.1, p2.2],
            ];
            let fixed = {
                let mut out = [[0.0f32; 3]; 3];
                for k in 0..3 {
                    let r = rot_z(theta, &moving[k]);
                    out[k] = [
                        scale * r[0] + t.0,
                        scale * r[1] + t.1,
                        scale * r[2] + t.2,
                    ];
                }
                out
            };

            let est = estimate_from_triples(&moving, &fixed, TransformModel::Scaled).unwrap();
            prop_assert!(
                (est.scale - scale).abs() < scale * 1e-3,
                "scale {} vs {}", est.scale, scale
            );
            for k in 0..3 {
                let mapped = apply(&est, &moving[k]);
                for a in 0..3 {
                    prop_assert!(
                        (mapped[a] - fixed[k][a]).abs() < 0.05,
                        "point {} axis {}: {} vs {}", k, a, mapped[a], fixed[k][a]
                    );
                }
            }
        }

        /// The rigid model never invents scale, whatever the triples are.
        #[test]
        fn rigid_model_keeps_unit_scale(
            m in prop::array::uniform3(prop::array::uniform3(-10.0f32..10.0)),
            f in prop::array::uniform3(prop::array::uniform3(-10.0f32..10.0)),
        ) {
            if let Ok(est) = estimate_from_triples(&m, &f, TransformModel::Rigid) {
                prop_assert_eq!(est.scale, 1.0);
            }
        }
    }
}
