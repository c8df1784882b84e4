use pointalign_core::PointCloud;

/// A uniform-scale rigid motion: rotation, translation, and a positive
/// uniform scale factor.
///
/// Applied to a point as scale, then rotation, then translation:
/// `p' = R * (s * p) + t`. The rigid case is `scale == 1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTransform {
    /// Row-major orthonormal rotation matrix.
    pub rotation: [[f32; 3]; 3],
    pub translation: [f32; 3],
    pub scale: f32,
}

impl SimilarityTransform {
    pub fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0, 0.0, 0.0],
            scale: 1.0,
        }
    }

    pub fn is_identity(&self, eps: f32) -> bool {
        let id = Self::identity();
        for r in 0..3 {
            for c in 0..3 {
                if (self.rotation[r][c] - id.rotation[r][c]).abs() > eps {
                    return false;
                }
            }
        }
        for a in 0..3 {
            if self.translation[a].abs() > eps {
                return false;
            }
        }
        (self.scale - 1.0).abs() <= eps
    }

    /// Apply the transform to a single point: `R * (s * p) + t`.
    pub fn apply_to_point(&self, p: &[f32; 3]) -> [f32; 3] {
        let r = &self.rotation;
        let t = &self.translation;
        let sp = [self.scale * p[0], self.scale * p[1], self.scale * p[2]];
        [
            r[0][0] * sp[0] + r[0][1] * sp[1] + r[0][2] * sp[2] + t[0],
            r[1][0] * sp[0] + r[1][1] * sp[1] + r[1][2] * sp[2] + t[1],
            r[2][0] * sp[0] + r[2][1] * sp[1] + r[2][2] * sp[2] + t[2],
        ]
    }

    /// The transform as a row-major 4x4 homogeneous matrix.
    ///
    /// The upper-left 3x3 block is `s * R`, the last column is the
    /// translation. This is the canonical serializable form for consumers
    /// that render or store the result.
    pub fn to_matrix4(&self) -> [[f32; 4]; 4] {
        let r = &self.rotation;
        let t = &self.translation;
        let s = self.scale;
        [
            [s * r[0][0], s * r[0][1], s * r[0][2], t[0]],
            [s * r[1][0], s * r[1][1], s * r[1][2], t[1]],
            [s * r[2][0], s * r[2][1], s * r[2][2], t[2]],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }
}

impl Default for SimilarityTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Apply a transform to all points in a cloud, returning a new cloud of the
/// same length. The input is not modified.
pub fn apply_transform(cloud: &PointCloud, transform: &SimilarityTransform) -> PointCloud {
    let n = cloud.len();
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);

    for i in 0..n {
        let p = [cloud.x[i], cloud.y[i], cloud.z[i]];
        let tp = transform.apply_to_point(&p);
        x.push(tp[0]);
        y.push(tp[1]);
        z.push(tp[2]);
    }

    PointCloud::from_xyz(x, y, z)
}
