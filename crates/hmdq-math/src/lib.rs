#![warn(missing_docs)]

//! Math types for the hmdq headset geometry crates.
//!
//! Thin wrappers around nalgebra providing domain-specific types for
//! headset view geometry: points, vectors, rotations, rigid eye-to-head
//! transforms, and the small set of vector/matrix helpers the FOV
//! computation is built from.

use nalgebra::{DMatrix, Matrix2, Matrix3, Matrix3x4, SVector, UnitQuaternion, Vector2, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in 2D (UV or tangent) space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// A 3x3 rotation matrix (row-major semantics, column vectors).
pub type Mat3 = Matrix3<f64>;

/// Machine epsilon scaled by 100, the tolerance used by all geometric
/// comparisons in the FOV computation.
pub const DOUBLE_EPS_100: f64 = f64::EPSILON * 100.0;

/// Millimeters per meter, applied when IPD is presented to users.
pub const MM_IN_METER: f64 = 1000.0;

/// Convert radians to degrees.
#[inline]
pub fn degrees(rad: f64) -> f64 {
    (rad * 180.0) / std::f64::consts::PI
}

/// Dot product of two vectors of the same dimension.
#[inline]
pub fn dot_prod<const D: usize>(v1: &SVector<f64, D>, v2: &SVector<f64, D>) -> f64 {
    v1.dot(v2)
}

/// Euclidean length of a vector.
#[inline]
pub fn norm<const D: usize>(v: &SVector<f64, D>) -> f64 {
    dot_prod(v, v).sqrt()
}

/// Angle between two vectors in radians.
///
/// The cosine is clamped to `[-1, 1]`. A zero-length input yields NaN;
/// use [`angle_checked`] where that must be detected.
pub fn angle<const D: usize>(v1: &SVector<f64, D>, v2: &SVector<f64, D>) -> f64 {
    let cos = dot_prod(v1, v2) / (norm(v1) * norm(v2));
    cos.clamp(-1.0, 1.0).acos()
}

/// Angle between two vectors in degrees.
#[inline]
pub fn angle_deg<const D: usize>(v1: &SVector<f64, D>, v2: &SVector<f64, D>) -> f64 {
    degrees(angle(v1, v2))
}

/// Angle in degrees, or `None` if either vector is (near) zero or not finite.
pub fn angle_checked<const D: usize>(v1: &SVector<f64, D>, v2: &SVector<f64, D>) -> Option<f64> {
    let (n1, n2) = (norm(v1), norm(v2));
    if !(n1.is_finite() && n2.is_finite()) || n1 <= DOUBLE_EPS_100 || n2 <= DOUBLE_EPS_100 {
        return None;
    }
    let deg = angle_deg(v1, v2);
    deg.is_finite().then_some(deg)
}

/// Distance between two points.
#[inline]
pub fn point_dist(p1: &Point3, p2: &Point3) -> f64 {
    norm(&(p1 - p2))
}

/// Determinant of a 2x2 matrix.
#[inline]
pub fn det_mat_2x2(m: &Matrix2<f64>) -> f64 {
    m[(0, 0)] * m[(1, 1)] - m[(1, 0)] * m[(0, 1)]
}

/// Matrix product of two dynamically sized matrices.
///
/// # Panics
///
/// Panics if the inner dimensions do not agree.
pub fn matmul(a1: &DMatrix<f64>, a2: &DMatrix<f64>) -> DMatrix<f64> {
    assert_eq!(
        a1.ncols(),
        a2.nrows(),
        "matmul: inner dimensions differ ({}x{} * {}x{})",
        a1.nrows(),
        a1.ncols(),
        a2.nrows(),
        a2.ncols()
    );
    a1 * a2
}

/// A rigid 3x4 transform `[R | t]`, as reported for eye-to-head poses.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidTransform {
    /// The underlying 3x4 matrix.
    pub matrix: Matrix3x4<f64>,
}

impl RigidTransform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3x4::identity(),
        }
    }

    /// Build from row-major rows.
    pub fn from_rows(rows: &[[f64; 4]; 3]) -> Self {
        let mut m = Matrix3x4::zeros();
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                m[(r, c)] = *v;
            }
        }
        Self { matrix: m }
    }

    /// Row-major rows of the matrix.
    pub fn to_rows(&self) -> [[f64; 4]; 3] {
        let mut rows = [[0.0; 4]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.matrix[(r, c)];
            }
        }
        rows
    }

    /// Build from an orientation quaternion `(x, y, z, w)` and a position.
    pub fn from_pose(orientation: [f64; 4], position: [f64; 3]) -> Self {
        let [x, y, z, w] = orientation;
        let q = UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(w, x, y, z));
        let r = q.to_rotation_matrix();
        let mut m = Matrix3x4::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(r.matrix());
        m.set_column(3, &Vec3::new(position[0], position[1], position[2]));
        Self { matrix: m }
    }

    /// Rotation about the Y axis by `angle` radians, the axis a canted panel
    /// is turned around.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix3x4::identity();
        m[(0, 0)] = c;
        m[(0, 2)] = s;
        m[(2, 0)] = -s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Same transform with the translation replaced.
    pub fn with_translation(mut self, t: Vec3) -> Self {
        self.matrix.set_column(3, &t);
        self
    }

    /// The 3x3 rotation part.
    pub fn rotation(&self) -> Mat3 {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation column.
    pub fn translation(&self) -> Vec3 {
        self.matrix.column(3).into_owned()
    }

    /// Exact comparison of the rotation part with identity.
    pub fn has_identity_rotation(&self) -> bool {
        self.rotation() == Mat3::identity()
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        Point3::from(self.rotation() * p.coords + self.translation())
    }

    /// All components finite.
    pub fn is_finite(&self) -> bool {
        self.matrix.iter().all(|v| v.is_finite())
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}
