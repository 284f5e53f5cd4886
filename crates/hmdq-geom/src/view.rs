//! Panel rotation and IPD from the eye-to-head transforms.

use hmdq_math::{degrees, point_dist, Point3};
use serde::{Deserialize, Serialize};

use crate::model::{Eye2Head, PerEye};

/// View geometry of the headset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewGeom {
    /// Left panel rotation in degrees, positive when the view turns right.
    pub left_rot: f64,
    /// Right panel rotation in degrees.
    pub right_rot: f64,
    /// Distance between the eye centers in meters.
    pub ipd: f64,
}

/// Rotation of the view direction around the vertical axis, in degrees.
///
/// The forward vector `(0, 0, -1)` maps to the negated third column, so the
/// angle is `acos(e2h[2][2])` and the sign comes from `e2h[0][2]`.
fn panel_rotation(e2h: &Eye2Head) -> f64 {
    let m = &e2h.0.matrix;
    let rot = degrees(m[(2, 2)].clamp(-1.0, 1.0).acos());
    if m[(0, 2)] > 0.0 {
        -rot
    } else {
        rot
    }
}

/// Compute panel rotations and IPD.
pub fn calc_view_geom(e2h: &PerEye<Eye2Head>) -> ViewGeom {
    let left = Point3::from(e2h.left.0.translation());
    let right = Point3::from(e2h.right.0.translation());
    ViewGeom {
        left_rot: panel_rotation(&e2h.left),
        right_rot: panel_rotation(&e2h.right),
        ipd: point_dist(&left, &right),
    }
}
