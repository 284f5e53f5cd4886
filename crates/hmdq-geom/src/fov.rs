//! Per-eye and combined field of view.

use hmdq_math::{angle_checked, Mat3, Point2, Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{GeomError, Result};
use crate::frustum::{Frustum, FOV_POINT_COUNT};
use crate::mesh::EdgeMesh;
use crate::model::{OptimizedMesh, PerEye, RawEye};

/// FOV of one eye: the eight projected FOV points and the angles derived
/// from them, in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeFov {
    /// FOV points LB, B, RB, R, RT, T, LT, L projected onto `|z| = 1`.
    pub fov_pts: [[f64; 3]; FOV_POINT_COUNT],
    /// Left half-angle (negative when left of forward).
    pub deg_left: f64,
    /// Right half-angle.
    pub deg_right: f64,
    /// Bottom half-angle (negative when below forward).
    pub deg_bottom: f64,
    /// Top half-angle.
    pub deg_top: f64,
    /// Horizontal FOV.
    pub deg_hor: f64,
    /// Vertical FOV.
    pub deg_ver: f64,
}

impl EyeFov {
    /// FOV point `i` as a vector.
    pub fn point(&self, i: usize) -> Vec3 {
        Vec3::from(self.fov_pts[i])
    }
}

/// How the combined vertical FOV is derived from the two eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalFov {
    /// Mean of the two per-eye vertical spans.
    #[default]
    Average,
    /// Span visible to both eyes: lowest top minus highest bottom.
    MinMax,
}

/// Combined stereo FOV in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalFov {
    /// Horizontal FOV.
    pub fov_hor: f64,
    /// Vertical FOV.
    pub fov_ver: f64,
    /// Diagonal FOV.
    pub fov_diag: f64,
    /// Binocular overlap.
    pub overlap: f64,
}

fn angle_or_err(v1: &Vec3, v2: &Vec3) -> Result<f64> {
    angle_checked(v1, v2).ok_or_else(|| {
        GeomError::DegenerateGeometry(format!(
            "angle between {:?} and {:?} is undefined",
            v1.as_slice(),
            v2.as_slice()
        ))
    })
}

/// Compute the FOV of one eye.
///
/// `mesh` is the reduced hidden area mesh, `rot` the rotation of the panel
/// relative to the reference frame (`None` for eye coordinates).
pub fn calc_fov(raw: &RawEye, mesh: Option<&OptimizedMesh>, rot: Option<&Mat3>) -> Result<EyeFov> {
    let ham = mesh.map(|m| {
        let verts = m.verts_opt.iter().map(|v| Point2::new(v[0], v[1])).collect();
        EdgeMesh::from_faces(verts, &m.faces_opt)
    });
    if let (Some(h), Some(m)) = (&ham, mesh) {
        if let Some(bad) = h.edges.iter().find(|&&(a, b)| a.max(b) >= m.verts_opt.len()) {
            return Err(GeomError::InvalidInput(format!(
                "mask edge {bad:?} indexes past {} vertices",
                m.verts_opt.len()
            )));
        }
    }

    let frustum = Frustum::new(
        raw.tan_left,
        raw.tan_right,
        raw.tan_bottom,
        raw.tan_top,
        rot,
        ham.as_ref(),
    )?;
    let pts = frustum.fov_points(true)?;

    let forward = Vec3::new(0.0, 0.0, -1.0);
    let mut deg = [0.0; FOV_POINT_COUNT];
    for (d, p) in deg.iter_mut().zip(pts.iter()) {
        *d = angle_or_err(&forward, &p.coords)?;
    }

    Ok(EyeFov {
        fov_pts: pts.map(|p: Point3| [p.x, p.y, p.z]),
        deg_left: -deg[7],
        deg_right: deg[3],
        deg_bottom: -deg[1],
        deg_top: deg[5],
        deg_hor: deg[3] + deg[7],
        deg_ver: deg[1] + deg[5],
    })
}

/// Combine the head FOVs of both eyes.
pub fn calc_total_fov(fov_head: &PerEye<EyeFov>, vertical: VerticalFov) -> Result<TotalFov> {
    let (l, r) = (&fov_head.left, &fov_head.right);

    let fov_hor = r.deg_right - l.deg_left;

    let fov_ver = match vertical {
        VerticalFov::Average => {
            let ver_left = l.deg_top - l.deg_bottom;
            let ver_right = r.deg_top - r.deg_bottom;
            (ver_left + ver_right) / 2.0
        }
        VerticalFov::MinMax => l.deg_top.min(r.deg_top) - l.deg_bottom.max(r.deg_bottom),
    };

    // left eye LB to right eye RT, and left eye LT to right eye RB
    let diag1 = angle_or_err(&l.point(0), &r.point(4))?;
    let diag2 = angle_or_err(&l.point(6), &r.point(2))?;
    let fov_diag = (diag1 + diag2) / 2.0;

    let overlap = l.deg_right - r.deg_left;

    Ok(TotalFov {
        fov_hor,
        fov_ver,
        fov_diag,
        overlap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hmdq_math::RigidTransform;

    fn square_eye() -> RawEye {
        RawEye::new(-1.0, 1.0, -1.0, 1.0)
    }

    #[test]
    fn test_calc_fov_symmetric() {
        let fov = calc_fov(&square_eye(), None, None).unwrap();
        assert_relative_eq!(fov.deg_left, -45.0, epsilon = 1e-12);
        assert_relative_eq!(fov.deg_right, 45.0, epsilon = 1e-12);
        assert_relative_eq!(fov.deg_bottom, -45.0, epsilon = 1e-12);
        assert_relative_eq!(fov.deg_top, 45.0, epsilon = 1e-12);
        assert_relative_eq!(fov.deg_hor, 90.0, epsilon = 1e-12);
        assert_relative_eq!(fov.deg_ver, 90.0, epsilon = 1e-12);
        assert_eq!(fov.fov_pts[3], [1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_calc_fov_with_mask() {
        // unit square mask covers the whole canvas, nothing changes
        let mesh = OptimizedMesh {
            ham_area: 1.0,
            verts_raw: None,
            faces_raw: None,
            verts_opt: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            faces_opt: vec![vec![0, 1, 2, 3]],
        };
        let fov = calc_fov(&square_eye(), Some(&mesh), None).unwrap();
        assert_relative_eq!(fov.deg_hor, 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_calc_fov_bad_mesh_index() {
        let mesh = OptimizedMesh {
            ham_area: 0.0,
            verts_raw: None,
            faces_raw: None,
            verts_opt: vec![[0.0, 0.0], [1.0, 0.0]],
            faces_opt: vec![vec![0, 1, 2]],
        };
        let res = calc_fov(&square_eye(), Some(&mesh), None);
        assert!(matches!(res, Err(GeomError::InvalidInput(_))));
    }

    #[test]
    fn test_calc_fov_zero_tangents() {
        let res = calc_fov(&RawEye::new(0.0, 0.0, 0.0, 0.0), None, None);
        assert!(matches!(res, Err(GeomError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_calc_fov_rotated_keeps_span() {
        let rot = RigidTransform::rotation_y(10f64.to_radians()).rotation();
        let fov = calc_fov(&square_eye(), None, Some(&rot)).unwrap();
        assert_relative_eq!(fov.deg_left, -55.0, epsilon = 1e-9);
        assert_relative_eq!(fov.deg_right, 35.0, epsilon = 1e-9);
        assert_relative_eq!(fov.deg_hor, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_total_fov_parallel() {
        let fov = calc_fov(&square_eye(), None, None).unwrap();
        let both = PerEye::new(fov.clone(), fov);
        let tot = calc_total_fov(&both, VerticalFov::Average).unwrap();
        assert_relative_eq!(tot.fov_hor, 90.0, epsilon = 1e-12);
        assert_relative_eq!(tot.fov_ver, 90.0, epsilon = 1e-12);
        assert_relative_eq!(tot.overlap, 90.0, epsilon = 1e-12);
        // angle between (-1, -1, -1) and (1, 1, -1)
        let expected = (-1.0f64 / 3.0).acos().to_degrees();
        assert_relative_eq!(tot.fov_diag, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_total_fov_vertical_modes() {
        let left = calc_fov(&RawEye::new(-1.0, 1.0, -1.0, 0.5), None, None).unwrap();
        let right = calc_fov(&RawEye::new(-1.0, 1.0, -0.5, 1.0), None, None).unwrap();
        let both = PerEye::new(left, right);
        let t45 = 45.0;
        let t26 = 0.5f64.atan().to_degrees();

        let avg = calc_total_fov(&both, VerticalFov::Average).unwrap();
        assert_relative_eq!(avg.fov_ver, t45 + t26, epsilon = 1e-9);

        let minmax = calc_total_fov(&both, VerticalFov::MinMax).unwrap();
        assert_relative_eq!(minmax.fov_ver, 2.0 * t26, epsilon = 1e-9);
    }

    #[test]
    fn test_vertical_fov_serde() {
        let v: VerticalFov = serde_json::from_str("\"min_max\"").unwrap();
        assert_eq!(v, VerticalFov::MinMax);
        assert_eq!(VerticalFov::default(), VerticalFov::Average);
    }
}
