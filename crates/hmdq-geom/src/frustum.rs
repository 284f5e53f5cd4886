//! View frustum and FOV point search.
//!
//! A frustum is given by four tangents (left, right, bottom, top) of a
//! projection plane at `z = -1`, optionally rotated (canted panels) and
//! optionally masked by a hidden area mesh (HAM) defined in UV space. The
//! visible FOV is sampled in eight directions: the four corners and the four
//! mid-edge directions, ordered LB, B, RB, R, RT, T, LT, L.
//!
//! For each direction a cut plane through the eye center, the forward vector
//! and the direction point is intersected with every HAM edge. A second
//! "polarity" plane tells on which side of the view the direction lies, so
//! that only intersections on the same side are considered. The intersection
//! closest to the center is the FOV point.

use hmdq_math::{matmul, norm, Mat3, Point2, Point3, Vec3, DOUBLE_EPS_100};
use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{GeomError, Result};
use crate::mesh::EdgeMesh;

/// Number of FOV directions sampled by a frustum.
pub const FOV_POINT_COUNT: usize = 8;

/// For each direction, the index of the direction whose cut plane decides
/// the polarity. Horizontal plane (R) for everything but the left and right
/// mid-edges, which use the vertical plane (B).
pub const POLARITY_PLANE_INDEXES: [usize; FOV_POINT_COUNT] = [3, 3, 3, 1, 3, 3, 3, 1];

/// Whether the forward axis `(0, 0, -1)` points strictly inside the frustum
/// `[left, right] x [bottom, top]` rotated by `rot`.
///
/// Every FOV direction is searched on the frustum border around the forward
/// axis, so a frustum which does not enclose it has no FOV points.
pub fn contains_forward_axis(
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    rot: Option<&Mat3>,
) -> bool {
    let forward = Vec3::new(0.0, 0.0, -1.0);
    // forward axis in the unrotated frustum coordinates
    let dir = match rot {
        Some(r) => r.transpose() * forward,
        None => forward,
    };
    if dir.z > -DOUBLE_EPS_100 {
        return false;
    }
    let (x, y) = (dir.x / -dir.z, dir.y / -dir.z);
    left < x && x < right && bottom < y && y < top
}

/// A plane in Hessian normal form `n . x + offset = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed offset from the origin.
    pub offset: f64,
}

impl Plane {
    /// Plane through three points, normal `(p2 - p0) x (p1 - p0)`.
    ///
    /// Returns [`GeomError::DegenerateGeometry`] if the points are collinear.
    pub fn through(p0: &Point3, p1: &Point3, p2: &Point3) -> Result<Self> {
        let normal = (p2 - p0).cross(&(p1 - p0));
        let len = norm(&normal);
        if !len.is_finite() || len <= DOUBLE_EPS_100 {
            return Err(GeomError::DegenerateGeometry(format!(
                "cannot build a plane through collinear points {:?}, {:?}, {:?}",
                p0.coords.as_slice(),
                p1.coords.as_slice(),
                p2.coords.as_slice()
            )));
        }
        let normal = normal / len;
        Ok(Self {
            normal,
            offset: -p0.coords.dot(&normal),
        })
    }

    /// Signed distance of a point from the plane.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) + self.offset
    }

    /// Side of the plane the point lies on: `1`, `-1`, or `0` when it is
    /// within tolerance of the plane.
    pub fn polarity(&self, p: &Point3) -> i8 {
        let d = self.signed_distance(p);
        if d.abs() <= DOUBLE_EPS_100 {
            0
        } else if d.is_sign_negative() {
            -1
        } else {
            1
        }
    }
}

/// A parametrized line `origin + t * dir` with unit `dir`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Line {
    origin: Point3,
    dir: Vec3,
}

impl Line {
    /// Line through two points, `None` if they coincide.
    fn through(p1: &Point3, p2: &Point3) -> Option<Self> {
        let d = p2 - p1;
        let len = norm(&d);
        (len > DOUBLE_EPS_100).then(|| Self {
            origin: *p1,
            dir: d / len,
        })
    }

    /// Parameter `t` of the intersection with `plane`, `None` if parallel.
    fn intersection_parameter(&self, plane: &Plane) -> Option<f64> {
        let denom = plane.normal.dot(&self.dir);
        if denom.abs() < DOUBLE_EPS_100 {
            return None;
        }
        Some(-(plane.offset + plane.normal.dot(&self.origin.coords)) / denom)
    }

    fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.dir * t
    }
}

/// A view frustum with its hidden area mesh lifted into 3D.
#[derive(Debug, Clone)]
pub struct Frustum {
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    rotation: Option<Mat3>,
    out_points: [Point3; FOV_POINT_COUNT],
    point_planes: Vec<Plane>,
    ham3d: EdgeMesh<Point3>,
}

impl Frustum {
    /// Build a frustum from the LRBT tangents.
    ///
    /// `rot` rotates the frustum corners and the mask (canted panel), `ham`
    /// is the hidden area mesh in UV space. The boundary of the full LRBT
    /// rectangle is always added to the mask, so every direction finds a
    /// point even where the mask does not reach the frustum edge.
    ///
    /// Returns [`GeomError::InvalidInput`] for non-finite values or inverted
    /// bounds and [`GeomError::DegenerateGeometry`] for a frustum with no
    /// extent or one which does not enclose the forward axis.
    pub fn new(
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        rot: Option<&Mat3>,
        ham: Option<&EdgeMesh<Point2>>,
    ) -> Result<Self> {
        if ![left, right, bottom, top].iter().all(|v| v.is_finite()) {
            return Err(GeomError::InvalidInput(format!(
                "non-finite frustum tangents [{left}, {right}, {bottom}, {top}]"
            )));
        }
        if left > right || bottom > top {
            return Err(GeomError::InvalidInput(format!(
                "inverted frustum tangents [{left}, {right}, {bottom}, {top}]"
            )));
        }
        if left == right || bottom == top {
            return Err(GeomError::DegenerateGeometry(format!(
                "frustum has no extent [{left}, {right}, {bottom}, {top}]"
            )));
        }
        if let Some(r) = rot {
            if !r.iter().all(|v| v.is_finite()) {
                return Err(GeomError::InvalidInput("non-finite rotation".into()));
            }
        }
        if !contains_forward_axis(left, right, bottom, top, rot) {
            return Err(GeomError::DegenerateGeometry(format!(
                "frustum [{left}, {right}, {bottom}, {top}]{} does not contain the forward axis",
                if rot.is_some() { " (rotated)" } else { "" }
            )));
        }

        let mut out_points = [
            Point3::new(left, bottom, -1.0),
            Point3::new(0.0, -1.0, -1.0),
            Point3::new(right, bottom, -1.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(right, top, -1.0),
            Point3::new(0.0, 1.0, -1.0),
            Point3::new(left, top, -1.0),
            Point3::new(-1.0, 0.0, -1.0),
        ];
        // only the corners follow the panel rotation
        if let Some(r) = rot {
            for i in [0, 2, 4, 6] {
                out_points[i] = Point3::from(r * out_points[i].coords);
            }
        }

        let mut frustum = Self {
            left,
            right,
            bottom,
            top,
            rotation: rot.copied(),
            out_points,
            point_planes: Vec::with_capacity(FOV_POINT_COUNT),
            ham3d: EdgeMesh::default(),
        };

        let mut ham2d = match ham {
            Some(h) => {
                if !h.verts.iter().all(|v| v.x.is_finite() && v.y.is_finite()) {
                    return Err(GeomError::InvalidInput(
                        "non-finite hidden area mesh vertex".into(),
                    ));
                }
                h.clone()
            }
            None => EdgeMesh::default(),
        };
        let canvas = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        ham2d.add_mesh(&canvas, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        frustum.ham3d = frustum.ham_3d(&ham2d);

        let center = Point3::origin();
        let forward = Point3::new(0.0, 0.0, -1.0);
        frustum.point_planes = frustum
            .out_points
            .iter()
            .map(|p| Plane::through(&center, p, &forward))
            .collect::<Result<Vec<_>>>()?;

        Ok(frustum)
    }

    /// The LRBT tangents.
    pub fn lrbt(&self) -> [f64; 4] {
        [self.left, self.right, self.bottom, self.top]
    }

    /// The mask lifted into the (rotated) frustum, including the LRBT border.
    pub fn ham_3d_mesh(&self) -> &EdgeMesh<Point3> {
        &self.ham3d
    }

    /// Transformation from UV space into the LRBT rectangle, as a homogeneous
    /// 3x3 matrix.
    fn uv_to_lrbt(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(
            3,
            3,
            &[
                self.right - self.left,
                0.0,
                self.left,
                0.0,
                self.top - self.bottom,
                self.bottom,
                0.0,
                0.0,
                1.0,
            ],
        )
    }

    /// Lift the UV mesh onto the `z = -1` plane of the frustum and rotate it.
    fn ham_3d(&self, ham2d: &EdgeMesh<Point2>) -> EdgeMesh<Point3> {
        let n = ham2d.verts.len();
        let verts_h = DMatrix::from_fn(n, 3, |r, c| match c {
            0 => ham2d.verts[r].x,
            1 => ham2d.verts[r].y,
            _ => 1.0,
        });
        let mut verts = matmul(&verts_h, &self.uv_to_lrbt().transpose());
        // homogeneous coordinate becomes the projection plane depth
        verts.column_mut(2).fill(-1.0);
        if let Some(r) = &self.rotation {
            let rt = DMatrix::from_fn(3, 3, |i, j| r[(j, i)]);
            verts = matmul(&verts, &rt);
        }
        let points = (0..n)
            .map(|i| Point3::new(verts[(i, 0)], verts[(i, 1)], verts[(i, 2)]))
            .collect();
        EdgeMesh::new(points, ham2d.edges.clone())
    }

    /// Intersection of the `n`-th cut plane with the mask closest to the
    /// eye center.
    ///
    /// # Panics
    ///
    /// Panics if no mask edge crosses the cut plane on the right side, which
    /// only happens with a malformed mask.
    fn raw_fov_point(&self, n: usize) -> Point3 {
        let pol_plane = &self.point_planes[POLARITY_PLANE_INDEXES[n]];
        let cut_plane = &self.point_planes[n];
        let out_pol = pol_plane.polarity(&self.out_points[n]);
        let center = Point3::origin();

        let mut best: Option<(f64, Point3)> = None;
        for (p1, p2) in self.ham3d.segments() {
            let Some(line) = Line::through(p1, p2) else {
                continue;
            };
            let limit = (p2 - p1).norm();
            let Some(t) = line.intersection_parameter(cut_plane) else {
                continue;
            };
            if t < -DOUBLE_EPS_100 || t > limit + DOUBLE_EPS_100 {
                continue;
            }
            let pt = line.point_at(t);
            if pol_plane.polarity(&pt) != out_pol {
                continue;
            }
            let dist = (pt - center).norm();
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, pt));
            }
        }

        match best {
            Some((_, pt)) => pt,
            None => panic!(
                "raw_fov_point: no mask edge crosses the cut plane of direction {n} \
                 (frustum [{}, {}, {}, {}])",
                self.left, self.right, self.bottom, self.top
            ),
        }
    }

    /// The eight FOV points in the order LB, B, RB, R, RT, T, LT, L.
    ///
    /// Components within tolerance of zero are snapped to zero. With
    /// `projected`, every point is scaled onto the `|z| = 1` plane; a point
    /// with no depth then yields [`GeomError::DegenerateGeometry`].
    pub fn fov_points(&self, projected: bool) -> Result<[Point3; FOV_POINT_COUNT]> {
        let raw: Vec<Point3> = (0..FOV_POINT_COUNT)
            .into_par_iter()
            .map(|n| self.raw_fov_point(n))
            .collect();

        let mut points = [Point3::origin(); FOV_POINT_COUNT];
        for (dst, src) in points.iter_mut().zip(raw) {
            *dst = src.map(|c| if c.abs() < DOUBLE_EPS_100 { 0.0 } else { c });
        }

        if projected {
            for p in points.iter_mut() {
                let z = p.z.abs();
                if z < DOUBLE_EPS_100 {
                    return Err(GeomError::DegenerateGeometry(format!(
                        "FOV point {:?} cannot be projected, it has no depth",
                        p.coords.as_slice()
                    )));
                }
                *p /= z;
            }
        }

        debug!(
            lrbt = ?self.lrbt(),
            rotated = self.rotation.is_some(),
            mask_edges = self.ham3d.edges.len(),
            "computed FOV points"
        );
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hmdq_math::{angle_deg, RigidTransform};

    fn assert_point(p: &Point3, x: f64, y: f64, z: f64) {
        assert_relative_eq!(p.x, x, epsilon = 1e-12);
        assert_relative_eq!(p.y, y, epsilon = 1e-12);
        assert_relative_eq!(p.z, z, epsilon = 1e-12);
    }

    #[test]
    fn test_plane_through() {
        let plane = Plane::through(
            &Point3::origin(),
            &Point3::new(1.0, 0.0, -1.0),
            &Point3::new(0.0, 0.0, -1.0),
        )
        .unwrap();
        // horizontal plane y = 0
        assert_relative_eq!(plane.normal.y.abs(), 1.0);
        assert_eq!(plane.offset, 0.0);
        assert_eq!(plane.polarity(&Point3::new(5.0, 0.0, -3.0)), 0);
        assert_ne!(plane.polarity(&Point3::new(0.0, 1.0, -1.0)), 0);
        assert_eq!(
            plane.polarity(&Point3::new(0.0, 1.0, -1.0)),
            -plane.polarity(&Point3::new(0.0, -1.0, -1.0))
        );
    }

    #[test]
    fn test_plane_through_collinear() {
        let res = Plane::through(
            &Point3::origin(),
            &Point3::new(0.0, 0.0, -2.0),
            &Point3::new(0.0, 0.0, -1.0),
        );
        assert!(matches!(res, Err(GeomError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_line_plane_intersection() {
        let plane = Plane::through(
            &Point3::origin(),
            &Point3::new(1.0, 0.0, -1.0),
            &Point3::new(0.0, 0.0, -1.0),
        )
        .unwrap();
        let line = Line::through(&Point3::new(0.5, -1.0, -1.0), &Point3::new(0.5, 1.0, -1.0)).unwrap();
        let t = line.intersection_parameter(&plane).unwrap();
        assert_relative_eq!(t, 1.0, epsilon = 1e-12);
        assert_point(&line.point_at(t), 0.5, 0.0, -1.0);

        let parallel =
            Line::through(&Point3::new(0.0, 0.0, -1.0), &Point3::new(1.0, 0.0, -1.0)).unwrap();
        assert!(parallel.intersection_parameter(&plane).is_none());
        assert!(Line::through(&Point3::origin(), &Point3::origin()).is_none());
    }

    #[test]
    fn test_symmetric_frustum_points() {
        let f = Frustum::new(-1.0, 1.0, -1.0, 1.0, None, None).unwrap();
        let pts = f.fov_points(true).unwrap();
        assert_point(&pts[0], -1.0, -1.0, -1.0);
        assert_point(&pts[1], 0.0, -1.0, -1.0);
        assert_point(&pts[2], 1.0, -1.0, -1.0);
        assert_point(&pts[3], 1.0, 0.0, -1.0);
        assert_point(&pts[4], 1.0, 1.0, -1.0);
        assert_point(&pts[5], 0.0, 1.0, -1.0);
        assert_point(&pts[6], -1.0, 1.0, -1.0);
        assert_point(&pts[7], -1.0, 0.0, -1.0);

        let fwd = Vec3::new(0.0, 0.0, -1.0);
        assert_relative_eq!(angle_deg(&fwd, &pts[3].coords), 45.0, epsilon = 1e-12);
        assert_relative_eq!(angle_deg(&fwd, &pts[7].coords), 45.0, epsilon = 1e-12);
    }

    #[test]
    fn test_asymmetric_frustum_points() {
        let f = Frustum::new(-1.5, 1.0, -1.2, 0.8, None, None).unwrap();
        let pts = f.fov_points(false).unwrap();
        assert_point(&pts[1], 0.0, -1.2, -1.0);
        assert_point(&pts[3], 1.0, 0.0, -1.0);
        assert_point(&pts[5], 0.0, 0.8, -1.0);
        assert_point(&pts[7], -1.5, 0.0, -1.0);
        assert_point(&pts[4], 1.0, 0.8, -1.0);
    }

    #[test]
    fn test_mask_limits_fov() {
        // mask edge crossing the right half at u = 0.75 (x = 0.5)
        let ham = EdgeMesh::new(
            vec![Point2::new(0.75, 0.0), Point2::new(0.75, 1.0)],
            vec![(0, 1)],
        );
        let f = Frustum::new(-1.0, 1.0, -1.0, 1.0, None, Some(&ham)).unwrap();
        let pts = f.fov_points(false).unwrap();
        assert_point(&pts[3], 0.5, 0.0, -1.0);
        // the left side is untouched
        assert_point(&pts[7], -1.0, 0.0, -1.0);
        // the top-right corner direction meets the mask edge at (0.5, 0.5)
        assert_point(&pts[4], 0.5, 0.5, -1.0);
    }

    #[test]
    fn test_rotated_frustum() {
        let rot = RigidTransform::rotation_y(10f64.to_radians()).rotation();
        let f = Frustum::new(-1.0, 1.0, -1.0, 1.0, Some(&rot), None).unwrap();
        let pts = f.fov_points(true).unwrap();
        let fwd = Vec3::new(0.0, 0.0, -1.0);
        // rotating around Y by +10 deg turns the view to the left
        assert_relative_eq!(angle_deg(&fwd, &pts[3].coords), 35.0, epsilon = 1e-9);
        assert_relative_eq!(angle_deg(&fwd, &pts[7].coords), 55.0, epsilon = 1e-9);
        assert!(pts[7].x < 0.0);
    }

    #[test]
    fn test_zero_frustum_is_degenerate() {
        let res = Frustum::new(0.0, 0.0, 0.0, 0.0, None, None);
        assert!(matches!(res, Err(GeomError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_invalid_frustum_input() {
        assert!(matches!(
            Frustum::new(1.0, -1.0, -1.0, 1.0, None, None),
            Err(GeomError::InvalidInput(_))
        ));
        assert!(matches!(
            Frustum::new(f64::NAN, 1.0, -1.0, 1.0, None, None),
            Err(GeomError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_frustum_must_contain_forward_axis() {
        for lrbt in [
            [0.0, 1.0, -1.0, 1.0],
            [-1.0, 1.0, 0.0, 1.0],
            [0.2, 1.0, -1.0, 1.0],
            [-1.0, 1.0, -1.0, -0.1],
        ] {
            let res = Frustum::new(lrbt[0], lrbt[1], lrbt[2], lrbt[3], None, None);
            assert!(
                matches!(res, Err(GeomError::DegenerateGeometry(_))),
                "{lrbt:?} accepted"
            );
        }
    }

    #[test]
    fn test_corner_on_forward_axis_explained() {
        let res = Frustum::new(0.0, 1.0, 0.0, 1.0, None, None);
        match res {
            Err(GeomError::DegenerateGeometry(msg)) => assert!(msg.contains("forward axis")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rotation_past_half_fov_is_degenerate() {
        let rot = RigidTransform::rotation_y(60f64.to_radians()).rotation();
        let res = Frustum::new(-1.0, 1.0, -1.0, 1.0, Some(&rot), None);
        assert!(matches!(res, Err(GeomError::DegenerateGeometry(_))));

        let rot = RigidTransform::rotation_y(40f64.to_radians()).rotation();
        assert!(contains_forward_axis(-1.0, 1.0, -1.0, 1.0, Some(&rot)));
        // facing backwards
        let rot = RigidTransform::rotation_y(180f64.to_radians()).rotation();
        assert!(!contains_forward_axis(-1.0, 1.0, -1.0, 1.0, Some(&rot)));
    }

    #[test]
    fn test_ham_3d_includes_canvas() {
        let ham = EdgeMesh::new(
            vec![Point2::new(0.5, 0.0), Point2::new(0.5, 1.0)],
            vec![(0, 1)],
        );
        let f = Frustum::new(-2.0, 2.0, -1.0, 1.0, None, Some(&ham)).unwrap();
        let mesh = f.ham_3d_mesh();
        assert_eq!(mesh.verts.len(), 6);
        assert_eq!(mesh.edges, vec![(0, 1), (2, 3), (3, 4), (4, 5), (5, 2)]);
        assert_point(&mesh.verts[0], 0.0, -1.0, -1.0);
        assert_point(&mesh.verts[4], 2.0, 1.0, -1.0);
    }
}
