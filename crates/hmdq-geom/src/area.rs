//! Surface area of triangle meshes.

use hmdq_math::{dot_prod, Point2};
use nalgebra::SVector;

use crate::mesh::Face;
use crate::polygon::Polygon;

/// Area of the triangle given by its vertices.
///
/// Uses `sqrt(|ab|^2 |ac|^2 - (ab.ac)^2) / 2`, which works in any dimension.
/// Degenerate triangles give zero (never NaN from rounding).
pub fn area_triangle<const D: usize>(
    v1: &SVector<f64, D>,
    v2: &SVector<f64, D>,
    v3: &SVector<f64, D>,
) -> f64 {
    let ab = v2 - v1;
    let ac = v3 - v1;
    let ab_ac = dot_prod(&ab, &ac);
    let sq = dot_prod(&ab, &ab) * dot_prod(&ac, &ac) - ab_ac * ab_ac;
    sq.max(0.0).sqrt() / 2.0
}

/// Area of a mesh given as raw triangles, every three consecutive vertices
/// forming one triangle. Trailing vertices that do not form a full triangle
/// are ignored.
pub fn area_mesh_raw(verts: &[Point2]) -> f64 {
    verts
        .chunks_exact(3)
        .map(|t| area_triangle(&t[0].coords, &t[1].coords, &t[2].coords))
        .sum()
}

/// Area of a mesh of indexed triangles.
///
/// # Panics
///
/// Panics if any face is not a triangle.
pub fn area_mesh_tris_idx(verts: &[Point2], tris: &[Face]) -> f64 {
    tris.iter()
        .map(|face| {
            assert_eq!(face.len(), 3, "area_mesh_tris_idx: face {face:?} is not a triangle");
            area_triangle(
                &verts[face[0]].coords,
                &verts[face[1]].coords,
                &verts[face[2]].coords,
            )
        })
        .sum()
}

/// Area of a mesh of indexed triangles, counting only the part of each
/// triangle inside the unit UV canvas `[0, 1] x [0, 1]`.
///
/// # Panics
///
/// Panics if any face is not a triangle.
pub fn area_mesh_tris_clipped(verts: &[Point2], tris: &[Face]) -> f64 {
    let canvas = Polygon::unit_square();
    tris.iter()
        .map(|face| {
            assert_eq!(
                face.len(),
                3,
                "area_mesh_tris_clipped: face {face:?} is not a triangle"
            );
            let tri = Polygon::new(face.iter().map(|&i| verts[i]).collect());
            tri.clip_convex(&canvas).area()
        })
        .sum()
}
