//! Property-based tests for the mesh topology reducer.
//!
//! Run with: cargo test -p hmdq-geom -- proptest

use hmdq_geom::optmesh::{match_edges, reverse_edges, shared_edges, sort_edges};
use hmdq_geom::{area_mesh_tris_clipped, area_mesh_tris_idx, reduce_verts, Edge, Face};
use hmdq_math::Point2;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Vertices snapped to a coarse grid so that duplicates actually occur.
fn arb_vert() -> impl Strategy<Value = [f64; 2]> {
    (0u8..4, 0u8..4).prop_map(|(u, v)| [f64::from(u) / 3.0, f64::from(v) / 3.0])
}

/// A triangle soup with valid face indices.
fn arb_soup() -> impl Strategy<Value = (Vec<[f64; 2]>, Vec<Face>)> {
    (1usize..12).prop_flat_map(|ntris| {
        prop::collection::vec(arb_vert(), ntris * 3).prop_map(|verts| {
            let faces = (0..verts.len())
                .step_by(3)
                .map(|i| vec![i, i + 1, i + 2])
                .collect();
            (verts, faces)
        })
    })
}

fn arb_edges() -> impl Strategy<Value = Vec<Edge>> {
    prop::collection::vec((0usize..10, 0usize..10), 0..20)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_reduce_verts_preserves_positions((verts, faces) in arb_soup()) {
        let (new_verts, new_faces) = reduce_verts(&verts, &faces);
        prop_assert_eq!(new_faces.len(), faces.len());
        for (face, new_face) in faces.iter().zip(&new_faces) {
            prop_assert_eq!(face.len(), new_face.len());
            for (&vi, &ni) in face.iter().zip(new_face) {
                prop_assert_eq!(verts[vi], new_verts[ni]);
            }
        }
    }

    #[test]
    fn proptest_reduce_verts_is_unique((verts, faces) in arb_soup()) {
        let (new_verts, _) = reduce_verts(&verts, &faces);
        for (i, a) in new_verts.iter().enumerate() {
            for b in &new_verts[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
        prop_assert!(new_verts.len() <= verts.len());
    }

    #[test]
    fn proptest_reduce_verts_is_idempotent((verts, faces) in arb_soup()) {
        let (v1, f1) = reduce_verts(&verts, &faces);
        let (v2, f2) = reduce_verts(&v1, &f1);
        prop_assert_eq!(v1, v2);
        prop_assert_eq!(f1, f2);
    }

    #[test]
    fn proptest_shared_edges_symmetric(e1 in arb_edges(), e2 in arb_edges()) {
        prop_assert_eq!(shared_edges(&e1, &e2), shared_edges(&e2, &e1));
    }

    #[test]
    fn proptest_shared_edges_with_self(e in arb_edges()) {
        let mut expected = sort_edges(&e);
        expected.sort_unstable();
        prop_assert_eq!(shared_edges(&e, &e), expected);
    }

    #[test]
    fn proptest_reverse_edges_involution(e in arb_edges()) {
        prop_assert_eq!(reverse_edges(&reverse_edges(&e)), e.clone());
        let rev = reverse_edges(&e);
        for (a, b) in e.iter().zip(rev.iter().rev()) {
            prop_assert!(match_edges(*a, *b));
        }
    }

    #[test]
    fn proptest_clipped_area_bounded((verts, faces) in arb_soup()) {
        let points: Vec<Point2> = verts.iter().map(|v| Point2::new(v[0], v[1])).collect();
        let full = area_mesh_tris_idx(&points, &faces);
        let clipped = area_mesh_tris_clipped(&points, &faces);
        // the grid lies within the canvas, so clipping changes nothing
        prop_assert!((full - clipped).abs() < 1e-9);
    }
}
