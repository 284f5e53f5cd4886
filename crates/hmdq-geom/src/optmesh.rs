//! Hidden area mesh topology reduction.
//!
//! Runtimes hand out the hidden area mask as a triangle soup: every three
//! consecutive vertices form one triangle. This module removes duplicate
//! vertices and then merges triangles sharing edges into larger polygons,
//! which is both compact to store and cheaper to intersect.
//!
//! Merging is only defined for meshes where two faces touch along a single
//! continuous chain of edges. Anything else means the input is not a valid
//! triangle mesh and the reducer panics.

use std::collections::VecDeque;

use tracing::debug;

use crate::mesh::{face_to_edges, Edge, Face};

/// Index of `v` in `verts` using exact equality.
pub fn v_in_verts<V: PartialEq>(v: &V, verts: &[V]) -> Option<usize> {
    verts.iter().position(|x| x == v)
}

/// Remove duplicate vertices and re-index the faces accordingly.
///
/// Vertices are compared with exact floating point equality. Vertices that
/// differ only by rounding noise from the runtime are kept as distinct.
pub fn reduce_verts<V: PartialEq + Clone>(verts: &[V], faces: &[Face]) -> (Vec<V>, Vec<Face>) {
    let mut r_verts: Vec<V> = Vec::new();
    let mut r_faces = Vec::with_capacity(faces.len());
    for face in faces {
        let new_face = face
            .iter()
            .map(|&vi| {
                let v = &verts[vi];
                v_in_verts(v, &r_verts).unwrap_or_else(|| {
                    r_verts.push(v.clone());
                    r_verts.len() - 1
                })
            })
            .collect();
        r_faces.push(new_face);
    }
    (r_verts, r_faces)
}

/// Orient every edge so that the first vertex has the lower index.
pub fn sort_edges(edges: &[Edge]) -> Vec<Edge> {
    edges
        .iter()
        .map(|&(a, b)| if a <= b { (a, b) } else { (b, a) })
        .collect()
}

/// Edges present in both lists, regardless of direction.
///
/// The result is canonically oriented and sorted.
pub fn shared_edges(edges1: &[Edge], edges2: &[Edge]) -> Vec<Edge> {
    let mut te1 = sort_edges(edges1);
    let mut te2 = sort_edges(edges2);
    te1.sort_unstable();
    te2.sort_unstable();

    let (mut i, mut j) = (0, 0);
    let mut res = Vec::new();
    while i < te1.len() && j < te2.len() {
        match te1[i].cmp(&te2[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                res.push(te1[i]);
                i += 1;
                j += 1;
            }
        }
    }
    res
}

/// Reverse the order of the edges and the direction of each edge.
pub fn reverse_edges(edges: &[Edge]) -> Vec<Edge> {
    edges.iter().rev().map(|&(a, b)| (b, a)).collect()
}

/// True if the edges connect the same vertices, in either direction.
#[inline]
pub fn match_edges(e1: Edge, e2: Edge) -> bool {
    e1 == e2 || (e1.0 == e2.1 && e1.1 == e2.0)
}

/// Build a face from two open edge chains.
///
/// The second chain is reversed when it does not start where the first one
/// ends.
pub fn build_face(edges1: &[Edge], edges2: &[Edge]) -> Face {
    let continues = matches!(
        (edges1.last(), edges2.first()),
        (Some(last), Some(first)) if last.1 == first.0
    );
    let te2 = if continues {
        edges2.to_vec()
    } else {
        reverse_edges(edges2)
    };
    edges1.iter().chain(te2.iter()).map(|e| e.0).collect()
}

/// Remove the continuous `chain` from the closed loop `edges` and return
/// what remains, again as one continuous open chain.
///
/// The chain may run along `edges` in either direction.
///
/// # Panics
///
/// Panics if the chain is not present in `edges`.
pub fn remove_chain(chain: &[Edge], edges: &[Edge]) -> Vec<Edge> {
    let se = edges.len();
    let len = chain.len();
    let mut found: Option<(usize, bool)> = None;
    for i in 0..se {
        if !match_edges(chain[0], edges[i]) {
            continue;
        }
        if len == 1 || match_edges(chain[1], edges[(i + 1) % se]) {
            found = Some((i, true));
            break;
        }
        if match_edges(chain[1], edges[(i + se - 1) % se]) {
            found = Some((i, false));
            break;
        }
    }

    let (pivot, forward) = match found {
        Some(f) => f,
        None => panic!(
            "remove_chain: chain {:?} is not part of the edge loop {:?}",
            chain, edges
        ),
    };

    // the remainder starts right after the chain end (forward) or right
    // after the pivot (backward) and wraps around the loop
    let start = if forward { pivot + len } else { pivot + 1 };
    (0..se - len).map(|k| edges[(start + k) % se]).collect()
}

/// Merge two faces, given as edge loops, along their shared `chain`.
///
/// # Panics
///
/// Panics if the chain is missing from either loop, if it covers a whole
/// loop (the faces overlap) or if the merged face has fewer than three
/// vertices.
pub fn merge_edges(edges1: &[Edge], edges2: &[Edge], chain: &[Edge]) -> Face {
    assert!(
        chain.len() < edges1.len() && chain.len() < edges2.len(),
        "merge_edges: chain {:?} covers a whole face ({:?} and {:?})",
        chain,
        edges1,
        edges2
    );
    let tes1 = remove_chain(chain, edges1);
    let tes2 = remove_chain(chain, edges2);
    let face = build_face(&tes1, &tes2);
    assert!(
        face.len() >= 3,
        "merge_edges: merged face {face:?} has fewer than three vertices"
    );
    face
}

/// Check that the edges form one unbroken path.
///
/// If they do, the list is rotated so it starts right after the single
/// discontinuity. If there is more than one discontinuity the result is
/// empty.
pub fn check_chained(edges: &[Edge]) -> Vec<Edge> {
    let se = edges.len();
    if se <= 1 {
        return edges.to_vec();
    }

    let touches = |a: Edge, b: Edge| a.0 == b.0 || a.0 == b.1 || a.1 == b.0 || a.1 == b.1;

    let mut chained = 0;
    let mut split = 0;
    for i in 0..se {
        if touches(edges[i], edges[(i + 1) % se]) {
            chained += 1;
        } else {
            split = i;
        }
    }

    if chained + 1 < se {
        return Vec::new();
    }
    if se == 2 {
        return edges.to_vec();
    }
    let mut res = edges[split + 1..].to_vec();
    res.extend_from_slice(&edges[..split + 1]);
    res
}

/// Merge faces which share edges into larger polygons.
///
/// Each face in turn becomes an accumulator which absorbs every other face
/// it shares edges with, until a full pass finds nothing more to merge.
///
/// # Panics
///
/// Panics if two faces share edges which do not form a single chain, or
/// share their whole edge loop.
pub fn reduce_faces(faces: &[Face]) -> Vec<Face> {
    let mut nfaces = Vec::new();
    let mut tfaces: VecDeque<Face> = faces.iter().cloned().collect();

    while tfaces.len() >= 2 {
        let Some(mut face) = tfaces.pop_front() else {
            break;
        };
        let mut found = true;
        while found {
            found = false;
            let mut checked = VecDeque::with_capacity(tfaces.len());
            while let Some(f) = tfaces.pop_front() {
                let edges1 = face_to_edges(&face);
                let edges2 = face_to_edges(&f);
                let shared = shared_edges(&edges1, &edges2);
                if shared.is_empty() {
                    checked.push_back(f);
                    continue;
                }
                let chain = check_chained(&shared);
                assert!(
                    !chain.is_empty(),
                    "reduce_faces: shared edges {:?} of faces {:?} and {:?} are not chained",
                    shared,
                    face,
                    f
                );
                face = merge_edges(&edges1, &edges2, &chain);
                found = true;
            }
            tfaces = checked;
        }
        nfaces.push(face);
    }
    nfaces.extend(tfaces);
    debug!(
        faces_in = faces.len(),
        faces_out = nfaces.len(),
        "reduced mesh faces"
    );
    nfaces
}
