//! Headset geometry: everything derived from the collected view data.

use std::collections::{BTreeMap, BTreeSet};

use hmdq_math::Point2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::area::{area_mesh_tris_clipped, area_mesh_tris_idx};
use crate::error::{GeomError, Result};
use crate::fov::{calc_fov, calc_total_fov, VerticalFov};
use crate::frustum::contains_forward_axis;
use crate::mesh::Face;
use crate::model::{Eye, GeometryInput, GeometryOutput, HamMeshInput, OptimizedMesh, PerEye};
use crate::optmesh::{reduce_faces, reduce_verts};
use crate::view::calc_view_geom;

/// How the hidden area mesh area is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaMethod {
    /// Plain sum of the triangle areas.
    #[default]
    Triangles,
    /// Only the part of each triangle inside the UV canvas.
    Clipped,
}

/// Options for [`calc_geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryOptions {
    /// Combined vertical FOV formula.
    pub vertical_fov: VerticalFov,
    /// Hidden area mesh area measure.
    pub area_method: AreaMethod,
}

fn check_faces(faces: &[Face], nverts: usize) -> Result<()> {
    for face in faces {
        if face.len() != 3 {
            return Err(GeomError::InvalidInput(format!(
                "hidden area mesh face {face:?} is not a triangle"
            )));
        }
        if let Some(&i) = face.iter().find(|&&i| i >= nverts) {
            return Err(GeomError::InvalidInput(format!(
                "hidden area mesh face {face:?} references vertex {i} of {nverts}"
            )));
        }
    }
    Ok(())
}

/// After vertex deduplication every triangle must have three distinct
/// vertices and no two triangles may cover the same vertices.
fn check_distinct_faces(faces: &[Face]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for face in faces {
        let mut key = face.clone();
        key.sort_unstable();
        if key.windows(2).any(|w| w[0] == w[1]) {
            return Err(GeomError::InvalidInput(format!(
                "hidden area mesh face {face:?} has coincident vertices"
            )));
        }
        if !seen.insert(key) {
            return Err(GeomError::InvalidInput(format!(
                "hidden area mesh face {face:?} is repeated"
            )));
        }
    }
    Ok(())
}

/// Reduce the hidden area mesh topology and measure its area.
///
/// Vertices come from `verts_raw`, or from `verts_opt` when the runtime
/// already reports indexed vertices. Faces come from `faces_raw` (or
/// `faces_opt` for raw vertices without raw faces); without faces every three
/// consecutive vertices form one triangle.
pub fn calc_opt_ham_mesh(ham: &HamMeshInput, area: AreaMethod) -> Result<OptimizedMesh> {
    let verts_raw = ham
        .verts_raw
        .as_ref()
        .or(ham.verts_opt.as_ref())
        .ok_or_else(|| GeomError::InvalidInput("hidden area mesh has no vertices".into()))?;
    if !verts_raw.iter().flatten().all(|c| c.is_finite()) {
        return Err(GeomError::InvalidInput(
            "hidden area mesh has non-finite vertices".into(),
        ));
    }

    // indexed vertices go with raw faces
    let faces_src = if ham.faces_raw.is_some() || ham.verts_opt.is_some() {
        ham.faces_raw.as_ref()
    } else {
        ham.faces_opt.as_ref()
    };

    let (faces_raw, faces_computed) = match faces_src {
        Some(faces) => (faces.clone(), false),
        None => {
            if verts_raw.len() % 3 != 0 {
                return Err(GeomError::InvalidInput(format!(
                    "{} raw vertices do not form whole triangles",
                    verts_raw.len()
                )));
            }
            let faces = (0..verts_raw.len())
                .step_by(3)
                .map(|i| vec![i, i + 1, i + 2])
                .collect::<Vec<_>>();
            (faces, true)
        }
    };
    check_faces(&faces_raw, verts_raw.len())?;

    let (verts_opt, n_faces) = reduce_verts(verts_raw, &faces_raw);
    check_distinct_faces(&n_faces)?;
    let faces_opt = reduce_faces(&n_faces);

    let points: Vec<Point2> = verts_opt.iter().map(|v| Point2::new(v[0], v[1])).collect();
    let ham_area = match area {
        AreaMethod::Triangles => area_mesh_tris_idx(&points, &n_faces),
        AreaMethod::Clipped => area_mesh_tris_clipped(&points, &n_faces),
    };

    debug!(
        verts_raw = verts_raw.len(),
        verts_opt = verts_opt.len(),
        faces_raw = faces_raw.len(),
        faces_opt = faces_opt.len(),
        ham_area,
        "reduced hidden area mesh"
    );

    Ok(OptimizedMesh {
        ham_area,
        verts_raw: (*verts_raw != verts_opt).then(|| verts_raw.clone()),
        faces_raw: (!faces_computed && faces_raw != faces_opt).then_some(faces_raw),
        verts_opt,
        faces_opt,
    })
}

/// Sanity check of the collected geometry before any calculation.
///
/// Runtimes without an active headset report zeroed or garbage values; such
/// data are rejected with [`GeomError::InvalidInput`].
pub fn validate_geometry(input: &GeometryInput) -> Result<()> {
    for eye in Eye::BOTH {
        let raw = input.raw_eye.get(eye);
        let lrbt = [raw.tan_left, raw.tan_right, raw.tan_bottom, raw.tan_top];
        if !lrbt.iter().all(|v| v.is_finite()) {
            return Err(GeomError::InvalidInput(format!(
                "{} eye tangents are not finite: {lrbt:?}",
                eye.name()
            )));
        }
        let [l, r, b, t] = lrbt;
        if l >= r || b >= t {
            return Err(GeomError::InvalidInput(format!(
                "{} eye tangents do not span a view: {lrbt:?}",
                eye.name()
            )));
        }
        if !contains_forward_axis(l, r, b, t, None) {
            return Err(GeomError::InvalidInput(format!(
                "{} eye view does not contain its forward axis: {lrbt:?}",
                eye.name()
            )));
        }
        let e2h = &input.eye2head.get(eye).0;
        if !e2h.is_finite() {
            return Err(GeomError::InvalidInput(format!(
                "{} eye to head transform is not finite",
                eye.name()
            )));
        }
        let rot = e2h.rotation();
        let det = rot.determinant();
        if (det - 1.0).abs() > 1e-3 {
            return Err(GeomError::InvalidInput(format!(
                "{} eye to head rotation is not a rotation (det = {det})",
                eye.name()
            )));
        }
        if !contains_forward_axis(l, r, b, t, Some(&rot)) {
            return Err(GeomError::InvalidInput(format!(
                "{} eye view turned away from the head forward axis",
                eye.name()
            )));
        }
    }
    Ok(())
}

/// Compute all derived geometry: reduced masks, per-eye FOVs in eye and head
/// coordinates, the total FOV, and the view geometry.
pub fn calc_geometry(input: &GeometryInput, opts: &GeometryOptions) -> Result<GeometryOutput> {
    let ham_mesh = match &input.ham_mesh {
        Some(ham) => ham.try_map(|_, h| {
            h.as_ref()
                .map(|h| calc_opt_ham_mesh(h, opts.area_method))
                .transpose()
        })?,
        None => PerEye::default(),
    };

    let mut fov_eye = BTreeMap::new();
    let fov_head = input.eye2head.try_map(|eye, e2h| {
        let raw = input.raw_eye.get(eye);
        let mesh = ham_mesh.get(eye).as_ref();
        // eye FOV differs from head FOV only for a rotated panel
        if !e2h.0.has_identity_rotation() {
            fov_eye.insert(eye, calc_fov(raw, mesh, None)?);
        }
        let rot = e2h.0.rotation();
        calc_fov(raw, mesh, Some(&rot))
    })?;

    let fov_tot = calc_total_fov(&fov_head, opts.vertical_fov)?;
    let view_geom = calc_view_geom(&input.eye2head);

    debug!(
        fov_hor = fov_tot.fov_hor,
        fov_ver = fov_tot.fov_ver,
        ipd = view_geom.ipd,
        "calculated headset geometry"
    );

    Ok(GeometryOutput {
        rec_rts: input.rec_rts,
        raw_eye: input.raw_eye.clone(),
        eye2head: input.eye2head.clone(),
        render_desc: input.render_desc.clone(),
        view_geom,
        fov_eye,
        fov_head,
        fov_tot,
        ham_mesh,
    })
}
