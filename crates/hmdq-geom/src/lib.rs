#![warn(missing_docs)]

//! Field of view geometry for VR headsets.
//!
//! This crate turns the raw view data reported by a headset runtime (per-eye
//! projection tangents, eye-to-head transforms and the hidden area mask) into
//! the actually visible field of view: reduced mask meshes, FOV points and
//! angles for each eye, the combined stereo FOV, and panel rotation and IPD.
//!
//! # Example
//!
//! ```ignore
//! use hmdq_geom::{calc_geometry, GeometryInput, GeometryOptions};
//!
//! let input: GeometryInput = serde_json::from_str(&json)?;
//! let geom = calc_geometry(&input, &GeometryOptions::default())?;
//!
//! println!("Horizontal FOV: {:.2}", geom.fov_tot.fov_hor);
//! println!("IPD: {:.1} mm", geom.view_geom.ipd * 1000.0);
//! ```

pub mod area;
pub mod error;
pub mod fov;
pub mod frustum;
pub mod geometry;
pub mod mesh;
pub mod model;
pub mod optmesh;
pub mod polygon;
pub mod view;

pub use area::{area_mesh_raw, area_mesh_tris_clipped, area_mesh_tris_idx, area_triangle};
pub use error::{GeomError, Result};
pub use fov::{calc_fov, calc_total_fov, EyeFov, TotalFov, VerticalFov};
pub use frustum::{contains_forward_axis, Frustum, Plane, FOV_POINT_COUNT};
pub use geometry::{calc_geometry, calc_opt_ham_mesh, validate_geometry, AreaMethod, GeometryOptions};
pub use mesh::{face_to_edges, faces_to_edges, Edge, EdgeMesh, Face};
pub use model::{
    Eye, Eye2Head, GeometryInput, GeometryOutput, HamMeshInput, OptimizedMesh, PerEye, Pose,
    RawEye, Vert2,
};
pub use optmesh::{reduce_faces, reduce_verts};
pub use polygon::Polygon;
pub use view::{calc_view_geom, ViewGeom};
