//! Serialized data model of the headset geometry.
//!
//! These types mirror the JSON documents produced by the headset collectors:
//! per-eye values are keyed `"Left"` and `"Right"`, meshes use plain arrays.

use std::collections::BTreeMap;

use hmdq_math::RigidTransform;
use serde::{Deserialize, Serialize};

use crate::fov::{EyeFov, TotalFov};
use crate::mesh::Face;
use crate::view::ViewGeom;

/// A 2D vertex in UV space, `[u, v]`.
pub type Vert2 = [f64; 2];

/// Which eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Eye {
    /// Left eye.
    Left,
    /// Right eye.
    Right,
}

impl Eye {
    /// Both eyes in processing order.
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Eye::Left => "Left",
            Eye::Right => "Right",
        }
    }
}

/// A value for each eye.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerEye<T> {
    /// Left eye value.
    #[serde(rename = "Left")]
    pub left: T,
    /// Right eye value.
    #[serde(rename = "Right")]
    pub right: T,
}

impl<T> PerEye<T> {
    /// Create from both values.
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Value for `eye`.
    pub fn get(&self, eye: Eye) -> &T {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }

    /// Apply `f` to both values, left first.
    pub fn try_map<U, E, F>(&self, mut f: F) -> Result<PerEye<U>, E>
    where
        F: FnMut(Eye, &T) -> Result<U, E>,
    {
        Ok(PerEye {
            left: f(Eye::Left, &self.left)?,
            right: f(Eye::Right, &self.right)?,
        })
    }
}

/// Raw projection tangents of one eye as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawEye {
    /// Tangent of the left half-angle (usually negative).
    pub tan_left: f64,
    /// Tangent of the right half-angle.
    pub tan_right: f64,
    /// Tangent of the bottom half-angle (usually negative).
    pub tan_bottom: f64,
    /// Tangent of the top half-angle.
    pub tan_top: f64,
}

impl RawEye {
    /// Create from LRBT tangents.
    pub fn new(tan_left: f64, tan_right: f64, tan_bottom: f64, tan_top: f64) -> Self {
        Self {
            tan_left,
            tan_right,
            tan_bottom,
            tan_top,
        }
    }
}

/// Eye-to-head transform, serialized as three rows of four values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[[f64; 4]; 3]", into = "[[f64; 4]; 3]")]
pub struct Eye2Head(pub RigidTransform);

impl Eye2Head {
    /// Build from a head-to-eye pose (orientation quaternion plus position).
    pub fn from_pose(pose: &Pose) -> Self {
        let q = &pose.orientation;
        let p = &pose.position;
        Self(RigidTransform::from_pose([q.x, q.y, q.z, q.w], [p.x, p.y, p.z]))
    }
}

impl From<[[f64; 4]; 3]> for Eye2Head {
    fn from(rows: [[f64; 4]; 3]) -> Self {
        Self(RigidTransform::from_rows(&rows))
    }
}

impl From<Eye2Head> for [[f64; 4]; 3] {
    fn from(e2h: Eye2Head) -> Self {
        e2h.0.to_rows()
    }
}

/// Orientation quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
    /// W (scalar) component.
    pub w: f64,
}

/// Position vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

/// A rigid pose as reported by the Oculus runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Orientation.
    pub orientation: Quat,
    /// Position in meters.
    pub position: Position,
}

/// Hidden area mesh as collected.
///
/// OpenVR reports raw triangles (`verts_raw`, three vertices per triangle),
/// Oculus reports indexed triangles (`verts_opt` plus `faces_raw`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HamMeshInput {
    /// Raw vertices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verts_raw: Option<Vec<Vert2>>,
    /// Raw faces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faces_raw: Option<Vec<Face>>,
    /// Already deduplicated vertices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verts_opt: Option<Vec<Vert2>>,
    /// Already reduced faces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faces_opt: Option<Vec<Face>>,
}

/// Hidden area mesh after topology reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedMesh {
    /// Mesh area in UV units (the full canvas has area 1).
    pub ham_area: f64,
    /// Original vertices, present only when they differ from `verts_opt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verts_raw: Option<Vec<Vert2>>,
    /// Original faces, present only when supplied and different from `faces_opt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faces_raw: Option<Vec<Face>>,
    /// Deduplicated vertices.
    pub verts_opt: Vec<Vert2>,
    /// Merged n-gon faces.
    pub faces_opt: Vec<Face>,
}

/// Geometry document as collected from a runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryInput {
    /// Recommended render target size `[width, height]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rec_rts: Option<[u32; 2]>,
    /// Raw projection tangents.
    pub raw_eye: PerEye<RawEye>,
    /// Eye-to-head transforms.
    pub eye2head: PerEye<Eye2Head>,
    /// Hidden area meshes, `null` for an eye without a mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ham_mesh: Option<PerEye<Option<HamMeshInput>>>,
    /// Oculus render description, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_desc: Option<serde_json::Value>,
}

/// Geometry document with all derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryOutput {
    /// Recommended render target size `[width, height]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rec_rts: Option<[u32; 2]>,
    /// Raw projection tangents.
    pub raw_eye: PerEye<RawEye>,
    /// Eye-to-head transforms.
    pub eye2head: PerEye<Eye2Head>,
    /// Oculus render description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_desc: Option<serde_json::Value>,
    /// Panel rotation and IPD.
    pub view_geom: ViewGeom,
    /// FOV in eye coordinates, only for eyes with a rotated panel.
    #[serde(default)]
    pub fov_eye: BTreeMap<Eye, EyeFov>,
    /// FOV in head coordinates.
    pub fov_head: PerEye<EyeFov>,
    /// Combined stereo FOV.
    pub fov_tot: TotalFov,
    /// Reduced hidden area meshes.
    pub ham_mesh: PerEye<Option<OptimizedMesh>>,
}
