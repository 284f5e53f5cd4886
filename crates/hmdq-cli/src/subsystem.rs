//! VR subsystems found in an hmdq data file.
//!
//! Each subsystem owns its section of the JSON document. Calculation replaces
//! the collected geometry with the augmented one; a failure is recorded in an
//! error field of the geometry and the other subsystems are still processed.

use std::io::{self, Write};

use anyhow::{Context, Result};
use hmdq_geom::{
    calc_geometry, validate_geometry, Eye2Head, GeometryInput, GeometryOptions, GeometryOutput,
    PerEye, Pose,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::report;

/// Key of the error message attached to a failed JSON item.
pub const ERROR_KEY: &str = "error@";

/// Geometry section key.
pub const GEOMETRY_KEY: &str = "geometry";

/// Oculus FOV variants, in print order.
pub const OCULUS_FOV_TYPES: [&str; 2] = ["default_fov", "max_fov"];

/// Display name of an Oculus FOV variant.
pub fn fov_type_name(fov_type: &str) -> &str {
    match fov_type {
        "default_fov" => "Default FOV",
        "max_fov" => "Maximal FOV",
        other => other,
    }
}

/// A VR subsystem with its data.
#[derive(Debug, Clone, PartialEq)]
pub enum Subsystem {
    /// OpenVR (SteamVR) data: one geometry.
    OpenVr(Value),
    /// Oculus data: one geometry per FOV variant.
    Oculus(Value),
}

/// Eye render description reported by the Oculus runtime.
#[derive(Debug, Deserialize)]
struct EyeRenderDesc {
    hmd2eye_pose: Pose,
}

/// Error message recorded on `item`, if any.
pub fn error_msg(item: &Value) -> Option<&str> {
    item.get(ERROR_KEY).and_then(Value::as_str)
}

fn set_error(item: &mut Value, msg: String) {
    if let Value::Object(map) = item {
        map.insert(ERROR_KEY.to_string(), Value::String(msg));
    }
}

/// Derive the eye-to-head transforms from the Oculus render description.
pub fn precalc_geometry(geom: &mut Value) -> Result<()> {
    let render_desc = geom
        .get("render_desc")
        .context("Oculus geometry has no render description")?;
    let desc: PerEye<EyeRenderDesc> = serde_json::from_value(render_desc.clone())
        .context("malformed Oculus render description")?;
    let eye2head = PerEye::new(
        Eye2Head::from_pose(&desc.left.hmd2eye_pose),
        Eye2Head::from_pose(&desc.right.hmd2eye_pose),
    );
    if let Value::Object(map) = geom {
        map.insert("eye2head".to_string(), serde_json::to_value(eye2head)?);
    }
    Ok(())
}

/// Calculate one geometry document.
fn calculate_geometry(geom: &Value, opts: &GeometryOptions, oculus: bool) -> Result<Value> {
    let mut geom = geom.clone();
    if oculus {
        precalc_geometry(&mut geom)?;
    }
    let input: GeometryInput =
        serde_json::from_value(geom).context("Geometry data are invalid (check JSON file)")?;
    validate_geometry(&input).context("Geometry data are invalid (check JSON file)")?;
    let output = calc_geometry(&input, opts)?;
    Ok(serde_json::to_value(output)?)
}

/// Already calculated geometry is left alone.
fn is_calculated(geom: &Value) -> bool {
    geom.get("view_geom").is_some() && geom.get("fov_tot").is_some()
}

fn process_geometry(geom: &mut Value, opts: &GeometryOptions, oculus: bool, label: &str) {
    if error_msg(geom).is_some() || is_calculated(geom) {
        debug!(label, "geometry skipped");
        return;
    }
    match calculate_geometry(geom, opts, oculus) {
        Ok(res) => *geom = res,
        Err(err) => {
            warn!(label, "geometry calculation failed: {err:#}");
            set_error(geom, format!("{err:#}"));
        }
    }
}

impl Subsystem {
    /// Subsystem key in the data file.
    pub fn key(&self) -> &'static str {
        match self {
            Subsystem::OpenVr(_) => "openvr",
            Subsystem::Oculus(_) => "oculus",
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Subsystem::OpenVr(_) => "OpenVR",
            Subsystem::Oculus(_) => "Oculus",
        }
    }

    /// Subsystem data.
    pub fn data(&self) -> &Value {
        match self {
            Subsystem::OpenVr(d) | Subsystem::Oculus(d) => d,
        }
    }

    fn data_mut(&mut self) -> &mut Value {
        match self {
            Subsystem::OpenVr(d) | Subsystem::Oculus(d) => d,
        }
    }

    /// Split the subsystems out of a data file, in a fixed order.
    pub fn from_document(doc: &mut Map<String, Value>) -> Vec<Subsystem> {
        let mut res = Vec::new();
        if let Some(d) = doc.remove("openvr") {
            res.push(Subsystem::OpenVr(d));
        }
        if let Some(d) = doc.remove("oculus") {
            res.push(Subsystem::Oculus(d));
        }
        res
    }

    /// Put the subsystem data back into the document.
    pub fn into_document(self, doc: &mut Map<String, Value>) {
        let key = self.key();
        let data = match self {
            Subsystem::OpenVr(d) | Subsystem::Oculus(d) => d,
        };
        doc.insert(key.to_string(), data);
    }

    /// Check the data can be processed: an object which does not carry a
    /// subsystem level error.
    pub fn init(&self) -> bool {
        let data = self.data();
        data.is_object() && error_msg(data).is_none()
    }

    /// Calculate the derived geometry in place.
    pub fn calculate(&mut self, opts: &GeometryOptions) {
        if !self.init() {
            debug!(subsystem = self.name(), "no usable data, nothing to calculate");
            return;
        }
        let name = self.name();
        let oculus = matches!(self, Subsystem::Oculus(_));
        let Some(geom) = self.data_mut().get_mut(GEOMETRY_KEY) else {
            return;
        };
        if oculus {
            if let Value::Object(variants) = geom {
                for (fov_type, fov_geom) in variants.iter_mut() {
                    process_geometry(fov_geom, opts, true, fov_type);
                }
            }
        } else {
            process_geometry(geom, opts, false, name);
        }
    }

    /// Print the calculated geometry.
    pub fn print<W: Write>(&self, out: &mut W, verb: i32, cfg: &Config) -> io::Result<()> {
        report::print_subsystem(out, self, verb, cfg)
    }

    /// The calculated geometries, keyed by the Oculus FOV variant. Geometry
    /// which failed carries its error message instead.
    pub fn geometries(&self) -> Vec<(Option<&'static str>, GeometryResult)> {
        let Some(geom) = self.data().get(GEOMETRY_KEY) else {
            return Vec::new();
        };
        match self {
            Subsystem::OpenVr(_) => vec![(None, GeometryResult::from_value(geom))],
            Subsystem::Oculus(_) => OCULUS_FOV_TYPES
                .iter()
                .filter_map(|key| {
                    geom.get(*key)
                        .map(|g| (Some(*key), GeometryResult::from_value(g)))
                })
                .collect(),
        }
    }
}

/// A geometry as seen by the printer.
#[derive(Debug)]
pub enum GeometryResult {
    /// Successfully calculated geometry.
    Ok(Box<GeometryOutput>),
    /// Error message.
    Err(String),
}

impl GeometryResult {
    fn from_value(v: &Value) -> Self {
        if let Some(msg) = error_msg(v) {
            return GeometryResult::Err(msg.to_string());
        }
        match serde_json::from_value::<GeometryOutput>(v.clone()) {
            Ok(g) => GeometryResult::Ok(Box::new(g)),
            Err(e) => GeometryResult::Err(format!("geometry is not calculated: {e}")),
        }
    }
}
