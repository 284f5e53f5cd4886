//! Console report of the calculated geometry.

use std::io::{self, Write};

use hmdq_geom::{Eye, EyeFov, GeometryOutput, OptimizedMesh, RawEye, TotalFov, ViewGeom};
use hmdq_math::MM_IN_METER;

use crate::config::Config;
use crate::subsystem::{error_msg, fov_type_name, GeometryResult, Subsystem};

const DEG: &str = "deg";
const MM: &str = "mm";
const PRCT: &str = "%";

/// Writes indented lines.
pub struct Printer<'a, W: Write> {
    out: &'a mut W,
    tab: usize,
}

impl<'a, W: Write> Printer<'a, W> {
    /// Printer with `tab` spaces per indentation level.
    pub fn new(out: &'a mut W, tab: usize) -> Self {
        Self { out, tab }
    }

    fn line(&mut self, ind: usize, text: &str) -> io::Result<()> {
        writeln!(self.out, "{:w$}{}", "", text, w = ind * self.tab)
    }

    fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }
}

fn raw_lrbt<W: Write>(p: &mut Printer<W>, raw: &RawEye, ind: usize) -> io::Result<()> {
    p.line(ind, &format!("{:8}{:14.6}", "left:", raw.tan_left))?;
    p.line(ind, &format!("{:8}{:14.6}", "right:", raw.tan_right))?;
    p.line(ind, &format!("{:8}{:14.6}", "bottom:", raw.tan_bottom))?;
    p.line(ind, &format!("{:8}{:14.6}", "top:", raw.tan_top))
}

fn eye_fov<W: Write>(p: &mut Printer<W>, fov: &EyeFov, ind: usize) -> io::Result<()> {
    let rows = [
        ("left:", fov.deg_left),
        ("right:", fov.deg_right),
        ("bottom:", fov.deg_bottom),
        ("top:", fov.deg_top),
        ("horiz.:", fov.deg_hor),
        ("vert.:", fov.deg_ver),
    ];
    for (name, val) in rows {
        p.line(ind, &format!("{name:8}{val:10.2} {DEG}"))?;
    }
    Ok(())
}

fn total_fov<W: Write>(p: &mut Printer<W>, tot: &TotalFov, ind: usize) -> io::Result<()> {
    let rows = [
        ("horizontal:", tot.fov_hor),
        ("vertical:", tot.fov_ver),
        ("diagonal:", tot.fov_diag),
        ("overlap:", tot.overlap),
    ];
    for (name, val) in rows {
        p.line(ind, &format!("{name:12}{val:6.2} {DEG}"))?;
    }
    Ok(())
}

fn view_geom<W: Write>(p: &mut Printer<W>, vg: &ViewGeom, ind: usize) -> io::Result<()> {
    p.line(ind, &format!("{:22}{:6.1} {DEG}", "left panel rotation:", vg.left_rot))?;
    p.line(ind, &format!("{:22}{:6.1} {DEG}", "right panel rotation:", vg.right_rot))?;
    p.line(ind, &format!("{:22}{:6.1} {MM}", "reported IPD:", vg.ipd * MM_IN_METER))
}

fn ham_mesh<W: Write>(
    p: &mut Printer<W>,
    mesh: Option<&OptimizedMesh>,
    eye: Eye,
    detailed: bool,
    ind: usize,
) -> io::Result<()> {
    p.line(ind, &format!("{} eye HAM mesh:", eye.name()))?;
    let Some(mesh) = mesh else {
        return p.line(ind + 1, "No mesh defined by the headset");
    };
    let nverts = mesh.verts_raw.as_ref().unwrap_or(&mesh.verts_opt).len();
    let ntris = match (&mesh.faces_raw, &mesh.verts_raw) {
        (Some(faces), _) => faces.len(),
        (None, Some(_)) => nverts / 3,
        (None, None) => mesh.faces_opt.len(),
    };
    p.line(
        ind + 1,
        &format!("{:>18}: {nverts}, triangles: {ntris}", "original vertices"),
    )?;
    if detailed {
        p.line(
            ind + 1,
            &format!(
                "{:>18}: {}, n-gons: {}",
                "optimized vertices",
                mesh.verts_opt.len(),
                mesh.faces_opt.len()
            ),
        )?;
    }
    p.line(
        ind + 1,
        &format!("{:>18}: {:.2} {PRCT}", "mesh area", mesh.ham_area * 100.0),
    )
}

/// Print one calculated geometry.
pub fn print_geometry<W: Write>(
    p: &mut Printer<W>,
    geom: &GeometryOutput,
    verb: i32,
    cfg: &Config,
    ind: usize,
) -> io::Result<()> {
    let vdef = cfg.verbosity.default;
    let vgeom = cfg.verbosity.geom;
    if verb < vdef {
        return Ok(());
    }

    if let Some([w, h]) = geom.rec_rts {
        p.line(ind, &format!("Recommended render target size: [{w}, {h}]"))?;
        p.blank()?;
    }

    for eye in Eye::BOTH {
        ham_mesh(p, geom.ham_mesh.get(eye).as_ref(), eye, verb >= vgeom, ind)?;
        p.blank()?;

        if verb >= vgeom {
            p.line(ind, &format!("{} eye to head transformation matrix:", eye.name()))?;
            for row in geom.eye2head.get(eye).0.to_rows() {
                let cells: Vec<String> = row.iter().map(|v| format!("{v:10.6}")).collect();
                p.line(ind + 1, &format!("[{}]", cells.join(", ")))?;
            }
            p.blank()?;

            p.line(ind, &format!("{} eye raw LRBT values:", eye.name()))?;
            raw_lrbt(p, geom.raw_eye.get(eye), ind + 1)?;
            p.blank()?;
        }

        if let Some(fov) = geom.fov_eye.get(&eye) {
            p.line(ind, &format!("{} eye raw FOV:", eye.name()))?;
            eye_fov(p, fov, ind + 1)?;
            p.blank()?;
        }
        p.line(ind, &format!("{} eye head FOV:", eye.name()))?;
        eye_fov(p, geom.fov_head.get(eye), ind + 1)?;
        p.blank()?;
    }

    p.line(ind, "Total FOV:")?;
    total_fov(p, &geom.fov_tot, ind + 1)?;
    p.blank()?;

    p.line(ind, "View geometry:")?;
    view_geom(p, &geom.view_geom, ind + 1)
}

/// Print the geometry of one subsystem.
pub fn print_subsystem<W: Write>(
    out: &mut W,
    sub: &Subsystem,
    verb: i32,
    cfg: &Config,
) -> io::Result<()> {
    if verb < cfg.verbosity.default {
        return Ok(());
    }
    let mut p = Printer::new(out, cfg.format.cli_indent);

    p.line(0, &format!("{}:", sub.name()))?;
    p.blank()?;
    if !sub.init() {
        let msg = error_msg(sub.data()).unwrap_or("no data");
        return p.line(1, &format!("Error: {msg}"));
    }

    let geometries = sub.geometries();
    if geometries.is_empty() {
        return p.line(1, "No geometry data");
    }
    let mut first = true;
    for (fov_type, res) in geometries {
        let ind = match fov_type {
            Some(fov_type) => {
                let wanted = match fov_type {
                    "default_fov" => cfg.oculus.default_fov,
                    "max_fov" => cfg.oculus.max_fov,
                    _ => true,
                };
                if !wanted {
                    continue;
                }
                // blank line between the FOV variants
                if !first {
                    p.blank()?;
                }
                p.line(1, &format!("{}:", fov_type_name(fov_type)))?;
                p.blank()?;
                2
            }
            None => 1,
        };
        first = false;
        match res {
            GeometryResult::Ok(geom) => print_geometry(&mut p, &geom, verb, cfg, ind)?,
            GeometryResult::Err(msg) => p.line(ind, &format!("Error: {msg}"))?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmdq_geom::{calc_geometry, Eye2Head, GeometryInput, GeometryOptions, PerEye};
    use hmdq_math::{RigidTransform, Vec3};

    fn geometry() -> GeometryOutput {
        let raw = RawEye::new(-1.0, 1.0, -1.0, 1.0);
        let input = GeometryInput {
            rec_rts: Some([1852, 2056]),
            raw_eye: PerEye::new(raw, raw),
            eye2head: PerEye::new(
                Eye2Head(RigidTransform::identity().with_translation(Vec3::new(-0.0315, 0.0, 0.0))),
                Eye2Head(RigidTransform::identity().with_translation(Vec3::new(0.0315, 0.0, 0.0))),
            ),
            ham_mesh: None,
            render_desc: None,
        };
        calc_geometry(&input, &GeometryOptions::default()).unwrap()
    }

    fn render(verb: i32) -> String {
        let mut buf = Vec::new();
        let mut p = Printer::new(&mut buf, 4);
        print_geometry(&mut p, &geometry(), verb, &Config::default(), 0).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_print_geometry_default() {
        let text = render(0);
        assert!(text.contains("Recommended render target size: [1852, 2056]"));
        assert!(text.contains("No mesh defined by the headset"));
        assert!(text.contains("Left eye head FOV:"));
        assert!(text.contains("    horiz.:      90.00 deg"));
        assert!(text.contains("reported IPD:           63.0 mm"));
        assert!(!text.contains("transformation matrix"));
        assert!(!text.contains("raw FOV"));
    }

    #[test]
    fn test_print_geometry_detailed() {
        let text = render(1);
        assert!(text.contains("Right eye to head transformation matrix:"));
        assert!(text.contains("Left eye raw LRBT values:"));
        assert!(text.contains("    left:        -1.000000"));
    }

    #[test]
    fn test_print_silent() {
        assert!(render(-1).is_empty());
    }

    #[test]
    fn test_print_subsystem_error() {
        let sub = Subsystem::Oculus(serde_json::json!({"error@": "runtime not found"}));
        let mut buf = Vec::new();
        print_subsystem(&mut buf, &sub, 0, &Config::default()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Oculus:\n\n    Error: runtime not found\n");
    }

    #[test]
    fn test_print_oculus_variants() {
        let geom = serde_json::to_value(geometry()).unwrap();
        let sub = Subsystem::Oculus(serde_json::json!({
            "geometry": {"default_fov": geom.clone(), "max_fov": geom}
        }));
        let mut buf = Vec::new();
        print_subsystem(&mut buf, &sub, 0, &Config::default()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("    Default FOV:"));
        assert!(!text.contains("Maximal FOV"));
        assert!(text.contains("        Total FOV:"));
    }
}
