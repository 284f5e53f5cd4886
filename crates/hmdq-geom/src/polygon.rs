//! 2D polygons in UV space and clipping against the UV canvas.

use hmdq_math::{det_mat_2x2, Point2, DOUBLE_EPS_100};
use nalgebra::Matrix2;

/// A 2D polygon (closed path).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Vertices of the polygon in order.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Create a new polygon from points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// The unit square `[0, 1] x [0, 1]`, counter-clockwise.
    pub fn unit_square() -> Self {
        Self::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])
    }

    /// Check if the polygon is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Signed area of the polygon.
    /// Positive for counter-clockwise, negative for clockwise.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }
        area / 2.0
    }

    /// Unsigned area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Ensure counter-clockwise winding.
    pub fn ensure_ccw(&mut self) {
        if !self.is_ccw() {
            self.points.reverse();
        }
    }

    /// Intersection of this polygon with a convex `window`.
    ///
    /// Sutherland-Hodgman clipping: the subject is clipped against each
    /// window edge in turn. The window must be convex; the subject may have
    /// either winding.
    pub fn clip_convex(&self, window: &Polygon) -> Polygon {
        if self.is_empty() {
            return self.clone();
        }
        let mut window = window.clone();
        window.ensure_ccw();

        let mut output = self.points.clone();
        let n = window.len();
        for i in 0..n {
            if output.is_empty() {
                break;
            }
            let a = window.points[i];
            let b = window.points[(i + 1) % n];
            let input = std::mem::take(&mut output);
            let m = input.len();
            for k in 0..m {
                let cur = input[k];
                let prev = input[(k + m - 1) % m];
                let cur_in = side(&a, &b, &cur) >= -DOUBLE_EPS_100;
                let prev_in = side(&a, &b, &prev) >= -DOUBLE_EPS_100;
                if cur_in {
                    if !prev_in {
                        if let Some(p) = line_intersection(&prev, &cur, &a, &b) {
                            output.push(p);
                        }
                    }
                    output.push(cur);
                } else if prev_in {
                    if let Some(p) = line_intersection(&prev, &cur, &a, &b) {
                        output.push(p);
                    }
                }
            }
        }
        Polygon::new(output)
    }
}

/// Cross product sign of `p` relative to the directed line `a -> b`.
/// Positive on the left.
fn side(a: &Point2, b: &Point2, p: &Point2) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Intersection of the infinite lines through `(p1, p2)` and `(q1, q2)`.
///
/// Solved with Cramer's rule; `None` when the lines are parallel.
fn line_intersection(p1: &Point2, p2: &Point2, q1: &Point2, q2: &Point2) -> Option<Point2> {
    let d = p2 - p1;
    let e = q1 - q2;
    let r = q1 - p1;
    let deto = det_mat_2x2(&Matrix2::new(d.x, e.x, d.y, e.y));
    if deto.abs() < DOUBLE_EPS_100 {
        return None;
    }
    let detu = det_mat_2x2(&Matrix2::new(r.x, e.x, r.y, e.y));
    let u = detu / deto;
    Some(p1 + d * u)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Polygon {
        Polygon::new(vec![
            Point2::new(a.0, a.1),
            Point2::new(b.0, b.1),
            Point2::new(c.0, c.1),
        ])
    }

    #[test]
    fn test_polygon_area() {
        let square = Polygon::unit_square();
        assert!((square.signed_area() - 1.0).abs() < 1e-10);
        assert!(square.is_ccw());
    }

    #[test]
    fn test_ensure_ccw() {
        let mut t = tri((0.0, 0.0), (0.0, 1.0), (1.0, 0.0));
        assert!(!t.is_ccw());
        t.ensure_ccw();
        assert!(t.is_ccw());
        assert!((t.area() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_line_intersection() {
        let p = line_intersection(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 2.0),
            &Point2::new(0.0, 2.0),
            &Point2::new(2.0, 0.0),
        )
        .unwrap();
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);

        let parallel = line_intersection(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 1.0),
        );
        assert!(parallel.is_none());
    }

    #[test]
    fn test_clip_inside_is_unchanged() {
        let t = tri((0.1, 0.1), (0.9, 0.1), (0.5, 0.9));
        let clipped = t.clip_convex(&Polygon::unit_square());
        assert!((clipped.area() - t.area()).abs() < 1e-12);
    }

    #[test]
    fn test_clip_outside_is_empty() {
        let t = tri((2.0, 2.0), (3.0, 2.0), (2.0, 3.0));
        let clipped = t.clip_convex(&Polygon::unit_square());
        assert!(clipped.is_empty());
        assert_eq!(clipped.area(), 0.0);
        assert!(clipped.clip_convex(&Polygon::unit_square()).is_empty());
    }

    #[test]
    fn test_clip_partial_overlap() {
        // right triangle with legs 2, half of it inside the unit square
        let t = tri((0.0, 0.0), (2.0, 0.0), (0.0, 2.0));
        let clipped = t.clip_convex(&Polygon::unit_square());
        assert!((clipped.area() - 1.0).abs() < 1e-12);

        // clockwise subject gives the same area
        let t = tri((0.0, 0.0), (0.0, 2.0), (2.0, 0.0));
        let clipped = t.clip_convex(&Polygon::unit_square());
        assert!((clipped.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clip_sticking_out() {
        // triangle straddling the right border: 0.25 of its 0.5 area inside
        let t = tri((0.5, 0.0), (1.5, 0.0), (0.5, 1.0));
        let clipped = t.clip_convex(&Polygon::unit_square());
        assert!((clipped.area() - 0.375).abs() < 1e-12);
    }
}
