use crate::geom::{Point, SubPath};

use super::{append_arc, dedup_points, segment_normal, LineCap, LineJoin};

/// Converts a path into the outline of its stroke.
///
/// The stroke is centered on the path with the given width; caps close the
/// ends of open subpaths and joins connect consecutive segments. Closed
/// subpaths produce two counter-oriented rings, so the non-zero winding
/// fill leaves the ring interior.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeTransformer {
    pub width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
}

impl Default for StrokeTransformer {
    fn default() -> Self {
        Self {
            width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 4.0,
        }
    }
}

impl StrokeTransformer {
    pub fn new(width: f64) -> Self {
        Self { width, ..Default::default() }
    }

    pub fn apply(&self, sub_paths: Vec<SubPath>, approximation_scale: f64) -> Vec<SubPath> {
        let half = self.width.abs() * 0.5;
        if half <= 0.0 {
            return Vec::new();
        }
        let mut result = Vec::new();
        for sub in &sub_paths {
            let points = dedup_points(&sub.points, sub.closed);
            if points.len() < 2 {
                continue;
            }
            if sub.closed && points.len() >= 3 {
                self.outline_closed(&points, half, approximation_scale, &mut result);
            } else {
                self.outline_open(&points, half, approximation_scale, &mut result);
            }
        }
        result
    }

    /// Two counter-oriented offset rings around a closed contour.
    fn outline_closed(
        &self,
        points: &[Point],
        half: f64,
        approximation_scale: f64,
        out: &mut Vec<SubPath>,
    ) {
        let outer = self.offset_ring(points, half, approximation_scale);
        let reversed: Vec<Point> = points.iter().rev().copied().collect();
        let inner = self.offset_ring(&reversed, half, approximation_scale);
        if outer.len() >= 3 {
            out.push(SubPath { points: outer, closed: true });
        }
        if inner.len() >= 3 {
            out.push(SubPath { points: inner, closed: true });
        }
    }

    /// A single closed outline around an open polyline: one side forward,
    /// the end cap, the other side backward, the start cap.
    fn outline_open(
        &self,
        points: &[Point],
        half: f64,
        approximation_scale: f64,
        out: &mut Vec<SubPath>,
    ) {
        let mut outline = self.offset_polyline(points, half, approximation_scale);

        let reversed: Vec<Point> = points.iter().rev().copied().collect();
        let back = self.offset_polyline(&reversed, half, approximation_scale);

        // End cap between the forward side's last point and the backward
        // side's first point.
        let end = *points.last().unwrap();
        let end_dir = direction(points[points.len() - 2], end);
        self.append_cap(end, outline[outline.len() - 1], back[0], end_dir, half, approximation_scale, &mut outline);

        outline.extend_from_slice(&back);

        // Start cap back to the forward side's first point.
        let start = points[0];
        let start_dir = direction(points[1], start);
        let cap_from = outline[outline.len() - 1];
        let cap_to = outline[0];
        self.append_cap(start, cap_from, cap_to, start_dir, half, approximation_scale, &mut outline);

        if outline.len() >= 3 {
            out.push(SubPath { points: outline, closed: true });
        }
    }

    /// Offsets an open polyline on its normal side, inserting joins at
    /// interior vertices.
    fn offset_polyline(&self, points: &[Point], half: f64, approximation_scale: f64) -> Vec<Point> {
        let n = points.len();
        let mut result = Vec::with_capacity(n + 8);

        let first_normal = segment_normal(points[0], points[1]).unwrap_or(Point::new(0.0, 0.0));
        result.push(offset(points[0], first_normal, half));

        for i in 1..n - 1 {
            let n1 = segment_normal(points[i - 1], points[i]);
            let n2 = segment_normal(points[i], points[i + 1]);
            if let (Some(n1), Some(n2)) = (n1, n2) {
                self.append_join(points[i], n1, n2, half, approximation_scale, &mut result);
            }
        }

        let last_normal = segment_normal(points[n - 2], points[n - 1]).unwrap_or(Point::new(0.0, 0.0));
        result.push(offset(points[n - 1], last_normal, half));
        result
    }

    /// Offsets a closed ring, joining at every vertex (cyclic).
    fn offset_ring(&self, points: &[Point], half: f64, approximation_scale: f64) -> Vec<Point> {
        let n = points.len();
        let mut result = Vec::with_capacity(n + 8);
        for i in 0..n {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            let n1 = segment_normal(prev, points[i]);
            let n2 = segment_normal(points[i], next);
            if let (Some(n1), Some(n2)) = (n1, n2) {
                self.append_join(points[i], n1, n2, half, approximation_scale, &mut result);
            }
        }
        result
    }

    /// Joins two offset segments meeting at `vertex` with unit normals
    /// `n1` and `n2`.
    fn append_join(
        &self,
        vertex: Point,
        n1: Point,
        n2: Point,
        half: f64,
        approximation_scale: f64,
        out: &mut Vec<Point>,
    ) {
        let a = offset(vertex, n1, half);
        let b = offset(vertex, n2, half);

        // Turn direction of the underlying segments; the offset side opens
        // up (outer join) when the cross product is positive.
        let turn = n1.x * n2.y - n1.y * n2.x;
        if turn.abs() < 1e-12 {
            out.push(a);
            return;
        }
        if turn < 0.0 {
            // Inner side of the turn; the two offsets overlap and the
            // non-zero fill swallows the excess.
            out.push(a);
            out.push(b);
            return;
        }

        match self.line_join {
            LineJoin::Bevel => {
                out.push(a);
                out.push(b);
            }
            LineJoin::Round => {
                out.push(a);
                append_arc(vertex, a, b, half, true, approximation_scale, out);
                out.push(b);
            }
            LineJoin::Miter | LineJoin::MiterRevert | LineJoin::MiterRound => {
                let dot = n1.x * n2.x + n1.y * n2.y;
                let denom = 1.0 + dot;
                let ratio_sq = 2.0 / denom.max(1e-12);
                if denom <= 1e-12 || ratio_sq > self.miter_limit * self.miter_limit {
                    // Exceeds the miter limit.
                    out.push(a);
                    out.push(b);
                } else {
                    let scale = half / denom;
                    out.push(Point::new(
                        vertex.x + (n1.x + n2.x) * scale,
                        vertex.y + (n1.y + n2.y) * scale,
                    ));
                }
            }
        }
    }

    /// Caps an open end around `vertex`, connecting `from` to `to`;
    /// `dir` is the outward unit direction of the capped end.
    fn append_cap(
        &self,
        vertex: Point,
        from: Point,
        to: Point,
        dir: Point,
        half: f64,
        approximation_scale: f64,
        out: &mut Vec<Point>,
    ) {
        match self.line_cap {
            LineCap::Butt => {}
            LineCap::Square => {
                out.push(Point::new(from.x + dir.x * half, from.y + dir.y * half));
                out.push(Point::new(to.x + dir.x * half, to.y + dir.y * half));
            }
            LineCap::Round => {
                append_arc(vertex, from, to, half, true, approximation_scale, out);
            }
        }
    }
}

fn offset(p: Point, normal: Point, distance: f64) -> Point {
    Point::new(p.x + normal.x * distance, p.y + normal.y * distance)
}

/// Unit direction from `a` to `b`.
fn direction(a: Point, b: Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt().max(1e-12);
    Point::new(dx / len, dy / len)
}
