use crate::geom::{Point, SubPath};

use super::{dedup_points, segment_normal, LineJoin};

/// Offsets a path outline by a width while preserving its vertex count.
///
/// Unlike [`StrokeTransformer`](super::StrokeTransformer), the contour
/// keeps one output vertex per input vertex: every corner becomes a miter
/// point, clamped to the miter limit. A positive width always grows the
/// outline regardless of the winding direction of the input.
#[derive(Clone, Debug, PartialEq)]
pub struct ContourTransformer {
    pub width: f64,
    pub line_join: LineJoin,
    pub miter_limit: f64,
}

impl Default for ContourTransformer {
    fn default() -> Self {
        Self { width: 0.0, line_join: LineJoin::Miter, miter_limit: 4.0 }
    }
}

impl ContourTransformer {
    pub fn new(width: f64) -> Self {
        Self { width, ..Default::default() }
    }

    pub fn apply(&self, sub_paths: Vec<SubPath>) -> Vec<SubPath> {
        if self.width == 0.0 {
            return sub_paths;
        }
        let mut result = Vec::with_capacity(sub_paths.len());
        for sub in sub_paths {
            let points = dedup_points(&sub.points, true);
            if points.len() < 3 {
                result.push(sub);
                continue;
            }
            // Normalize the offset so positive widths expand outward for
            // either winding direction.
            let offset = if signed_area(&points) >= 0.0 { self.width } else { -self.width };
            let mut out = Vec::with_capacity(points.len());
            let n = points.len();
            for i in 0..n {
                let prev = points[(i + n - 1) % n];
                let next = points[(i + 1) % n];
                let n1 = segment_normal(prev, points[i]);
                let n2 = segment_normal(points[i], next);
                match (n1, n2) {
                    (Some(n1), Some(n2)) => {
                        out.push(miter_point(points[i], n1, n2, offset, self.miter_limit))
                    }
                    _ => out.push(points[i]),
                }
            }
            result.push(SubPath { points: out, closed: true });
        }
        result
    }
}

/// The intersection of the two offset edges at `vertex`, clamped to the
/// miter limit so spikes stay bounded.
fn miter_point(vertex: Point, n1: Point, n2: Point, offset: f64, miter_limit: f64) -> Point {
    let denom = 1.0 + (n1.x * n2.x + n1.y * n2.y);
    if denom <= 1e-9 {
        // 180 degree turn; fall back to the first edge offset.
        return Point::new(vertex.x + n1.x * offset, vertex.y + n1.y * offset);
    }
    let mut scale = offset / denom;
    let ratio_sq = 2.0 / denom;
    if ratio_sq > miter_limit * miter_limit {
        // Clamp the spike to miter_limit times the offset distance.
        let bisector_len = (2.0 * denom).sqrt();
        scale = offset.signum() * miter_limit * offset.abs() / bisector_len.max(1e-9);
    }
    Point::new(vertex.x + (n1.x + n2.x) * scale, vertex.y + (n1.y + n2.y) * scale)
}

/// Twice the signed area of the polygon (shoelace formula).
fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area
}
