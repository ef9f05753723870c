use super::Point;

/// One event of a path vertex stream.
///
/// Paths yield their geometry as a stream of these events; path
/// transformers consume and rewrite such streams before the result reaches
/// the rasterizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathEvent {
    MoveTo(Point),
    LineTo(Point),
    /// A cubic bezier segment. `ctrl1` is the outgoing handle of the
    /// previous anchor, `ctrl2` the incoming handle of `to`.
    CurveTo { ctrl1: Point, ctrl2: Point, to: Point },
    Close,
}

/// A flattened subpath: straight segments only.
#[derive(Clone, Debug, Default)]
pub struct SubPath {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Recursion cutoff for adaptive curve subdivision.
const CURVE_RECURSION_LIMIT: u32 = 16;

/// Flattens an event stream into polylines.
///
/// `approximation_scale` is the effective output scale; the subdivision
/// tolerance is a quarter design unit divided by it, so curves stay smooth
/// at any zoom.
pub fn flatten_events(events: &[PathEvent], approximation_scale: f64) -> Vec<SubPath> {
    let tolerance = 0.25 / approximation_scale.max(1e-6);
    let tolerance_sq = tolerance * tolerance;

    let mut result = Vec::new();
    let mut current = SubPath::default();
    let mut cursor = Point::ORIGIN;

    for event in events {
        match *event {
            PathEvent::MoveTo(p) => {
                if current.points.len() > 1 {
                    result.push(std::mem::take(&mut current));
                } else {
                    current.points.clear();
                }
                current.closed = false;
                current.points.push(p);
                cursor = p;
            }
            PathEvent::LineTo(p) => {
                current.points.push(p);
                cursor = p;
            }
            PathEvent::CurveTo { ctrl1, ctrl2, to } => {
                flatten_cubic(cursor, ctrl1, ctrl2, to, tolerance_sq, &mut current.points);
                cursor = to;
            }
            PathEvent::Close => {
                current.closed = true;
                if current.points.len() > 1 {
                    result.push(std::mem::take(&mut current));
                } else {
                    current.points.clear();
                }
                current.closed = false;
            }
        }
    }
    if current.points.len() > 1 {
        result.push(current);
    }
    result
}

/// Appends the flattened form of one cubic segment, excluding the start
/// point and including the end point.
fn flatten_cubic(from: Point, c1: Point, c2: Point, to: Point, tolerance_sq: f64, out: &mut Vec<Point>) {
    subdivide(from, c1, c2, to, tolerance_sq, 0, out);
}

fn subdivide(
    p1: Point,
    p2: Point,
    p3: Point,
    p4: Point,
    tolerance_sq: f64,
    depth: u32,
    out: &mut Vec<Point>,
) {
    if depth >= CURVE_RECURSION_LIMIT || is_flat(p1, p2, p3, p4, tolerance_sq) {
        out.push(p4);
        return;
    }

    // de Casteljau split at t = 0.5
    let p12 = midpoint(p1, p2);
    let p23 = midpoint(p2, p3);
    let p34 = midpoint(p3, p4);
    let p123 = midpoint(p12, p23);
    let p234 = midpoint(p23, p34);
    let p1234 = midpoint(p123, p234);

    subdivide(p1, p12, p123, p1234, tolerance_sq, depth + 1, out);
    subdivide(p1234, p234, p34, p4, tolerance_sq, depth + 1, out);
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

/// Flatness test: the control points must lie within tolerance of the
/// chord.
fn is_flat(p1: Point, p2: Point, p3: Point, p4: Point, tolerance_sq: f64) -> bool {
    let dx = p4.x - p1.x;
    let dy = p4.y - p1.y;
    let chord_sq = dx * dx + dy * dy;

    if chord_sq <= f64::EPSILON {
        // Degenerate chord: fall back to control point distance.
        let d2 = p1.distance_to(&p2);
        let d3 = p1.distance_to(&p3);
        return d2 * d2 <= tolerance_sq && d3 * d3 <= tolerance_sq;
    }

    let d2 = ((p2.x - p4.x) * dy - (p2.y - p4.y) * dx).abs();
    let d3 = ((p3.x - p4.x) * dy - (p3.y - p4.y) * dx).abs();
    (d2 + d3) * (d2 + d3) <= tolerance_sq * chord_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_segments_pass_through() {
        let events = [
            PathEvent::MoveTo(Point::new(0.0, 0.0)),
            PathEvent::LineTo(Point::new(10.0, 0.0)),
            PathEvent::LineTo(Point::new(10.0, 10.0)),
            PathEvent::Close,
        ];
        let subs = flatten_events(&events, 1.0);
        assert_eq!(subs.len(), 1);
        assert!(subs[0].closed);
        assert_eq!(subs[0].points.len(), 3);
    }

    #[test]
    fn curves_are_subdivided() {
        let events = [
            PathEvent::MoveTo(Point::new(0.0, 0.0)),
            PathEvent::CurveTo {
                ctrl1: Point::new(0.0, 30.0),
                ctrl2: Point::new(64.0, 30.0),
                to: Point::new(64.0, 0.0),
            },
        ];
        let subs = flatten_events(&events, 1.0);
        assert_eq!(subs.len(), 1);
        // A pronounced arc must produce intermediate vertices.
        assert!(subs[0].points.len() > 4);
        // Endpoints survive exactly.
        assert_eq!(subs[0].points[0], Point::new(0.0, 0.0));
        assert_eq!(*subs[0].points.last().unwrap(), Point::new(64.0, 0.0));
    }
}
