//! Path transformers: the elements of a shape's vertex pipeline.
//!
//! The set is closed and fixed by the file format, so transformers are a
//! tagged enum with per-variant serialization rather than an open trait
//! hierarchy. Transformers run after curve flattening and before the
//! shape transform is applied; they consume and rewrite flattened
//! subpaths in pipeline order (the last added transformer is outermost).

pub mod affine;
pub mod contour;
pub mod perspective;
pub mod stroke;

pub use affine::AffineTransformer;
pub use contour::ContourTransformer;
pub use perspective::PerspectiveTransformer;
pub use stroke::StrokeTransformer;

use crate::geom::{Point, SubPath};

/// Line end cap of a stroked path. Values are the on-disk tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LineCap {
    #[default]
    Butt = 0,
    Square = 1,
    Round = 2,
}

impl LineCap {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => LineCap::Square,
            2 => LineCap::Round,
            _ => LineCap::Butt,
        }
    }
}

/// Corner join of stroked and contoured paths. Values are the on-disk
/// tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LineJoin {
    #[default]
    Miter = 0,
    MiterRevert = 1,
    Round = 2,
    Bevel = 3,
    MiterRound = 4,
}

impl LineJoin {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => LineJoin::MiterRevert,
            2 => LineJoin::Round,
            3 => LineJoin::Bevel,
            4 => LineJoin::MiterRound,
            _ => LineJoin::Miter,
        }
    }
}

/// One element of a shape's transformer pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum Transformer {
    Affine(AffineTransformer),
    Contour(ContourTransformer),
    /// Reserved by the format; decoded tags are accepted, the in-memory
    /// form passes geometry through unchanged, and the encoder never
    /// emits it.
    Perspective(PerspectiveTransformer),
    Stroke(StrokeTransformer),
}

impl Transformer {
    /// Rewrites the flattened geometry. `approximation_scale` bounds the
    /// error of generated round joins and caps.
    pub fn apply(&self, sub_paths: Vec<SubPath>, approximation_scale: f64) -> Vec<SubPath> {
        match self {
            Transformer::Affine(t) => t.apply(sub_paths),
            Transformer::Contour(t) => t.apply(sub_paths),
            Transformer::Perspective(t) => t.apply(sub_paths),
            Transformer::Stroke(t) => t.apply(sub_paths, approximation_scale),
        }
    }

    /// A short human-readable label, used by editor lists and the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Transformer::Affine(_) => "Transformation",
            Transformer::Contour(_) => "Contour",
            Transformer::Perspective(_) => "Perspective",
            Transformer::Stroke(_) => "Stroke",
        }
    }
}

// --- Shared offset helpers used by stroke and contour ---

/// The unit normal of the segment from `a` to `b`, pointing to its left.
pub(crate) fn segment_normal(a: Point, b: Point) -> Option<Point> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        return None;
    }
    Some(Point::new(dy / len, -dx / len))
}

/// Removes coincident neighbors (and for closed outlines a duplicated
/// terminal point) so join math never sees zero-length segments.
pub(crate) fn dedup_points(points: &[Point], closed: bool) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if result.last().map(|l| l.distance_to(p) < 1e-9).unwrap_or(false) {
            continue;
        }
        result.push(*p);
    }
    if closed && result.len() > 1 {
        if result[0].distance_to(result.last().unwrap()) < 1e-9 {
            result.pop();
        }
    }
    result
}

/// Appends an arc around `center` from `from` to `to` (both at `radius`
/// from the center), taking the short way in the direction given by
/// `ccw`. Used for round joins and caps.
pub(crate) fn append_arc(
    center: Point,
    from: Point,
    to: Point,
    radius: f64,
    ccw: bool,
    approximation_scale: f64,
    out: &mut Vec<Point>,
) {
    let a1 = (from.y - center.y).atan2(from.x - center.x);
    let mut a2 = (to.y - center.y).atan2(to.x - center.x);
    if ccw {
        while a2 < a1 {
            a2 += std::f64::consts::TAU;
        }
    } else {
        while a2 > a1 {
            a2 -= std::f64::consts::TAU;
        }
    }
    // Angular step bounded by the flattening error at the current scale.
    let da = 2.0 * (radius / (radius + 0.125 / approximation_scale.max(1e-6))).acos();
    let da = da.max(1e-2);
    let sweep = a2 - a1;
    let steps = (sweep.abs() / da).ceil() as usize;
    for i in 1..steps {
        let a = a1 + sweep * (i as f64 / steps as f64);
        out.push(Point::new(center.x + a.cos() * radius, center.y + a.sin() * radius));
    }
}
