use crate::geom::{PathEvent, Point, Rect, Transform};
use crate::observe::{Observable, ObserverList};

/// One vertex of a [`VectorPath`].
///
/// Every vertex carries three points: the on-curve anchor and the incoming
/// and outgoing cubic control handles. When both handles coincide with the
/// anchor, the adjoining segments are straight lines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPoint {
    pub point: Point,
    pub point_in: Point,
    pub point_out: Point,
    /// Whether the two handles are constrained to stay colinear through
    /// the anchor. This flag is editor state; the flat format does not
    /// store it, and [`VectorPath::cleanup`] re-derives it after decoding.
    pub connected: bool,
}

impl PathPoint {
    pub fn plain(point: Point) -> Self {
        Self { point, point_in: point, point_out: point, connected: true }
    }

    /// True when both handles coincide with the anchor.
    pub fn is_plain(&self) -> bool {
        self.point_in == self.point && self.point_out == self.point
    }
}

/// An ordered sequence of anchor-plus-handle vertices describing a cubic
/// bezier contour.
///
/// If the path is closed, the last segment runs from the last vertex's
/// outgoing handle through the first vertex's incoming handle back to the
/// first vertex.
pub struct VectorPath {
    points: Vec<PathPoint>,
    closed: bool,
    observers: ObserverList,
}

impl Default for VectorPath {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for VectorPath {
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            closed: self.closed,
            observers: ObserverList::new(),
        }
    }
}

impl PartialEq for VectorPath {
    fn eq(&self, other: &Self) -> bool {
        self.closed == other.closed && self.points == other.points
    }
}

impl std::fmt::Debug for VectorPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorPath")
            .field("points", &self.points)
            .field("closed", &self.closed)
            .finish()
    }
}

impl VectorPath {
    pub fn new() -> Self {
        Self { points: Vec::new(), closed: false, observers: ObserverList::new() }
    }

    // --- Vertex editing ---

    /// Appends a plain vertex (handles on the anchor).
    pub fn add_point(&mut self, point: Point) {
        self.points.push(PathPoint::plain(point));
        self.notify();
    }

    /// Appends a vertex with explicit handles.
    pub fn add_point_full(&mut self, point: Point, point_in: Point, point_out: Point, connected: bool) {
        self.points.push(PathPoint { point, point_in, point_out, connected });
        self.notify();
    }

    /// Inserts a vertex at `index` (clamped).
    pub fn insert_point(&mut self, index: usize, point: PathPoint) {
        let index = index.min(self.points.len());
        self.points.insert(index, point);
        self.notify();
    }

    pub fn remove_point(&mut self, index: usize) -> Option<PathPoint> {
        if index >= self.points.len() {
            return None;
        }
        let removed = self.points.remove(index);
        self.notify();
        Some(removed)
    }

    pub fn set_point(&mut self, index: usize, point: PathPoint) -> bool {
        match self.points.get_mut(index) {
            Some(slot) => {
                if *slot != point {
                    *slot = point;
                    self.notify();
                }
                true
            }
            None => false,
        }
    }

    pub fn point_at(&self, index: usize) -> Option<&PathPoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn count_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        if self.closed != closed {
            self.closed = closed;
            self.notify();
        }
    }

    // --- Whole-path operations ---

    /// Applies an affine transform to every anchor and handle.
    pub fn apply_transform(&mut self, transform: &Transform) {
        if transform.is_identity() {
            return;
        }
        for p in &mut self.points {
            p.point = transform.transform_point(&p.point);
            p.point_in = transform.transform_point(&p.point_in);
            p.point_out = transform.transform_point(&p.point_out);
        }
        self.notify();
    }

    /// Post-decode cleanup: snaps handles that sit within numeric noise of
    /// their anchor exactly onto it and re-derives the `connected` flag
    /// from handle colinearity.
    pub fn cleanup(&mut self) {
        const SNAP: f64 = 1e-5;
        for p in &mut self.points {
            if p.point_in.distance_to(&p.point) < SNAP {
                p.point_in = p.point;
            }
            if p.point_out.distance_to(&p.point) < SNAP {
                p.point_out = p.point;
            }
            p.connected = handles_colinear(p);
        }
    }

    /// The bounding box of all anchors and handles. Conservative: actual
    /// curve extents never exceed the control polygon.
    pub fn control_bounds(&self) -> Rect {
        let mut bounds = Rect::invalid();
        for p in &self.points {
            bounds.include(&p.point);
            bounds.include(&p.point_in);
            bounds.include(&p.point_out);
        }
        bounds
    }

    /// Yields the path geometry as a vertex event stream.
    ///
    /// Plain segments become `LineTo`, curved segments `CurveTo`; a closed
    /// path ends with the closing segment and a `Close` event.
    pub fn events(&self) -> Vec<PathEvent> {
        let count = self.points.len();
        let mut events = Vec::with_capacity(count + 2);
        if count == 0 {
            return events;
        }
        events.push(PathEvent::MoveTo(self.points[0].point));
        for i in 1..count {
            events.push(segment_event(&self.points[i - 1], &self.points[i]));
        }
        if self.closed && count > 1 {
            events.push(segment_event(&self.points[count - 1], &self.points[0]));
            events.push(PathEvent::Close);
        }
        events
    }
}

impl Observable for VectorPath {
    fn observer_list(&self) -> &ObserverList {
        &self.observers
    }
}

fn segment_event(from: &PathPoint, to: &PathPoint) -> PathEvent {
    if from.point_out == from.point && to.point_in == to.point {
        PathEvent::LineTo(to.point)
    } else {
        PathEvent::CurveTo { ctrl1: from.point_out, ctrl2: to.point_in, to: to.point }
    }
}

fn handles_colinear(p: &PathPoint) -> bool {
    if p.is_plain() {
        return true;
    }
    let ax = p.point.x - p.point_in.x;
    let ay = p.point.y - p.point_in.y;
    let bx = p.point_out.x - p.point.x;
    let by = p.point_out.y - p.point.y;
    let cross = ax * by - ay * bx;
    let dot = ax * bx + ay * by;
    cross.abs() < 1e-6 && dot >= 0.0
}
