use crate::geom::Transform;
use crate::model::container::{Container, Handle, SharedContainer};
use crate::model::path::VectorPath;
use crate::model::style::Style;
use crate::observe::{Observable, ObserverList};
use crate::transformer::Transformer;

/// The largest level-of-detail scale; a shape whose maximum visibility
/// scale equals this value is never culled at high zoom.
pub const MAX_VISIBILITY_SCALE: f64 = 4.0;

/// A renderable element binding one style to one or more paths through a
/// transform pipeline.
///
/// The shape holds non-owning handles into the owning icon's style and
/// path containers. A decoded shape whose style reference was invalid
/// carries no style and renders empty.
pub struct Shape {
    style: Option<Handle<Style>>,
    paths: SharedContainer<VectorPath>,
    transform: Transform,
    transformers: Vec<Transformer>,
    hinting: bool,
    min_visibility_scale: f64,
    max_visibility_scale: f64,
    observers: ObserverList,
}

impl Shape {
    pub fn new(style: Option<Handle<Style>>) -> Self {
        Self {
            style,
            paths: Container::new_shared(),
            transform: Transform::identity(),
            transformers: Vec::new(),
            hinting: false,
            min_visibility_scale: 0.0,
            max_visibility_scale: MAX_VISIBILITY_SCALE,
            observers: ObserverList::new(),
        }
    }

    // --- Style ---

    pub fn style(&self) -> Option<&Handle<Style>> {
        self.style.as_ref()
    }

    pub fn set_style(&mut self, style: Option<Handle<Style>>) {
        let changed = match (&self.style, &style) {
            (Some(a), Some(b)) => !std::rc::Rc::ptr_eq(a, b),
            (None, None) => false,
            _ => true,
        };
        if changed {
            self.style = style;
            self.notify();
        }
    }

    // --- Paths ---

    /// The shape's path list. The contained handles are shared with the
    /// owning icon's path container.
    pub fn paths(&self) -> &SharedContainer<VectorPath> {
        &self.paths
    }

    // --- Transform ---

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        if self.transform != transform {
            self.transform = transform;
            self.notify();
        }
    }

    pub fn reset_transform(&mut self) {
        self.set_transform(Transform::identity());
    }

    // --- Transformers ---

    pub fn transformers(&self) -> &[Transformer] {
        &self.transformers
    }

    pub fn add_transformer(&mut self, transformer: Transformer) {
        self.transformers.push(transformer);
        self.notify();
    }

    pub fn insert_transformer(&mut self, index: usize, transformer: Transformer) {
        let index = index.min(self.transformers.len());
        self.transformers.insert(index, transformer);
        self.notify();
    }

    pub fn remove_transformer(&mut self, index: usize) -> Option<Transformer> {
        if index >= self.transformers.len() {
            return None;
        }
        let removed = self.transformers.remove(index);
        self.notify();
        Some(removed)
    }

    pub fn count_transformers(&self) -> usize {
        self.transformers.len()
    }

    // --- Hinting and level of detail ---

    pub fn hinting(&self) -> bool {
        self.hinting
    }

    pub fn set_hinting(&mut self, hinting: bool) {
        if self.hinting != hinting {
            self.hinting = hinting;
            self.notify();
        }
    }

    pub fn min_visibility_scale(&self) -> f64 {
        self.min_visibility_scale
    }

    pub fn max_visibility_scale(&self) -> f64 {
        self.max_visibility_scale
    }

    /// Sets the minimum zoom at which the shape is rendered. Clamped to
    /// [0, 4]; the encoded resolution is 1/63.75.
    pub fn set_min_visibility_scale(&mut self, scale: f64) {
        let scale = scale.clamp(0.0, MAX_VISIBILITY_SCALE);
        if self.min_visibility_scale != scale {
            self.min_visibility_scale = scale;
            self.notify();
        }
    }

    pub fn set_max_visibility_scale(&mut self, scale: f64) {
        let scale = scale.clamp(0.0, MAX_VISIBILITY_SCALE);
        if self.max_visibility_scale != scale {
            self.max_visibility_scale = scale;
            self.notify();
        }
    }

    /// Whether the shape is rendered at the given global scale.
    ///
    /// A shape with the maximum visibility scale of 4.0 stays visible at
    /// any zoom beyond it.
    pub fn is_visible_at(&self, scale: f64) -> bool {
        if scale < self.min_visibility_scale {
            return false;
        }
        if scale > self.max_visibility_scale && self.max_visibility_scale < MAX_VISIBILITY_SCALE {
            return false;
        }
        true
    }
}

impl Observable for Shape {
    fn observer_list(&self) -> &ObserverList {
        &self.observers
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("has_style", &self.style.is_some())
            .field("paths", &self.paths.borrow().count_items())
            .field("transform", &self.transform)
            .field("transformers", &self.transformers.len())
            .field("hinting", &self.hinting)
            .field("lod", &(self.min_visibility_scale, self.max_visibility_scale))
            .finish()
    }
}
