use crate::geom::Transform;
use crate::model::Rgba;
use crate::observe::{Observable, ObserverList};

/// The spatial layout of a gradient.
///
/// Values are the on-disk tags of the flat format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GradientType {
    #[default]
    Linear = 0,
    /// Radial falloff from the gradient origin.
    Circular = 1,
    Diamond = 2,
    Conic = 3,
    Xy = 4,
    SqrtXy = 5,
}

impl GradientType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => GradientType::Circular,
            2 => GradientType::Diamond,
            3 => GradientType::Conic,
            4 => GradientType::Xy,
            5 => GradientType::SqrtXy,
            _ => GradientType::Linear,
        }
    }
}

/// How colors between two stops are interpolated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Interpolation {
    Linear = 0,
    /// Symmetric quadratic easing: `w < 0.5 → 2w²`, else `1 − 2(1−w)²`.
    #[default]
    Smooth = 1,
}

/// One keyframe of a gradient: a color at an offset in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

impl ColorStop {
    pub fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// A color gradient: an ordered list of color stops plus a spatial layout,
/// an interpolation mode and its own affine transform.
///
/// Stops are kept sorted by ascending offset at all times. A gradient with
/// zero stops is invalid and cannot be encoded.
pub struct Gradient {
    transform: Transform,
    stops: Vec<ColorStop>,
    gradient_type: GradientType,
    interpolation: Interpolation,
    inherit_transformation: bool,
    observers: ObserverList,
}

impl Default for Gradient {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Gradient {
    fn clone(&self) -> Self {
        Self {
            transform: self.transform,
            stops: self.stops.clone(),
            gradient_type: self.gradient_type,
            interpolation: self.interpolation,
            inherit_transformation: self.inherit_transformation,
            observers: ObserverList::new(),
        }
    }
}

impl PartialEq for Gradient {
    fn eq(&self, other: &Self) -> bool {
        self.transform == other.transform
            && self.stops == other.stops
            && self.gradient_type == other.gradient_type
            && self.interpolation == other.interpolation
            && self.inherit_transformation == other.inherit_transformation
    }
}

impl std::fmt::Debug for Gradient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gradient")
            .field("type", &self.gradient_type)
            .field("interpolation", &self.interpolation)
            .field("inherit_transformation", &self.inherit_transformation)
            .field("stops", &self.stops)
            .field("transform", &self.transform)
            .finish()
    }
}

impl Gradient {
    /// A default black-to-white gradient with two stops.
    pub fn new() -> Self {
        let mut gradient = Self::new_empty();
        gradient.stops.push(ColorStop::new(0.0, Rgba::BLACK));
        gradient.stops.push(ColorStop::new(1.0, Rgba::WHITE));
        gradient
    }

    /// A gradient without stops, used by the decoder. Invalid until stops
    /// are added.
    pub fn new_empty() -> Self {
        Self {
            transform: Transform::identity(),
            stops: Vec::new(),
            gradient_type: GradientType::default(),
            interpolation: Interpolation::default(),
            inherit_transformation: true,
            observers: ObserverList::new(),
        }
    }

    // --- Stops ---

    /// Inserts a stop keeping the list sorted by ascending offset; equal
    /// offsets keep insertion order. Returns the insertion index.
    pub fn add_stop(&mut self, color: Rgba, offset: f32) -> usize {
        let stop = ColorStop::new(offset.clamp(0.0, 1.0), color);
        let index = self
            .stops
            .iter()
            .position(|s| s.offset > stop.offset)
            .unwrap_or(self.stops.len());
        self.stops.insert(index, stop);
        self.notify();
        index
    }

    pub fn remove_stop(&mut self, index: usize) -> Option<ColorStop> {
        if index >= self.stops.len() {
            return None;
        }
        let removed = self.stops.remove(index);
        self.notify();
        Some(removed)
    }

    /// Changes the color of the stop at `index`.
    pub fn set_stop_color(&mut self, index: usize, color: Rgba) -> bool {
        match self.stops.get_mut(index) {
            Some(stop) if stop.color != color => {
                stop.color = color;
                self.notify();
                true
            }
            Some(_) => false,
            None => false,
        }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn count_stops(&self) -> usize {
        self.stops.len()
    }

    // --- Properties ---

    pub fn gradient_type(&self) -> GradientType {
        self.gradient_type
    }

    pub fn set_gradient_type(&mut self, gradient_type: GradientType) {
        if self.gradient_type != gradient_type {
            self.gradient_type = gradient_type;
            self.notify();
        }
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        if self.interpolation != interpolation {
            self.interpolation = interpolation;
            self.notify();
        }
    }

    pub fn inherit_transformation(&self) -> bool {
        self.inherit_transformation
    }

    pub fn set_inherit_transformation(&mut self, inherit: bool) {
        if self.inherit_transformation != inherit {
            self.inherit_transformation = inherit;
            self.notify();
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        if self.transform != transform {
            self.transform = transform;
            self.notify();
        }
    }

    /// True when any stop has an alpha below 255.
    pub fn has_transparency(&self) -> bool {
        self.stops.iter().any(|s| s.color.a < 255)
    }

    // --- Color table ---

    /// Fills `colors` with the gradient ramp sampled at 256 offsets.
    ///
    /// Offsets before the first and after the last stop clamp to the
    /// terminal colors. A gradient without stops fills transparent black.
    pub fn make_color_table(&self, colors: &mut [Rgba; 256]) {
        if self.stops.is_empty() {
            colors.fill(Rgba::TRANSPARENT);
            return;
        }
        let first = self.stops.first().unwrap();
        let last = self.stops.last().unwrap();

        for (i, slot) in colors.iter_mut().enumerate() {
            let offset = i as f32 / 255.0;
            *slot = if offset <= first.offset {
                first.color
            } else if offset >= last.offset {
                last.color
            } else {
                // The pair of stops straddling this offset; sorted order
                // guarantees it exists.
                let hi = self.stops.iter().position(|s| s.offset >= offset).unwrap();
                let from = &self.stops[hi - 1];
                let to = &self.stops[hi];
                let span = to.offset - from.offset;
                if span <= f32::EPSILON {
                    to.color
                } else {
                    let mut w = (offset - from.offset) / span;
                    if self.interpolation == Interpolation::Smooth {
                        w = smooth_weight(w);
                    }
                    lerp_color(from.color, to.color, w)
                }
            };
        }
    }
}

impl Observable for Gradient {
    fn observer_list(&self) -> &ObserverList {
        &self.observers
    }
}

/// The symmetric quadratic easing curve of the smooth interpolation mode.
fn smooth_weight(w: f32) -> f32 {
    if w < 0.5 {
        2.0 * w * w
    } else {
        let f = 1.0 - w;
        1.0 - 2.0 * f * f
    }
}

fn lerp_color(from: Rgba, to: Rgba, w: f32) -> Rgba {
    let mix = |a: u8, b: u8| -> u8 {
        (a as f32 + (b as f32 - a as f32) * w + 0.5).floor().clamp(0.0, 255.0) as u8
    };
    Rgba::new(
        mix(from.r, to.r),
        mix(from.g, to.g),
        mix(from.b, to.b),
        mix(from.a, to.a),
    )
}
