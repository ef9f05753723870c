use crate::model::gradient::Gradient;
use crate::model::Rgba;
use crate::observe::{Observable, ObserverList};

/// A coloring rule applied to a shape: either a single solid color or a
/// [`Gradient`].
///
/// A style always carries a color; when a gradient is set, the gradient
/// takes precedence and the solid color is kept as the fallback the editor
/// returns to when the gradient is removed.
pub struct Style {
    color: Rgba,
    gradient: Option<Gradient>,
    observers: ObserverList,
}

impl Default for Style {
    fn default() -> Self {
        Self::new(Rgba::BLACK)
    }
}

impl Clone for Style {
    fn clone(&self) -> Self {
        Self {
            color: self.color,
            gradient: self.gradient.clone(),
            observers: ObserverList::new(),
        }
    }
}

impl PartialEq for Style {
    fn eq(&self, other: &Self) -> bool {
        self.color == other.color && self.gradient == other.gradient
    }
}

impl std::fmt::Debug for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Style")
            .field("color", &self.color)
            .field("gradient", &self.gradient)
            .finish()
    }
}

impl Style {
    pub fn new(color: Rgba) -> Self {
        Self { color, gradient: None, observers: ObserverList::new() }
    }

    pub fn with_gradient(gradient: Gradient) -> Self {
        Self {
            color: Rgba::BLACK,
            gradient: Some(gradient),
            observers: ObserverList::new(),
        }
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba) {
        if self.color != color {
            self.color = color;
            self.notify();
        }
    }

    pub fn gradient(&self) -> Option<&Gradient> {
        self.gradient.as_ref()
    }

    pub fn gradient_mut(&mut self) -> Option<&mut Gradient> {
        self.gradient.as_mut()
    }

    /// Installs, replaces or removes the gradient.
    pub fn set_gradient(&mut self, gradient: Option<Gradient>) {
        match (&self.gradient, &gradient) {
            (None, None) => return,
            (Some(current), Some(new)) if current == new => return,
            _ => {}
        }
        self.gradient = gradient;
        self.notify();
    }

    /// True when rendering this style blends with what is already on the
    /// target: a solid color with alpha below 255, or a gradient with any
    /// transparent stop.
    pub fn has_transparency(&self) -> bool {
        match &self.gradient {
            Some(gradient) => gradient.has_transparency(),
            None => self.color.a < 255,
        }
    }
}

impl Observable for Style {
    fn observer_list(&self) -> &ObserverList {
        &self.observers
    }
}
