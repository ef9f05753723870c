//! The vector icon data model: colors, paths, styles, gradients, shapes
//! and the [`Icon`](icon::Icon) aggregate that owns them.
//!
//! Entities are owned by their icon through shared handles
//! (`Rc<RefCell<T>>`) held in ordered [`Container`](container::Container)s;
//! shapes reference styles and paths with non-owning clones of the same
//! handles, so teardown order is always safe.

pub mod container;
pub mod gradient;
pub mod icon;
pub mod path;
pub mod shape;
pub mod style;

pub use container::{Container, ContainerListener, Handle, SharedContainer};
pub use gradient::{ColorStop, Gradient, GradientType, Interpolation};
pub use icon::Icon;
pub use path::{PathPoint, VectorPath};
pub use shape::Shape;
pub use style::Style;

use std::fmt;
use std::str::FromStr;

use crate::error::ViconError;

/// A non-premultiplied RGBA color with 8 bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn gray(value: u8, alpha: u8) -> Self {
        Self { r: value, g: value, b: value, a: alpha }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// True when red, green and blue are equal, which lets the codec use a
    /// compact gray encoding.
    pub fn is_gray(&self) -> bool {
        self.r == self.g && self.r == self.b
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = ViconError;

    /// Parses any CSS color form (`#rrggbb`, `rgb(..)`, named colors, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let color = csscolorparser::parse(s)
            .map_err(|e| ViconError::InvalidArgument(format!("invalid color '{s}': {e}")))?;
        let [r, g, b, a] = color.to_rgba8();
        Ok(Rgba::new(r, g, b, a))
    }
}
