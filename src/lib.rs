//! Vicon is a compact vector icon system for Rust. Icons are authored in
//! a 64-unit design space as styles (solid colors or gradients), cubic
//! bezier paths, and shapes binding the two through a transform pipeline;
//! the whole figure serializes to a bit-tight little-endian format that
//! typically fits in a few hundred bytes, small enough to live inline in
//! filesystem extended attributes while still rendering at any resolution
//! with full anti-aliasing. The crate also ships the editing core an icon
//! editor needs: an observable data model and a two-stack undo/redo
//! engine with time-windowed command coalescing.

pub mod command;
pub mod error;
pub mod format;
pub mod geom;
pub mod model;
pub mod observe;
pub mod render;
pub mod transformer;
pub mod utils;

pub mod prelude {
    pub use crate::command::{
        AddCommand, AssignStyleCommand, Command, CommandStack, CompoundCommand,
        FreezeTransformationCommand, MoveCommand, RemoveCommand, SetColorCommand,
        SetGradientCommand,
    };
    pub use crate::error::ViconError;
    pub use crate::format::{decode, encode, encode_message};
    pub use crate::geom::{Point, Rect, Transform};
    pub use crate::model::{
        ColorStop, Container, Gradient, GradientType, Handle, Icon, Interpolation, PathPoint,
        Rgba, Shape, Style, VectorPath,
    };
    pub use crate::observe::{Observable, Observer, observer_handle};
    pub use crate::render::{render, Background, Bitmap, IconRenderer, RenderOptions};
    pub use crate::transformer::{
        AffineTransformer, ContourTransformer, LineCap, LineJoin, StrokeTransformer, Transformer,
    };
    pub use crate::utils::{
        convert_cmap8_to_rgba, convert_rgba_to_cmap8, render_icon_attribute, Palette,
    };
}
