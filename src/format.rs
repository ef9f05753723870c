//! The flat icon wire format: shared constants, the little-endian bit
//! buffer, and the encoder/decoder pair.
//!
//! The format is a bit-tight little-endian encoding designed for icons of
//! a few hundred bytes: one magic word, then the style, path and shape
//! sections, each a `u8` count followed by that many variable-length
//! entries. Unknown tags inside a section carry a `u16` skip length so old
//! decoders survive new encoders.

pub mod buffer;
pub mod command_queue;
pub mod decoder;
pub mod encoder;
pub mod message;

pub use buffer::LittleEndianBuffer;
pub use decoder::decode;
pub use encoder::encode;
pub use message::encode_message;

use bitflags::bitflags;

/// The flat format magic: the bytes `"ficn"` read as a little-endian u32.
pub const FLAT_ICON_MAGIC: u32 = 0x6E63_6966;

/// The first four bytes of the keyed-archive container format.
pub const MESSAGE_MAGIC: &[u8; 4] = b"IMSG";

/// Hard per-section maximum: counts are stored in one byte.
pub const MAX_SECTION_COUNT: usize = 255;

// Style entry tags.
pub const STYLE_TYPE_SOLID_COLOR: u8 = 1;
pub const STYLE_TYPE_GRADIENT: u8 = 2;
pub const STYLE_TYPE_SOLID_COLOR_NO_ALPHA: u8 = 3;
pub const STYLE_TYPE_SOLID_GRAY: u8 = 4;
pub const STYLE_TYPE_SOLID_GRAY_NO_ALPHA: u8 = 5;

// Shape entry tags.
pub const SHAPE_TYPE_PATH_SOURCE: u8 = 10;

// Transformer entry tags.
pub const TRANSFORMER_TYPE_AFFINE: u8 = 20;
pub const TRANSFORMER_TYPE_CONTOUR: u8 = 21;
pub const TRANSFORMER_TYPE_PERSPECTIVE: u8 = 22;
pub const TRANSFORMER_TYPE_STROKE: u8 = 23;

// Packed 2-bit path segment commands.
pub const PATH_COMMAND_H_LINE: u8 = 0;
pub const PATH_COMMAND_V_LINE: u8 = 1;
pub const PATH_COMMAND_LINE: u8 = 2;
pub const PATH_COMMAND_CURVE: u8 = 3;

bitflags! {
    /// Flags of a gradient entry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct GradientFlags: u8 {
        const TRANSFORM = 1 << 1;
        const NO_ALPHA = 1 << 2;
        /// Reserved for 16-bit color channels; never emitted.
        const SIXTEEN_BIT_COLORS = 1 << 3;
        const GRAYS = 1 << 4;
    }
}

bitflags! {
    /// Flags of a path entry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct PathFlags: u8 {
        const CLOSED = 1 << 1;
        const USES_COMMANDS = 1 << 2;
        const NO_CURVES = 1 << 3;
    }
}

bitflags! {
    /// Flags of a shape entry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct ShapeFlags: u8 {
        const TRANSFORM = 1 << 1;
        const HINTING = 1 << 2;
        const LOD_SCALE = 1 << 3;
        const HAS_TRANSFORMERS = 1 << 4;
        const TRANSLATION = 1 << 5;
    }
}

/// Quantization factor of the level-of-detail scale pair: scales in
/// [0, 4] are stored in one byte at 1/63.75 resolution.
pub const LOD_SCALE_FACTOR: f64 = 63.75;
