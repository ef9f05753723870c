use thiserror::Error;

/// The main error type for the vicon crate.
///
/// This enum encompasses all error conditions reported by the library. It
/// uses the `thiserror` crate to provide automatic implementation of
/// `std::error::Error` and `Display`, making error handling consistent and
/// ergonomic.
///
/// Decoding and encoding surface errors; rendering never fails once a
/// renderer has been constructed — it draws whatever is present.
#[derive(Error, Debug)]
pub enum ViconError {
    /// The buffer does not start with a recognized magic number.
    #[error("invalid magic number")]
    InvalidMagic,

    /// The buffer ended in the middle of a structure.
    ///
    /// Decoding aborts as soon as a read runs past the end of the input;
    /// partially decoded entities are discarded.
    #[error("unexpected end of buffer")]
    Truncated,

    /// An icon holds more than 255 styles, which the flat format cannot
    /// represent.
    #[error("too many styles (at most 255)")]
    TooManyStyles,

    /// An icon holds more than 255 paths.
    #[error("too many paths (at most 255)")]
    TooManyPaths,

    /// A path holds more than 255 points.
    #[error("path has too many points (at most 255)")]
    PathTooManyPoints,

    /// An icon holds more than 255 shapes.
    #[error("too many shapes (at most 255)")]
    TooManyShapes,

    /// A shape references more than 255 paths.
    #[error("shape references too many paths (at most 255)")]
    ShapeTooManyPaths,

    /// A shape carries more than 255 transformers.
    #[error("shape has too many transformers (at most 255)")]
    ShapeTooManyTransformers,

    /// An unknown tag carried a skip length that runs past the end of the
    /// buffer.
    ///
    /// Unknown tags with a valid skip length are elided silently; this
    /// error is only reported when the length itself is corrupt.
    #[error("unknown tag with invalid skip length")]
    UnknownTag,

    /// A caller-supplied argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An allocation request was too large to satisfy.
    #[error("out of memory")]
    OutOfMemory,

    /// I/O error from standard library operations.
    ///
    /// This variant automatically converts `std::io::Error` instances via
    /// the `?` operator; it is surfaced verbatim from the enclosing shell.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
