/// Error types for the geometry, matrix, model and rendering layers.
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by vector and point operations.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// A zero-length or non-finite vector was normalized.
    #[error("degenerate geometry: cannot normalize a zero-length or non-finite vector")]
    DegenerateGeometry,

    /// A homogeneous point had `w == 0` and cannot be projected back to 3-D.
    #[error("point at infinity: homogeneous w component is zero")]
    PointAtInfinity,

    /// Indexed component access past the vector's arity.
    #[error("index {index} out of range for a {len}-component vector")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors raised by dense matrix operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("invalid matrix dimensions {rows}x{cols}: both must be positive")]
    InvalidDimensions { rows: usize, cols: usize },

    /// Operand shapes are incompatible for the named operation.
    #[error("dimension mismatch in {op}: {left:?} vs {right:?}")]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("{op} requires a square matrix, got {rows}x{cols}")]
    NotSquare {
        op: &'static str,
        rows: usize,
        cols: usize,
    },

    /// No usable pivot was found while eliminating `column`.
    #[error("singular matrix: zero pivot in column {column}")]
    Singular { column: usize },

    /// Row data handed to a constructor was ragged.
    #[error("row {row} has {found} elements, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Errors raised while loading a model and its textures.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A face referenced a vertex or texture coordinate that does not exist.
    #[error("line {line}: {kind} index {index} out of range (have {count})")]
    IndexOutOfRange {
        line: usize,
        kind: &'static str,
        index: i64,
        count: usize,
    },

    #[error("failed to decode texture {}: {source}", path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Errors raised while writing a framebuffer to disk.
#[derive(Error, Debug)]
pub enum FramebufferError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Errors raised by the per-frame render driver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("invalid render config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// The sink does not match the renderer's depth buffer.
    #[error("image sink is {found:?}, renderer expects {expected:?}")]
    SinkSizeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

pub type MatrixResult<T> = Result<T, MatrixError>;
pub type ModelResult<T> = Result<T, ModelError>;
pub type RenderResult<T> = Result<T, RenderError>;
