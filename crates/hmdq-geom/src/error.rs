//! Error types for the geometry computation.

use thiserror::Error;

/// Recoverable errors raised by the FOV geometry computation.
///
/// Broken mesh topology is not represented here: it is a precondition
/// violation and panics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// Input produces geometry with no usable extent or direction
    /// (zero-size frustum, collinear cut plane, zero-length vector).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Input data does not have the expected shape or values.
    #[error("invalid geometry input: {0}")]
    InvalidInput(String),
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeomError>;
