//! Defines [`GeobindError`], representing all errors returned by this crate.

use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GeobindError {
    /// Access to a native handle that was already released or never
    /// initialized.
    #[error("access to a released or never-initialized native handle")]
    NullHandle,

    /// A native pointer reported a geometry kind other than the one the
    /// wrapper requires.
    #[error("expected {expected} geometry, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Malformed input text/binary, or the native factory returned null.
    #[error("could not construct geometry: {0}")]
    GeometryConstruction(String),

    /// The geometry cannot be represented or compared in the target engine.
    #[error("incompatible geometry: {0}")]
    IncompatibleGeometry(String),

    /// Collection membership violates the subtype's allowed child set.
    #[error("{child} is not an allowed member of {collection}")]
    InvalidChildType {
        collection: &'static str,
        child: &'static str,
    },

    /// A coordinate's dimensionality does not match the sequence it is
    /// written into.
    #[error("coordinate has {found} dimensions, sequence stores {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Out-of-range access into a coordinate sequence or collection.
    #[error("index {index} out of range for size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// Ordinate dimension outside `0..=2` (x, y, z).
    #[error("invalid ordinate dimension {0}, expected 0, 1 or 2")]
    InvalidOrdinate(usize),

    /// The native prepare call returned null.
    #[error("could not prepare geometry: {0}")]
    Preparation(String),

    /// The per-thread native engine session could not be created.
    #[error("could not initialize native engine session: {0}")]
    EngineInitialization(String),

    /// Spatial-reference input that cannot be resolved.
    #[error("could not resolve spatial reference: {0}")]
    SpatialReference(String),

    /// A native call reported failure through its error sentinel.
    #[error("native call {op} failed: {message}")]
    NativeCall {
        op: &'static str,
        message: String,
    },
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, GeobindError>;
