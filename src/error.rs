// error.rs -- Error taxonomy shared by every fallible operation.
//
// Every variant is a local, synchronous validation failure. Nothing here is
// retryable: validation runs before any buffer is committed, so a caller
// never observes a half-built Image.

use crate::element::ElementKind;

/// Errors raised while constructing, indexing or combining images.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImageError {
    /// An element kind was named that is outside the supported set.
    #[error("element kind `{0}` is not supported")]
    TypeNotSupported(String),

    /// Zero or negative dimensions, or a transform whose buffers are too
    /// small for the requested shape.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Supplied data is shorter than the shape requires.
    #[error("supplied data too short: need {required} {unit}, got {actual}")]
    SizeMismatch {
        required: usize,
        actual: usize,
        unit: &'static str,
    },

    /// Element or coordinate access outside the container.
    #[error("index out of range: {0}")]
    IndexOutOfRange(String),

    /// Percentile level outside `[0, 100]`.
    #[error("percentile level {0} outside [0, 100]")]
    OutOfRange(String),

    /// Binary operation between differently shaped images.
    #[error("shape mismatch: {left:?} vs {right:?} (height, width)")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    /// Persisted or type-erased data holds a different element kind.
    #[error("element kind mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ElementKind,
        found: ElementKind,
    },

    /// Clamp bounds with `low > high` (or unordered, e.g. NaN).
    #[error("invalid range: low {low} is not <= high {high}")]
    InvalidRange { low: String, high: String },

    /// A slice selected no coordinates at all.
    #[error("selection is empty")]
    EmptySelection,
}

/// Crate-wide result alias.
pub type Result<T, E = ImageError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = ImageError::SizeMismatch {
            required: 32,
            actual: 8,
            unit: "bytes",
        };
        assert_eq!(err.to_string(), "supplied data too short: need 32 bytes, got 8");

        let err = ImageError::TypeMismatch {
            expected: ElementKind::F64,
            found: ElementKind::U8,
        };
        assert_eq!(err.to_string(), "element kind mismatch: expected f64, found u8");
    }
}
