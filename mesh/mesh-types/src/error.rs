//! Error types for mesh storage.

use thiserror::Error;

use crate::AttributeType;

/// Result type for mesh storage operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors raised while reading, writing or allocating mesh attributes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MeshError {
    /// The attribute stores a different element type than the accessor needs.
    #[error("attribute stores {actual:?} elements, expected {expected}")]
    TypeMismatch {
        /// What the accessor expected.
        expected: &'static str,
        /// What the attribute actually stores.
        actual: AttributeType,
    },

    /// Component count outside `1..=4`, or too small for the accessor.
    #[error("invalid component count {0}")]
    ComponentCount(usize),

    /// Stride smaller than the component count.
    #[error("stride {stride} is smaller than component count {component_count}")]
    InvalidStride {
        /// Requested stride, in elements.
        stride: usize,
        /// Components per element.
        component_count: usize,
    },

    /// Element index past the end of the attribute.
    #[error("element {index} out of range (attribute has {len} elements)")]
    IndexOutOfRange {
        /// Requested element.
        index: usize,
        /// Number of elements in the attribute.
        len: usize,
    },

    /// A stored index value is negative.
    #[error("element {index} holds negative index {value}")]
    NegativeIndex {
        /// Element holding the value.
        index: usize,
        /// The stored value.
        value: i32,
    },

    /// A value does not fit the attribute's storage type.
    #[error("value {value} does not fit in {ty:?} storage")]
    ValueOutOfRange {
        /// The value that was written.
        value: u64,
        /// Storage type of the attribute.
        ty: AttributeType,
    },

    /// A bulk write got the wrong number of values.
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Number of elements in the attribute.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// Backing storage holds fewer scalars than the layout addresses.
    #[error("attribute needs {needed} scalars but stores {actual}")]
    BufferTooShort {
        /// Scalars required by `stride * len`.
        needed: usize,
        /// Scalars actually stored.
        actual: usize,
    },

    /// Attribute layout cannot be used for the requested operation.
    #[error("unsupported attribute format: {reason}")]
    UnsupportedFormat {
        /// Why the layout was rejected.
        reason: String,
    },

    /// Face sizes do not add up to the corner count.
    #[error("face sizes sum to {face_total} corners but mesh has {corner_count}")]
    CornerCountMismatch {
        /// Sum of all face sizes.
        face_total: usize,
        /// Number of corners in the corner attribute.
        corner_count: usize,
    },

    /// A corner references a point that does not exist.
    #[error("corner {corner} references point {point} (mesh has {point_count} points)")]
    PointIndexOutOfRange {
        /// Offending corner.
        corner: usize,
        /// Point it references.
        point: u32,
        /// Number of points in the mesh.
        point_count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshError::PointIndexOutOfRange {
            corner: 4,
            point: 12,
            point_count: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains("corner 4"));
        assert!(msg.contains("point 12"));

        let err = MeshError::UnsupportedFormat {
            reason: "strided face sizes".to_string(),
        };
        assert!(format!("{err}").contains("strided face sizes"));
    }
}
