//! Strided attribute buffers.
//!
//! An [`Attribute`] is a flat buffer of `len` elements, each made of
//! `component_count` scalars of one [`AttributeType`]. Consecutive elements
//! start `stride` scalars apart, so a host may interleave padding or other
//! data between them. Point positions, corner-to-point indices and face sizes
//! of a [`PolyMesh`](crate::PolyMesh) are all stored this way.
//!
//! # Example
//!
//! ```
//! use mesh_types::{Attribute, AttributeType, Point3};
//!
//! // Positions padded to four floats per point
//! let mut positions = Attribute::with_stride(AttributeType::Float, 3, 4, 2).unwrap();
//! positions.set_point(1, &Point3::new(1.0, 2.0, 3.0)).unwrap();
//!
//! assert_eq!(positions.point(1).unwrap(), Point3::new(1.0, 2.0, 3.0));
//! assert_eq!(positions.byte_stride(), 16);
//! ```

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};

/// Scalar type of the components of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeType {
    /// Unsigned 8-bit integer.
    UByte,
    /// Signed 32-bit integer.
    Int,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
}

impl AttributeType {
    /// Size in bytes of one component.
    #[must_use]
    pub const fn size_of(self) -> usize {
        match self {
            Self::UByte => 1,
            Self::Int | Self::Float => 4,
            Self::Double => 8,
        }
    }
}

/// Typed backing storage of an attribute.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeData {
    /// `u8` components.
    UByte(Vec<u8>),
    /// `i32` components.
    Int(Vec<i32>),
    /// `f32` components.
    Float(Vec<f32>),
    /// `f64` components.
    Double(Vec<f64>),
}

impl AttributeData {
    fn zeroed(ty: AttributeType, scalars: usize) -> Self {
        match ty {
            AttributeType::UByte => Self::UByte(vec![0; scalars]),
            AttributeType::Int => Self::Int(vec![0; scalars]),
            AttributeType::Float => Self::Float(vec![0.0; scalars]),
            AttributeType::Double => Self::Double(vec![0.0; scalars]),
        }
    }

    /// Number of stored scalars, padding included.
    #[must_use]
    pub fn scalar_count(&self) -> usize {
        match self {
            Self::UByte(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    /// Scalar type of this storage.
    #[must_use]
    pub const fn attribute_type(&self) -> AttributeType {
        match self {
            Self::UByte(_) => AttributeType::UByte,
            Self::Int(_) => AttributeType::Int,
            Self::Float(_) => AttributeType::Float,
            Self::Double(_) => AttributeType::Double,
        }
    }
}

/// A strided buffer of fixed-size elements.
///
/// Deserialization goes through the same layout checks as
/// [`Attribute::with_stride`] and rejects buffers shorter than
/// `stride * len` scalars.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawAttribute"))]
pub struct Attribute {
    data: AttributeData,
    component_count: usize,
    stride: usize,
    len: usize,
}

/// Unchecked wire form of an [`Attribute`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawAttribute {
    data: AttributeData,
    component_count: usize,
    stride: usize,
    len: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawAttribute> for Attribute {
    type Error = MeshError;

    fn try_from(raw: RawAttribute) -> MeshResult<Self> {
        Self::check_layout(raw.component_count, raw.stride)?;
        let needed = raw
            .stride
            .checked_mul(raw.len)
            .ok_or(MeshError::BufferTooShort {
                needed: usize::MAX,
                actual: raw.data.scalar_count(),
            })?;
        if raw.data.scalar_count() < needed {
            return Err(MeshError::BufferTooShort {
                needed,
                actual: raw.data.scalar_count(),
            });
        }
        Ok(Self {
            data: raw.data,
            component_count: raw.component_count,
            stride: raw.stride,
            len: raw.len,
        })
    }
}

impl Attribute {
    /// Allocate a zero-filled attribute with an explicit stride (in scalars).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::ComponentCount`] if `component_count` is not in
    /// `1..=4`, and [`MeshError::InvalidStride`] if `stride < component_count`.
    pub fn with_stride(
        ty: AttributeType,
        component_count: usize,
        stride: usize,
        len: usize,
    ) -> MeshResult<Self> {
        Self::check_layout(component_count, stride)?;
        Ok(Self {
            data: AttributeData::zeroed(ty, stride * len),
            component_count,
            stride,
            len,
        })
    }

    fn check_layout(component_count: usize, stride: usize) -> MeshResult<()> {
        if !(1..=4).contains(&component_count) {
            return Err(MeshError::ComponentCount(component_count));
        }
        if stride < component_count {
            return Err(MeshError::InvalidStride {
                stride,
                component_count,
            });
        }
        Ok(())
    }

    /// Allocate a zero-filled, tightly packed attribute.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::ComponentCount`] if `component_count` is not in `1..=4`.
    pub fn zeroed(ty: AttributeType, component_count: usize, len: usize) -> MeshResult<Self> {
        Self::with_stride(ty, component_count, component_count, len)
    }

    /// Empty packed attribute. Caller guarantees `1..=4` components.
    pub(crate) const fn empty(ty: AttributeType, component_count: usize) -> Self {
        let data = match ty {
            AttributeType::UByte => AttributeData::UByte(Vec::new()),
            AttributeType::Int => AttributeData::Int(Vec::new()),
            AttributeType::Float => AttributeData::Float(Vec::new()),
            AttributeType::Double => AttributeData::Double(Vec::new()),
        };
        Self {
            data,
            component_count,
            stride: component_count,
            len: 0,
        }
    }

    /// Packed `Float`×3 positions.
    #[must_use]
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        Self {
            data: AttributeData::Float(points.iter().flatten().copied().collect()),
            component_count: 3,
            stride: 3,
            len: points.len(),
        }
    }

    /// Packed single-component `Int` indices.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::ValueOutOfRange`] if an index exceeds `i32::MAX`.
    pub fn from_indices(indices: &[u32]) -> MeshResult<Self> {
        let data = indices
            .iter()
            .map(|&value| to_int(value))
            .collect::<MeshResult<Vec<_>>>()?;
        Ok(Self {
            data: AttributeData::Int(data),
            component_count: 1,
            stride: 1,
            len: indices.len(),
        })
    }

    /// Packed single-component `Int` attribute over raw values.
    pub(crate) fn from_int_slice(values: &[i32]) -> Self {
        Self {
            data: AttributeData::Int(values.to_vec()),
            component_count: 1,
            stride: 1,
            len: values.len(),
        }
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the attribute holds no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Scalar type of the components.
    #[must_use]
    pub const fn attribute_type(&self) -> AttributeType {
        self.data.attribute_type()
    }

    /// Components per element.
    #[must_use]
    pub const fn component_count(&self) -> usize {
        self.component_count
    }

    /// Distance between consecutive elements, in scalars.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Distance between consecutive elements, in bytes.
    #[must_use]
    pub const fn byte_stride(&self) -> usize {
        self.stride * self.attribute_type().size_of()
    }

    /// Whether elements follow each other with no padding.
    #[must_use]
    pub const fn is_packed(&self) -> bool {
        self.stride == self.component_count
    }

    /// Raw backing storage, padding included.
    #[must_use]
    pub const fn data(&self) -> &AttributeData {
        &self.data
    }

    fn base(&self, index: usize) -> MeshResult<usize> {
        if index < self.len {
            Ok(index * self.stride)
        } else {
            Err(MeshError::IndexOutOfRange {
                index,
                len: self.len,
            })
        }
    }

    fn require_components(&self, needed: usize) -> MeshResult<()> {
        if self.component_count < needed {
            return Err(MeshError::ComponentCount(self.component_count));
        }
        Ok(())
    }

    /// Read element `index` as a 3D point.
    ///
    /// # Errors
    ///
    /// Fails if the attribute is not `Float`/`Double`, has fewer than three
    /// components, or `index` is out of range.
    pub fn point(&self, index: usize) -> MeshResult<Point3<f64>> {
        self.require_components(3)?;
        let b = self.base(index)?;
        match &self.data {
            AttributeData::Float(v) => Ok(Point3::new(
                f64::from(v[b]),
                f64::from(v[b + 1]),
                f64::from(v[b + 2]),
            )),
            AttributeData::Double(v) => Ok(Point3::new(v[b], v[b + 1], v[b + 2])),
            other => Err(MeshError::TypeMismatch {
                expected: "Float or Double",
                actual: other.attribute_type(),
            }),
        }
    }

    /// Write element `index` from a 3D point. `Float` storage narrows to `f32`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Attribute::point`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_point(&mut self, index: usize, p: &Point3<f64>) -> MeshResult<()> {
        self.require_components(3)?;
        let b = self.base(index)?;
        match &mut self.data {
            AttributeData::Float(v) => {
                v[b] = p.x as f32;
                v[b + 1] = p.y as f32;
                v[b + 2] = p.z as f32;
                Ok(())
            }
            AttributeData::Double(v) => {
                v[b] = p.x;
                v[b + 1] = p.y;
                v[b + 2] = p.z;
                Ok(())
            }
            other => Err(MeshError::TypeMismatch {
                expected: "Float or Double",
                actual: other.attribute_type(),
            }),
        }
    }

    /// Read the first component of element `index` as an index.
    ///
    /// # Errors
    ///
    /// Fails if the attribute is not `Int`/`UByte`, the stored value is
    /// negative, or `index` is out of range.
    pub fn index(&self, index: usize) -> MeshResult<u32> {
        let b = self.base(index)?;
        match &self.data {
            AttributeData::Int(v) => {
                u32::try_from(v[b]).map_err(|_| MeshError::NegativeIndex {
                    index,
                    value: v[b],
                })
            }
            AttributeData::UByte(v) => Ok(u32::from(v[b])),
            other => Err(MeshError::TypeMismatch {
                expected: "Int or UByte",
                actual: other.attribute_type(),
            }),
        }
    }

    /// Write the first component of element `index`.
    ///
    /// # Errors
    ///
    /// Fails if the attribute is not `Int`/`UByte`, the value does not fit
    /// the storage type, or `index` is out of range.
    pub fn set_index(&mut self, index: usize, value: u32) -> MeshResult<()> {
        let b = self.base(index)?;
        match &mut self.data {
            AttributeData::Int(v) => {
                v[b] = to_int(value)?;
                Ok(())
            }
            AttributeData::UByte(v) => {
                v[b] = u8::try_from(value).map_err(|_| MeshError::ValueOutOfRange {
                    value: u64::from(value),
                    ty: AttributeType::UByte,
                })?;
                Ok(())
            }
            other => Err(MeshError::TypeMismatch {
                expected: "Int or UByte",
                actual: other.attribute_type(),
            }),
        }
    }

    /// Gather every element as an index.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Attribute::index`].
    pub fn indices(&self) -> MeshResult<Vec<u32>> {
        (0..self.len).map(|i| self.index(i)).collect()
    }

    /// Gather every element as a point.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Attribute::point`].
    pub fn points(&self) -> MeshResult<Vec<Point3<f64>>> {
        (0..self.len).map(|i| self.point(i)).collect()
    }

    /// Overwrite the whole attribute with `values` in one block copy.
    ///
    /// Only packed single-component `Int` storage is accepted; any other
    /// layout is reported as [`MeshError::UnsupportedFormat`].
    ///
    /// # Errors
    ///
    /// [`MeshError::LengthMismatch`] if `values.len() != self.len()`,
    /// [`MeshError::UnsupportedFormat`] for an incompatible layout and
    /// [`MeshError::ValueOutOfRange`] for values above `i32::MAX`.
    pub fn copy_indices_from(&mut self, values: &[u32]) -> MeshResult<()> {
        if values.len() != self.len {
            return Err(MeshError::LengthMismatch {
                expected: self.len,
                actual: values.len(),
            });
        }
        if self.component_count != 1 || !self.is_packed() {
            return Err(MeshError::UnsupportedFormat {
                reason: format!(
                    "block index copy needs packed single-component storage, attribute has {} components at a {}-byte stride",
                    self.component_count,
                    self.byte_stride()
                ),
            });
        }
        match &mut self.data {
            AttributeData::Int(v) => {
                for (slot, &value) in v.iter_mut().zip(values) {
                    *slot = to_int(value)?;
                }
                Ok(())
            }
            other => Err(MeshError::UnsupportedFormat {
                reason: format!(
                    "block index copy needs Int storage, attribute stores {:?}",
                    other.attribute_type()
                ),
            }),
        }
    }
}

fn to_int(value: u32) -> MeshResult<i32> {
    i32::try_from(value).map_err(|_| MeshError::ValueOutOfRange {
        value: u64::from(value),
        ty: AttributeType::Int,
    })
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_serde_round_trip() {
        let mut attr = Attribute::with_stride(AttributeType::Float, 3, 4, 2).unwrap();
        attr.set_point(1, &Point3::new(1.0, 2.0, 3.0)).unwrap();

        let json = serde_json::to_string(&attr).unwrap();
        let back: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attr);
        assert_eq!(back.point(1).unwrap(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_deserialize_rejects_short_buffer() {
        let json = r#"{"data":{"Float":[]},"component_count":3,"stride":3,"len":5}"#;
        let err = serde_json::from_str::<Attribute>(json).unwrap_err();
        assert!(err.to_string().contains("needs 15 scalars but stores 0"));
    }

    #[test]
    fn test_deserialize_rejects_bad_layout() {
        let json = r#"{"data":{"Int":[0,0]},"component_count":2,"stride":1,"len":1}"#;
        assert!(serde_json::from_str::<Attribute>(json).is_err());

        let json = r#"{"data":{"Int":[]},"component_count":0,"stride":0,"len":0}"#;
        assert!(serde_json::from_str::<Attribute>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_overflowing_layout() {
        let json = format!(
            r#"{{"data":{{"Int":[1]}},"component_count":1,"stride":2,"len":{}}}"#,
            usize::MAX
        );
        assert!(serde_json::from_str::<Attribute>(&json).is_err());
    }
}
