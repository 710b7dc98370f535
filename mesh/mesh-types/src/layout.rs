//! Output attribute layouts and the allocation seam.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::attribute::AttributeType;
use crate::error::MeshResult;
use crate::mesh::PolyMesh;

/// Types and strides used when allocating a [`PolyMesh`].
///
/// Strides are in scalars, like [`Attribute::stride`](crate::Attribute::stride).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshLayout {
    /// Scalar type of point positions. Default: `Float`
    pub position_type: AttributeType,
    /// Stride of point positions. Default: `3`
    pub position_stride: usize,
    /// Scalar type of corner-to-point indices. Default: `Int`
    pub corner_type: AttributeType,
    /// Scalar type of face sizes. Default: `Int`
    pub face_size_type: AttributeType,
    /// Stride of face sizes. Default: `1`
    pub face_size_stride: usize,
}

impl Default for MeshLayout {
    fn default() -> Self {
        Self {
            position_type: AttributeType::Float,
            position_stride: 3,
            corner_type: AttributeType::Int,
            face_size_type: AttributeType::Int,
            face_size_stride: 1,
        }
    }
}

impl MeshLayout {
    /// Packed layout with `f64` positions.
    #[must_use]
    pub fn double_precision() -> Self {
        Self {
            position_type: AttributeType::Double,
            ..Default::default()
        }
    }

    /// Set the position stride.
    #[must_use]
    pub const fn with_position_stride(mut self, stride: usize) -> Self {
        self.position_stride = stride;
        self
    }

    /// Set the face-size storage type and stride.
    #[must_use]
    pub const fn with_face_sizes(mut self, ty: AttributeType, stride: usize) -> Self {
        self.face_size_type = ty;
        self.face_size_stride = stride;
        self
    }
}

/// Hands out freshly sized output meshes.
///
/// This is the capability a mesh operation receives for writing its result.
/// Each call replaces whatever the allocator handed out before.
pub trait MeshAllocator {
    /// Allocate an output mesh with the given element counts.
    ///
    /// # Errors
    ///
    /// Implementations report layouts they cannot build.
    fn allocate(
        &mut self,
        point_count: usize,
        corner_count: usize,
        face_count: usize,
    ) -> MeshResult<&mut PolyMesh>;
}

/// Allocator that owns the mesh it hands out.
///
/// # Example
///
/// ```
/// use mesh_types::{MeshAllocator, MeshTopology, OwnedAllocator};
///
/// let mut alloc = OwnedAllocator::default();
/// alloc.allocate(4, 6, 2).unwrap();
///
/// let mesh = alloc.into_mesh().unwrap();
/// assert_eq!(mesh.point_count(), 4);
/// assert_eq!(mesh.corner_count(), 6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OwnedAllocator {
    layout: MeshLayout,
    mesh: Option<PolyMesh>,
}

impl OwnedAllocator {
    /// Allocator producing meshes in `layout`.
    #[must_use]
    pub const fn new(layout: MeshLayout) -> Self {
        Self { layout, mesh: None }
    }

    /// Layout used for allocations.
    #[must_use]
    pub const fn layout(&self) -> &MeshLayout {
        &self.layout
    }

    /// The last allocated mesh, if any.
    #[must_use]
    pub const fn mesh(&self) -> Option<&PolyMesh> {
        self.mesh.as_ref()
    }

    /// Take the last allocated mesh.
    #[must_use]
    pub fn into_mesh(self) -> Option<PolyMesh> {
        self.mesh
    }
}

impl MeshAllocator for OwnedAllocator {
    fn allocate(
        &mut self,
        point_count: usize,
        corner_count: usize,
        face_count: usize,
    ) -> MeshResult<&mut PolyMesh> {
        let mesh = PolyMesh::allocate(&self.layout, point_count, corner_count, face_count)?;
        Ok(self.mesh.insert(mesh))
    }
}
