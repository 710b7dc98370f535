//! Polygon mesh made of point, corner and face attributes.

use std::ops::Range;

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttributeType};
use crate::error::{MeshError, MeshResult};
use crate::layout::MeshLayout;
use crate::traits::MeshTopology;

/// A polygon mesh in flattened form.
///
/// # Memory Layout
///
/// - `positions`: one 3D position per point
/// - `corners`: one point index per corner
/// - `face_sizes`: corner count of each face
///
/// Faces own consecutive runs of corners in order: face `f` owns the
/// `face_sizes[f]` corners that follow those of face `f - 1`. There is no
/// explicit face-to-corner pointer.
///
/// # Example
///
/// ```
/// use mesh_types::{PolyMesh, MeshTopology};
///
/// let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
/// let mesh = PolyMesh::from_polygons(&points, &[vec![0, 1, 2, 3]]).unwrap();
///
/// assert_eq!(mesh.point_count(), 4);
/// assert_eq!(mesh.corner_count(), 4);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolyMesh {
    /// Point positions.
    pub positions: Attribute,
    /// Corner-to-point indices.
    pub corners: Attribute,
    /// Corners per face.
    pub face_sizes: Attribute,
}

impl Default for PolyMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl PolyMesh {
    /// Empty mesh in the default layout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Attribute::empty(AttributeType::Float, 3),
            corners: Attribute::empty(AttributeType::Int, 1),
            face_sizes: Attribute::empty(AttributeType::Int, 1),
        }
    }

    /// Zero-filled mesh with the given counts.
    ///
    /// # Errors
    ///
    /// Returns an error if `layout` describes an invalid attribute.
    pub fn allocate(
        layout: &MeshLayout,
        point_count: usize,
        corner_count: usize,
        face_count: usize,
    ) -> MeshResult<Self> {
        Ok(Self {
            positions: Attribute::with_stride(
                layout.position_type,
                3,
                layout.position_stride,
                point_count,
            )?,
            corners: Attribute::zeroed(layout.corner_type, 1, corner_count)?,
            face_sizes: Attribute::with_stride(
                layout.face_size_type,
                1,
                layout.face_size_stride,
                face_count,
            )?,
        })
    }

    /// Build a mesh from positions and per-face point lists.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::PointIndexOutOfRange`] if a face references a
    /// missing point.
    pub fn from_polygons<F: AsRef<[u32]>>(points: &[[f64; 3]], faces: &[F]) -> MeshResult<Self> {
        Self::from_polygons_with_layout(&MeshLayout::default(), points, faces)
    }

    /// Build a mesh from positions and per-face point lists in a given layout.
    ///
    /// # Errors
    ///
    /// Same as [`PolyMesh::from_polygons`], plus layout errors.
    pub fn from_polygons_with_layout<F: AsRef<[u32]>>(
        layout: &MeshLayout,
        points: &[[f64; 3]],
        faces: &[F],
    ) -> MeshResult<Self> {
        let corner_count = faces.iter().map(|f| f.as_ref().len()).sum();
        let mut mesh = Self::allocate(layout, points.len(), corner_count, faces.len())?;

        for (i, p) in points.iter().enumerate() {
            mesh.positions.set_point(i, &Point3::new(p[0], p[1], p[2]))?;
        }

        let mut c = 0;
        for (f, face) in faces.iter().enumerate() {
            let face = face.as_ref();
            mesh.face_sizes.set_index(f, len_to_u32(face.len())?)?;
            for &point in face {
                mesh.corners.set_index(c, point)?;
                c += 1;
            }
        }

        mesh.validate()?;
        Ok(mesh)
    }

    /// Position of point `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn position(&self, index: usize) -> MeshResult<Point3<f64>> {
        self.positions.point(index)
    }

    /// Point referenced by corner `corner`.
    ///
    /// # Errors
    ///
    /// Returns an error if `corner` is out of range.
    pub fn corner_point(&self, corner: usize) -> MeshResult<u32> {
        self.corners.index(corner)
    }

    /// Corner count of face `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if `face` is out of range.
    pub fn face_size(&self, face: usize) -> MeshResult<u32> {
        self.face_sizes.index(face)
    }

    /// Corner range owned by each face, by running cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if a face size cannot be read.
    pub fn face_ranges(&self) -> MeshResult<Vec<Range<usize>>> {
        let mut cursor = 0;
        (0..self.face_count())
            .map(|f| {
                let start = cursor;
                cursor += self.face_size(f)? as usize;
                Ok(start..cursor)
            })
            .collect()
    }

    /// Point lists of every face.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is malformed.
    pub fn polygons(&self) -> MeshResult<Vec<Vec<u32>>> {
        self.face_ranges()?
            .into_iter()
            .map(|range| range.map(|c| self.corner_point(c)).collect())
            .collect()
    }

    /// Check that face sizes cover exactly the corners and that every corner
    /// references an existing point.
    ///
    /// # Errors
    ///
    /// [`MeshError::CornerCountMismatch`] or [`MeshError::PointIndexOutOfRange`].
    pub fn validate(&self) -> MeshResult<()> {
        let mut face_total = 0usize;
        for f in 0..self.face_count() {
            face_total += self.face_size(f)? as usize;
        }
        if face_total != self.corner_count() {
            return Err(MeshError::CornerCountMismatch {
                face_total,
                corner_count: self.corner_count(),
            });
        }

        let point_count = self.point_count();
        for corner in 0..self.corner_count() {
            let point = self.corner_point(corner)?;
            if point as usize >= point_count {
                return Err(MeshError::PointIndexOutOfRange {
                    corner,
                    point,
                    point_count,
                });
            }
        }
        Ok(())
    }

    /// Copy of this mesh where every corner gets its own point.
    ///
    /// Coincident points are left unmerged, which is what a triangle soup or a
    /// per-face export looks like before welding.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is malformed.
    pub fn split_corners(&self) -> MeshResult<Self> {
        let layout = MeshLayout {
            position_type: self.positions.attribute_type(),
            position_stride: self.positions.stride(),
            corner_type: self.corners.attribute_type(),
            face_size_type: self.face_sizes.attribute_type(),
            face_size_stride: self.face_sizes.stride(),
        };
        let corner_count = self.corner_count();
        let mut split = Self::allocate(&layout, corner_count, corner_count, self.face_count())?;

        for c in 0..corner_count {
            let p = self.position(self.corner_point(c)? as usize)?;
            split.positions.set_point(c, &p)?;
            split.corners.set_index(c, len_to_u32(c)?)?;
        }
        for f in 0..self.face_count() {
            split.face_sizes.set_index(f, self.face_size(f)?)?;
        }
        Ok(split)
    }
}

impl MeshTopology for PolyMesh {
    fn point_count(&self) -> usize {
        self.positions.len()
    }

    fn corner_count(&self) -> usize {
        self.corners.len()
    }

    fn face_count(&self) -> usize {
        self.face_sizes.len()
    }
}

fn len_to_u32(len: usize) -> MeshResult<u32> {
    u32::try_from(len).map_err(|_| MeshError::ValueOutOfRange {
        value: len as u64,
        ty: AttributeType::Int,
    })
}

/// Unit cube made of six quads, centered at the origin.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// assert_eq!(cube.point_count(), 8);
/// assert_eq!(cube.face_count(), 6);
/// assert_eq!(cube.corner_count(), 24);
/// ```
#[must_use]
pub fn unit_cube() -> PolyMesh {
    let positions: [[f32; 3]; 8] = [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ];
    let corners: [i32; 24] = [
        0, 3, 2, 1, // bottom
        4, 5, 6, 7, // top
        0, 1, 5, 4, // front
        2, 3, 7, 6, // back
        0, 4, 7, 3, // left
        1, 2, 6, 5, // right
    ];

    PolyMesh {
        positions: Attribute::from_points(&positions),
        corners: Attribute::from_int_slice(&corners),
        face_sizes: Attribute::from_int_slice(&[4; 6]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle_pair() -> PolyMesh {
        let points = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        PolyMesh::from_polygons(&points, &[vec![0, 1, 2], vec![0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_new_is_empty() {
        let mesh = PolyMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.corner_count(), 0);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_from_polygons() {
        let mesh = triangle_pair();
        assert_eq!(mesh.point_count(), 4);
        assert_eq!(mesh.corner_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.corner_point(4).unwrap(), 2);
        assert_eq!(mesh.face_size(1).unwrap(), 3);
        assert_relative_eq!(mesh.position(2).unwrap().y, 1.0);
    }

    #[test]
    fn test_from_polygons_rejects_bad_index() {
        let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let err = PolyMesh::from_polygons(&points, &[vec![0, 1, 7]]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::PointIndexOutOfRange {
                corner: 2,
                point: 7,
                point_count: 2
            }
        ));
    }

    #[test]
    fn test_face_ranges_use_running_cursor() {
        let mesh = triangle_pair();
        assert_eq!(mesh.face_ranges().unwrap(), vec![0..3, 3..6]);
        assert_eq!(mesh.polygons().unwrap(), vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn test_validate_corner_mismatch() {
        let mut mesh = triangle_pair();
        mesh.face_sizes.set_index(1, 4).unwrap();
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::CornerCountMismatch {
                face_total: 7,
                corner_count: 6
            })
        ));
    }

    #[test]
    fn test_unit_cube_is_valid() {
        let cube = unit_cube();
        assert!(cube.validate().is_ok());
        assert_eq!(cube.polygons().unwrap()[1], vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_split_corners() {
        let cube = unit_cube();
        let split = cube.split_corners().unwrap();

        assert_eq!(split.point_count(), 24);
        assert_eq!(split.corner_count(), 24);
        assert_eq!(split.face_count(), 6);
        assert!(split.validate().is_ok());
        for c in 0..24 {
            let original = cube.position(cube.corner_point(c).unwrap() as usize).unwrap();
            assert_eq!(split.position(c).unwrap(), original);
        }
    }

    #[test]
    fn test_double_layout() {
        let points = [[0.1, 0.2, 0.3]];
        let mesh = PolyMesh::from_polygons_with_layout(
            &MeshLayout::double_precision(),
            &points,
            &[] as &[Vec<u32>],
        )
        .unwrap();
        assert_relative_eq!(mesh.position(0).unwrap().x, 0.1);
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_mesh_round_trip() {
        let cube = unit_cube();
        let json = serde_json::to_string(&cube).unwrap();
        let back: PolyMesh = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cube);
    }

    #[test]
    fn test_mesh_with_short_positions_is_rejected() {
        let mut value = serde_json::to_value(unit_cube()).unwrap();
        value["positions"]["data"]["Float"] = serde_json::json!([0.0, 0.0, 0.0]);
        let err = serde_json::from_value::<PolyMesh>(value).unwrap_err();
        assert!(err.to_string().contains("needs 24 scalars but stores 3"));
    }
}
