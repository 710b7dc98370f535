//! Traits for mesh types.

/// Element counts of a polygon mesh.
///
/// Points carry positions, corners reference points, and faces own
/// consecutive runs of corners.
pub trait MeshTopology {
    /// Number of points.
    fn point_count(&self) -> usize;

    /// Number of corners (face-vertex references).
    fn corner_count(&self) -> usize;

    /// Number of faces.
    fn face_count(&self) -> usize;

    /// Whether the mesh has no points.
    fn is_empty(&self) -> bool {
        self.point_count() == 0
    }
}
