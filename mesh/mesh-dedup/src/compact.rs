//! Corner and face compaction after point merging.
//!
//! Faces are walked in order with a running corner cursor. Within a face, a
//! corner whose merged point already appeared earlier in the same face is
//! dropped. A face left with fewer than two distinct points is dropped along
//! with all of its corners.
//!
//! Dropped corners are tracked with a cumulative offset per corner: the number
//! of corners removed before it. A corner survives exactly when its offset
//! equals the offset of the next corner (or the final removed count for the
//! last corner), and then lands at `corner - offset[corner]`.

// Corner and point counts fit in u32 (attribute indices are u32)
#![allow(clippy::cast_possible_truncation)]

use hashbrown::HashSet;
use mesh_types::MeshError;

use crate::error::{DedupError, DedupResult};
use crate::resolve::Equivalence;

/// Compacted topology of a mesh after merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compaction {
    corner_offset: Vec<u32>,
    removed_corners: u32,
    input_face_sizes: Vec<u32>,
    kept_faces: Vec<bool>,
    face_sizes: Vec<u32>,
    corners: Vec<u32>,
}

impl Compaction {
    /// Compact `corners`/`face_sizes` against `equivalence`.
    ///
    /// Returned corners already reference compacted point indices.
    ///
    /// # Errors
    ///
    /// - [`MeshError::CornerCountMismatch`] if the face sizes do not cover
    ///   `corners` exactly
    /// - [`MeshError::PointIndexOutOfRange`] if a corner references a point
    ///   the equivalence does not cover
    pub fn compute(
        corners: &[u32],
        face_sizes: &[u32],
        equivalence: &Equivalence,
    ) -> DedupResult<Self> {
        let face_total: usize = face_sizes.iter().map(|&s| s as usize).sum();
        if face_total != corners.len() {
            return Err(MeshError::CornerCountMismatch {
                face_total,
                corner_count: corners.len(),
            }
            .into());
        }

        let assign = equivalence.assign();
        let mut corner_offset = vec![0u32; corners.len()];
        let mut removed = 0u32;
        let mut kept_faces = Vec::with_capacity(face_sizes.len());
        let mut new_face_sizes = Vec::with_capacity(face_sizes.len());
        let mut seen: HashSet<u32> = HashSet::new();

        let mut v = 0;
        for &size in face_sizes {
            let end = v + size as usize;
            let mut surviving = size;
            seen.clear();

            for c in v..end {
                let point = corners[c];
                let merged = *assign.get(point as usize).ok_or(MeshError::PointIndexOutOfRange {
                    corner: c,
                    point,
                    point_count: assign.len(),
                })?;
                corner_offset[c] = removed;
                if !seen.insert(merged) {
                    removed += 1;
                    surviving -= 1;
                }
            }

            if surviving > 1 {
                new_face_sizes.push(surviving);
                kept_faces.push(true);
            } else {
                // Rewrite offsets so every corner of the face counts as removed
                if size > 0 {
                    removed = corner_offset[v];
                    for c in v..end {
                        corner_offset[c] = removed;
                        removed += 1;
                    }
                }
                kept_faces.push(false);
            }
            v = end;
        }

        let mut compaction = Self {
            corner_offset,
            removed_corners: removed,
            input_face_sizes: face_sizes.to_vec(),
            kept_faces,
            face_sizes: new_face_sizes,
            corners: Vec::new(),
        };
        compaction.corners = compaction.compact_corners(corners, equivalence)?;
        Ok(compaction)
    }

    fn compact_corners(&self, corners: &[u32], equivalence: &Equivalence) -> DedupResult<Vec<u32>> {
        let mut compacted = Vec::with_capacity(self.output_corner_count());
        for (c, &point) in corners.iter().enumerate() {
            if self.is_corner_removed(c) {
                continue;
            }
            let target = c - self.corner_offset[c] as usize;
            if target != compacted.len() {
                return Err(DedupError::invariant(format!(
                    "corner {c} maps to slot {target}, expected {}",
                    compacted.len()
                )));
            }
            let mapped = equivalence.compacted_point(point).ok_or_else(|| {
                DedupError::invariant(format!("corner {c} references unmapped point {point}"))
            })?;
            compacted.push(mapped);
        }
        Ok(compacted)
    }

    /// Removed corners before each input corner.
    #[must_use]
    pub fn corner_offset(&self) -> &[u32] {
        &self.corner_offset
    }

    /// Total number of corners removed.
    #[must_use]
    pub const fn removed_corners(&self) -> usize {
        self.removed_corners as usize
    }

    /// Whether input corner `corner` is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `corner` is not an input corner index.
    #[must_use]
    pub fn is_corner_removed(&self, corner: usize) -> bool {
        let next = self
            .corner_offset
            .get(corner + 1)
            .copied()
            .unwrap_or(self.removed_corners);
        self.corner_offset[corner] != next
    }

    /// Per input face, whether it survives.
    #[must_use]
    pub fn kept_faces(&self) -> &[bool] {
        &self.kept_faces
    }

    /// Number of input faces dropped.
    #[must_use]
    pub fn removed_faces(&self) -> usize {
        self.kept_faces.iter().filter(|&&kept| !kept).count()
    }

    /// Surviving corner count of each kept face, in input order.
    #[must_use]
    pub fn face_sizes(&self) -> &[u32] {
        &self.face_sizes
    }

    /// Compacted point index of each surviving corner.
    #[must_use]
    pub fn corners(&self) -> &[u32] {
        &self.corners
    }

    /// Number of corners in the output.
    #[must_use]
    pub fn output_corner_count(&self) -> usize {
        self.corner_offset.len() - self.removed_corners()
    }

    /// Number of faces in the output.
    #[must_use]
    pub fn output_face_count(&self) -> usize {
        self.face_sizes.len()
    }

    /// Verify that every input face was either dropped with all its corners,
    /// or kept with more than one surviving corner.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::BrokenInvariant`] describing the first violation.
    pub fn check(&self) -> DedupResult<()> {
        let mut v = 0;
        let mut kept = self.face_sizes.iter();
        for (f, (&size, &is_kept)) in self.input_face_sizes.iter().zip(&self.kept_faces).enumerate() {
            let size = size as usize;
            let removed = (v..v + size).filter(|&c| self.is_corner_removed(c)).count();
            let surviving = size - removed;

            if is_kept {
                if surviving <= 1 {
                    return Err(DedupError::invariant(format!(
                        "face {f} kept with {surviving} corners"
                    )));
                }
                if kept.next().map(|&s| s as usize) != Some(surviving) {
                    return Err(DedupError::invariant(format!(
                        "face {f} recorded with a size other than {surviving}"
                    )));
                }
            } else if removed != size {
                return Err(DedupError::invariant(format!(
                    "face {f} dropped but {surviving} of its corners survive"
                )));
            }
            v += size;
        }

        let total: usize = self.face_sizes.iter().map(|&s| s as usize).sum();
        if total != self.corners.len() {
            return Err(DedupError::invariant(format!(
                "kept faces own {total} corners, output has {}",
                self.corners.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdtree::KdTree;
    use nalgebra::Point3;

    fn equivalence(points: &[[f64; 3]], threshold: f64) -> Equivalence {
        let points: Vec<_> = points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect();
        let tree = KdTree::build(&points).unwrap();
        Equivalence::resolve(&tree, threshold)
    }

    #[test]
    fn test_no_merge_is_identity() {
        let eq = Equivalence::identity(4);
        let compaction = Compaction::compute(&[0, 1, 2, 0, 2, 3], &[3, 3], &eq).unwrap();

        assert_eq!(compaction.removed_corners(), 0);
        assert_eq!(compaction.face_sizes(), &[3, 3]);
        assert_eq!(compaction.corners(), &[0, 1, 2, 0, 2, 3]);
        assert!(compaction.check().is_ok());
    }

    #[test]
    fn test_triangle_collapses_to_two_gon() {
        let eq = equivalence(&[[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], 0.001);
        let compaction = Compaction::compute(&[0, 1, 2], &[3], &eq).unwrap();

        assert_eq!(compaction.corner_offset(), &[0, 0, 1]);
        assert!(!compaction.is_corner_removed(0));
        assert!(compaction.is_corner_removed(1));
        assert!(!compaction.is_corner_removed(2));
        assert_eq!(compaction.face_sizes(), &[2]);
        assert_eq!(compaction.corners(), &[0, 1]);
        assert_eq!(compaction.output_corner_count(), 2);
        assert!(compaction.check().is_ok());
    }

    #[test]
    fn test_face_collapsing_to_one_point_is_dropped() {
        let eq = equivalence(&[[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], 0.001);
        let compaction = Compaction::compute(&[0, 1], &[2], &eq).unwrap();

        assert_eq!(compaction.removed_corners(), 2);
        assert_eq!(compaction.output_face_count(), 0);
        assert_eq!(compaction.removed_faces(), 1);
        assert!(compaction.is_corner_removed(0));
        assert!(compaction.is_corner_removed(1));
        assert!(compaction.corners().is_empty());
        assert!(compaction.check().is_ok());
    }

    #[test]
    fn test_dropped_face_between_kept_faces() {
        // Points 1 and 2 coincide; face [1, 2, 1] collapses to a single point
        let eq = equivalence(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            0.01,
        );
        let corners = [0, 1, 3, 1, 2, 1, 0, 2, 3];
        let compaction = Compaction::compute(&corners, &[3, 3, 3], &eq).unwrap();

        assert_eq!(compaction.kept_faces(), &[true, false, true]);
        assert_eq!(compaction.corner_offset(), &[0, 0, 0, 0, 1, 2, 3, 3, 3]);
        assert_eq!(compaction.removed_corners(), 3);
        assert_eq!(compaction.face_sizes(), &[3, 3]);
        // Point 3 compacts to 2 since point 2 merged into 1
        assert_eq!(compaction.corners(), &[0, 1, 2, 0, 1, 2]);
        assert!(compaction.check().is_ok());
    }

    #[test]
    fn test_quad_keeps_first_occurrence_order() {
        let eq = equivalence(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [1.0, 0.0, 0.0],
            ],
            0.01,
        );
        let compaction = Compaction::compute(&[0, 3, 1, 2], &[4], &eq).unwrap();

        assert_eq!(compaction.face_sizes(), &[3]);
        assert_eq!(compaction.corners(), &[0, 1, 2]);
        assert!(compaction.is_corner_removed(2));
    }

    #[test]
    fn test_empty_face_is_dropped() {
        let eq = Equivalence::identity(3);
        let compaction = Compaction::compute(&[0, 1, 2], &[0, 3], &eq).unwrap();

        assert_eq!(compaction.kept_faces(), &[false, true]);
        assert_eq!(compaction.removed_corners(), 0);
        assert_eq!(compaction.face_sizes(), &[3]);
        assert!(compaction.check().is_ok());
    }

    #[test]
    fn test_single_corner_face_is_dropped() {
        let eq = Equivalence::identity(3);
        let compaction = Compaction::compute(&[2, 0, 1, 2], &[1, 3], &eq).unwrap();

        assert_eq!(compaction.removed_corners(), 1);
        assert_eq!(compaction.corners(), &[0, 1, 2]);
        assert!(compaction.check().is_ok());
    }

    #[test]
    fn test_last_face_dropped() {
        let eq = equivalence(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]], 0.01);
        let compaction = Compaction::compute(&[0, 1, 2, 1, 2], &[3, 2], &eq).unwrap();

        assert_eq!(compaction.kept_faces(), &[true, false]);
        assert_eq!(compaction.removed_corners(), 3);
        assert!(compaction.is_corner_removed(4));
        assert_eq!(compaction.corners(), &[0, 1]);
        assert!(compaction.check().is_ok());
    }

    #[test]
    fn test_corner_count_mismatch() {
        let eq = Equivalence::identity(3);
        let err = Compaction::compute(&[0, 1, 2], &[4], &eq).unwrap_err();
        assert!(matches!(
            err,
            DedupError::Mesh(MeshError::CornerCountMismatch { .. })
        ));
    }

    #[test]
    fn test_corner_out_of_range() {
        let eq = Equivalence::identity(2);
        let err = Compaction::compute(&[0, 1, 5], &[3], &eq).unwrap_err();
        assert!(matches!(
            err,
            DedupError::Mesh(MeshError::PointIndexOutOfRange { corner: 2, point: 5, .. })
        ));
    }

    #[test]
    fn test_check_detects_inconsistent_face() {
        let eq = Equivalence::identity(3);
        let mut compaction = Compaction::compute(&[0, 1, 2], &[3], &eq).unwrap();
        compaction.kept_faces[0] = false;
        assert!(compaction.check().is_err());
    }
}
