//! Canonical point assignment.
//!
//! Each point is mapped to the lowest-index point it merges into. Points are
//! processed in ascending order and each radius answer is followed through
//! the assignments made so far, because the tree is built once over the
//! unmerged points and may name a point that has itself already been merged.

// Point indices fit in u32 (checked when the tree is built)
#![allow(clippy::cast_possible_truncation)]

use crate::error::{DedupError, DedupResult};
use crate::kdtree::KdTree;

/// Merge mapping of a point set.
///
/// - `assign[i]` is the canonical point of `i`, with `assign[i] <= i` and
///   `assign[assign[i]] == assign[i]`.
/// - `offset[i]` counts removed points at or before `i`, so a canonical point
///   lands at `i - offset[i]` once removed points are compacted away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equivalence {
    assign: Vec<u32>,
    offset: Vec<u32>,
}

impl Equivalence {
    /// Mapping where no point merges.
    #[must_use]
    pub fn identity(point_count: usize) -> Self {
        Self {
            assign: (0..point_count as u32).collect(),
            offset: vec![0; point_count],
        }
    }

    /// Resolve every point of `tree` against the points within `threshold`.
    #[must_use]
    pub fn resolve(tree: &KdTree<'_>, threshold: f64) -> Self {
        let n = tree.len();
        let mut assign: Vec<u32> = Vec::with_capacity(n);
        let mut offset = Vec::with_capacity(n);
        let mut removed = 0u32;

        for i in 0..n as u32 {
            let mut root = tree.equivalent(i, threshold);
            if root != i {
                // Terminates: every assignment points strictly lower until a fixed point
                while assign[root as usize] != root {
                    root = assign[root as usize];
                }
                removed += 1;
            }
            assign.push(root);
            offset.push(removed);
        }

        Self { assign, offset }
    }

    /// Number of points covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assign.len()
    }

    /// Whether the mapping covers no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assign.is_empty()
    }

    /// Canonical point of every point.
    #[must_use]
    pub fn assign(&self) -> &[u32] {
        &self.assign
    }

    /// Removed points at or before every point.
    #[must_use]
    pub fn offset(&self) -> &[u32] {
        &self.offset
    }

    /// Total number of points merged away.
    #[must_use]
    pub fn removed_points(&self) -> usize {
        self.offset.last().map_or(0, |&removed| removed as usize)
    }

    /// Number of points left after merging.
    #[must_use]
    pub fn surviving_count(&self) -> usize {
        self.len() - self.removed_points()
    }

    /// Canonical point of `point`, or `None` if it is out of range.
    #[must_use]
    pub fn canonical(&self, point: u32) -> Option<u32> {
        self.assign.get(point as usize).copied()
    }

    /// Whether `point` is its own canonical point.
    #[must_use]
    pub fn is_canonical(&self, point: u32) -> bool {
        self.canonical(point) == Some(point)
    }

    /// Compacted index of a canonical point; `None` for merged or missing points.
    #[must_use]
    pub fn compacted_index(&self, point: u32) -> Option<u32> {
        self.is_canonical(point)
            .then(|| point - self.offset[point as usize])
    }

    /// Compacted index of the canonical point `point` merges into.
    #[must_use]
    pub fn compacted_point(&self, point: u32) -> Option<u32> {
        let root = self.canonical(point)?;
        Some(root - self.offset[root as usize])
    }

    /// Canonical points in ascending order.
    pub fn surviving_points(&self) -> impl Iterator<Item = u32> + '_ {
        self.assign
            .iter()
            .enumerate()
            .filter(|&(i, &root)| root as usize == i)
            .map(|(i, _)| i as u32)
    }

    /// Verify the mapping's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::BrokenInvariant`] describing the first violation.
    pub fn check(&self) -> DedupResult<()> {
        if self.assign.len() != self.offset.len() {
            return Err(DedupError::invariant(format!(
                "{} assignments but {} offsets",
                self.assign.len(),
                self.offset.len()
            )));
        }

        let mut removed = 0u32;
        for (i, (&root, &offset)) in self.assign.iter().zip(&self.offset).enumerate() {
            if root as usize > i {
                return Err(DedupError::invariant(format!(
                    "point {i} assigned to later point {root}"
                )));
            }
            let root_of_root = self.assign[root as usize];
            if root_of_root != root {
                return Err(DedupError::invariant(format!(
                    "point {i} assigned to {root}, which is itself assigned to {root_of_root}"
                )));
            }
            if root as usize != i {
                removed += 1;
            }
            if offset != removed {
                return Err(DedupError::invariant(format!(
                    "offset of point {i} is {offset}, expected {removed}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn resolve(points: &[Point3<f64>], threshold: f64) -> Equivalence {
        let tree = KdTree::build(points).unwrap();
        Equivalence::resolve(&tree, threshold)
    }

    #[test]
    fn test_identity() {
        let eq = Equivalence::identity(4);
        assert_eq!(eq.assign(), &[0, 1, 2, 3]);
        assert_eq!(eq.removed_points(), 0);
        assert_eq!(eq.compacted_index(3), Some(3));
        assert!(eq.check().is_ok());
    }

    #[test]
    fn test_empty() {
        let eq = Equivalence::identity(0);
        assert!(eq.is_empty());
        assert_eq!(eq.removed_points(), 0);
        assert_eq!(eq.surviving_count(), 0);
    }

    #[test]
    fn test_two_coincident_points() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let eq = resolve(&points, 0.001);

        assert_eq!(eq.assign(), &[0, 0, 2]);
        assert_eq!(eq.offset(), &[0, 1, 1]);
        assert_eq!(eq.removed_points(), 1);
        assert_eq!(eq.compacted_index(1), None);
        assert_eq!(eq.compacted_index(2), Some(1));
        assert_eq!(eq.compacted_point(1), Some(0));
        assert_eq!(eq.surviving_points().collect::<Vec<_>>(), vec![0, 2]);
        assert!(eq.check().is_ok());
    }

    #[test]
    fn test_chain_resolves_to_root() {
        // 0 and 1 are close, 1 and 2 are close, 0 and 2 are not.
        // Point 2 finds 1, which already merged into 0.
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.8, 0.0, 0.0),
            Point3::new(1.6, 0.0, 0.0),
        ];
        let eq = resolve(&points, 1.0);

        assert_eq!(eq.assign(), &[0, 0, 0]);
        assert_eq!(eq.offset(), &[0, 1, 2]);
        assert!(eq.check().is_ok());
    }

    #[test]
    fn test_zero_threshold_merges_exact_duplicates_only() {
        let points = [
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(1.0, 2.0, 3.000_001),
            Point3::new(1.0, 2.0, 3.0),
        ];
        let eq = resolve(&points, 0.0);
        assert_eq!(eq.assign(), &[0, 1, 0]);
        assert_eq!(eq.compacted_index(1), Some(1));
    }

    #[test]
    fn test_distinct_points_untouched() {
        let points: Vec<_> = (0..20)
            .map(|i| Point3::new(f64::from(i), 0.0, 0.0))
            .collect();
        let eq = resolve(&points, 0.5);
        assert_eq!(eq, Equivalence::identity(20));
    }

    #[test]
    fn test_check_detects_forward_assignment() {
        let eq = Equivalence {
            assign: vec![1, 1],
            offset: vec![1, 1],
        };
        let err = eq.check().unwrap_err();
        assert!(format!("{err}").contains("later point"));
    }

    #[test]
    fn test_check_detects_unresolved_chain() {
        let eq = Equivalence {
            assign: vec![0, 0, 1],
            offset: vec![0, 1, 2],
        };
        assert!(matches!(
            eq.check(),
            Err(DedupError::BrokenInvariant { .. })
        ));
    }

    #[test]
    fn test_check_detects_bad_offset() {
        let eq = Equivalence {
            assign: vec![0, 0, 2],
            offset: vec![0, 1, 2],
        };
        assert!(eq.check().is_err());
    }
}
