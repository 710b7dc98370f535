//! Result types for deduplication.

// Point counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counts before and after removing duplicate points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DedupSummary {
    /// Points in the input mesh.
    pub input_points: usize,
    /// Corners in the input mesh.
    pub input_corners: usize,
    /// Faces in the input mesh.
    pub input_faces: usize,
    /// Points in the output mesh.
    pub output_points: usize,
    /// Corners in the output mesh.
    pub output_corners: usize,
    /// Faces in the output mesh.
    pub output_faces: usize,
}

impl DedupSummary {
    /// Points merged into an earlier point.
    #[must_use]
    pub const fn removed_points(&self) -> usize {
        self.input_points.saturating_sub(self.output_points)
    }

    /// Corners dropped as duplicates within a face or with a dropped face.
    #[must_use]
    pub const fn removed_corners(&self) -> usize {
        self.input_corners.saturating_sub(self.output_corners)
    }

    /// Faces dropped because they collapsed to a single point.
    #[must_use]
    pub const fn removed_faces(&self) -> usize {
        self.input_faces.saturating_sub(self.output_faces)
    }

    /// Whether anything was merged or dropped.
    #[must_use]
    pub const fn had_changes(&self) -> bool {
        self.removed_points() > 0 || self.removed_corners() > 0 || self.removed_faces() > 0
    }

    /// Ratio of output to input points.
    #[must_use]
    pub fn point_reduction_ratio(&self) -> f64 {
        if self.input_points == 0 {
            1.0
        } else {
            self.output_points as f64 / self.input_points as f64
        }
    }
}

impl std::fmt::Display for DedupSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RemoveDoubles: {} → {} points ({} merged), {} → {} corners, {} → {} faces",
            self.input_points,
            self.output_points,
            self.removed_points(),
            self.input_corners,
            self.output_corners,
            self.input_faces,
            self.output_faces
        )
    }
}
