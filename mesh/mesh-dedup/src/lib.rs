//! Remove duplicate points from polygon meshes.
//!
//! This crate welds points closer than a threshold and rebuilds the mesh
//! topology around the merged points:
//! - [`KdTree`] - Median-split 3D tree for nearest and radius queries
//! - [`Equivalence`] - Canonical point of every point, plus compaction offsets
//! - [`Compaction`] - Corner and face rewriting after merging
//! - [`remove_doubles`] - The full operation, writing through a
//!   [`MeshAllocator`](mesh_types::MeshAllocator)
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Merge Rules
//!
//! - A point merges into the lowest-index point within the threshold,
//!   following earlier merges to their root, so surviving points keep their
//!   input order.
//! - Within a face, a corner whose merged point already appeared earlier in
//!   the same face is dropped.
//! - A face left with one point (or none) is dropped. Faces left with two
//!   points are kept.
//!
//! # Example
//!
//! ```
//! use mesh_dedup::{remove_doubles_owned, DedupParams};
//! use mesh_types::{unit_cube, MeshTopology};
//!
//! // Every corner gets its own point, as in a per-face export
//! let soup = unit_cube().split_corners().unwrap();
//! assert_eq!(soup.point_count(), 24);
//!
//! let (welded, summary) = remove_doubles_owned(&soup, &DedupParams::default()).unwrap();
//! assert_eq!(welded.point_count(), 8);
//! assert_eq!(welded.face_count(), 6);
//! println!("{summary}");
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod compact;
mod dedup;
mod error;
mod kdtree;
mod params;
mod resolve;
mod result;

pub use compact::Compaction;
pub use dedup::{remove_doubles, remove_doubles_owned};
pub use error::{DedupError, DedupResult};
pub use kdtree::KdTree;
pub use params::DedupParams;
pub use resolve::Equivalence;
pub use result::DedupSummary;
