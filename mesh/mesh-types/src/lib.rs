//! Polygon mesh storage.
//!
//! This crate provides the storage layer mesh operations read from and write to:
//!
//! - [`Attribute`] - Strided buffer of fixed-size elements
//! - [`PolyMesh`] - Points, corners and face sizes as three attributes
//! - [`MeshLayout`] - Types and strides used when allocating a mesh
//! - [`MeshAllocator`] - Capability handing out freshly sized output meshes
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Host plugins that expose their own attribute buffers
//! - Servers
//!
//! # Polygon Layout
//!
//! Faces are arbitrary polygons. A face does not store its corners; it owns
//! the next `face_size` corners of the corner attribute, so faces and corners
//! are walked together with a running cursor.
//!
//! # Example
//!
//! ```
//! use mesh_types::{MeshTopology, PolyMesh};
//!
//! let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
//! let mesh = PolyMesh::from_polygons(&points, &[vec![0, 1, 2], vec![1, 3, 2]]).unwrap();
//!
//! assert_eq!(mesh.corner_count(), 6);
//! assert_eq!(mesh.polygons().unwrap()[1], vec![1, 3, 2]);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod attribute;
mod error;
mod layout;
mod mesh;
mod traits;

pub use attribute::{Attribute, AttributeData, AttributeType};
pub use error::{MeshError, MeshResult};
pub use layout::{MeshAllocator, MeshLayout, OwnedAllocator};
pub use mesh::{PolyMesh, unit_cube};
pub use traits::MeshTopology;

// Re-export nalgebra types for convenience
pub use nalgebra::Point3;
