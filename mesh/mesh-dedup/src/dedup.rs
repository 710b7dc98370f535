//! The remove-doubles operation.

use mesh_types::{
    AttributeType, MeshAllocator, MeshLayout, MeshTopology, OwnedAllocator, PolyMesh,
};
use tracing::{debug, info};

use crate::compact::Compaction;
use crate::error::{DedupError, DedupResult};
use crate::kdtree::KdTree;
use crate::params::DedupParams;
use crate::resolve::Equivalence;
use crate::result::DedupSummary;

/// Merge points closer than `params.threshold` and write the welded mesh
/// through `allocator`.
///
/// Each point merges into the lowest-index point within the threshold,
/// following earlier merges to their root. Surviving points keep their
/// relative order. Within a face, repeated merged points keep only their
/// first corner; a face left with a single point is dropped. Faces keep their
/// input order. The input mesh is never modified.
///
/// # Errors
///
/// - [`DedupError::InvalidThreshold`] for a negative or non-finite threshold
/// - [`DedupError::Mesh`] if the input is malformed or the output cannot be
///   allocated
/// - [`DedupError::UnsupportedFormat`] if the allocated face sizes are not
///   packed 4-byte integers
/// - [`DedupError::BrokenInvariant`] if `params.verify` is set and a check fails
///
/// # Example
///
/// ```
/// use mesh_dedup::{remove_doubles, DedupParams};
/// use mesh_types::{MeshTopology, OwnedAllocator, PolyMesh};
///
/// let points = [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
/// let mesh = PolyMesh::from_polygons(&points, &[vec![0, 1, 2]]).unwrap();
///
/// let mut alloc = OwnedAllocator::default();
/// let summary = remove_doubles(&mesh, &mut alloc, &DedupParams::default()).unwrap();
///
/// let welded = alloc.into_mesh().unwrap();
/// assert_eq!(summary.removed_points(), 1);
/// assert_eq!(welded.polygons().unwrap(), vec![vec![0, 1]]);
/// ```
pub fn remove_doubles<A: MeshAllocator>(
    input: &PolyMesh,
    allocator: &mut A,
    params: &DedupParams,
) -> DedupResult<DedupSummary> {
    params.validate()?;
    input.validate()?;

    let points = input.positions.points()?;
    let corners = input.corners.indices()?;
    let face_sizes = input.face_sizes.indices()?;

    info!(
        points = points.len(),
        corners = corners.len(),
        faces = face_sizes.len(),
        threshold = params.threshold,
        "Starting remove doubles"
    );

    let equivalence = match KdTree::build(&points) {
        Some(tree) => {
            debug!(depth = tree.depth(), "Built point tree");
            Equivalence::resolve(&tree, params.threshold)
        }
        None if points.is_empty() => Equivalence::identity(0),
        None => {
            return Err(DedupError::invariant(format!(
                "{} points exceed the 32-bit index range",
                points.len()
            )));
        }
    };
    debug!(
        surviving = equivalence.surviving_count(),
        removed = equivalence.removed_points(),
        "Resolved point equivalence"
    );

    let compaction = Compaction::compute(&corners, &face_sizes, &equivalence)?;
    debug!(
        removed_corners = compaction.removed_corners(),
        removed_faces = compaction.removed_faces(),
        "Compacted topology"
    );

    if params.verify {
        equivalence.check()?;
        compaction.check()?;
    }

    let output = allocator.allocate(
        equivalence.surviving_count(),
        compaction.output_corner_count(),
        compaction.output_face_count(),
    )?;
    check_output_layout(output, compaction.corners().iter().copied().max())?;

    output
        .face_sizes
        .copy_indices_from(compaction.face_sizes())
        .map_err(|err| DedupError::for_attribute("face size", err))?;

    for point in equivalence.surviving_points() {
        if let Some(target) = equivalence.compacted_index(point) {
            output
                .positions
                .set_point(target as usize, &points[point as usize])?;
        }
    }

    for (c, &point) in compaction.corners().iter().enumerate() {
        output.corners.set_index(c, point)?;
    }

    let summary = DedupSummary {
        input_points: input.point_count(),
        input_corners: input.corner_count(),
        input_faces: input.face_count(),
        output_points: output.point_count(),
        output_corners: output.corner_count(),
        output_faces: output.face_count(),
    };
    info!("{summary}");

    Ok(summary)
}

/// Reject output attributes that cannot hold the result, before anything
/// is written.
fn check_output_layout(output: &PolyMesh, max_corner: Option<u32>) -> DedupResult<()> {
    let positions = &output.positions;
    match positions.attribute_type() {
        AttributeType::Float | AttributeType::Double if positions.component_count() >= 3 => {}
        ty => {
            return Err(DedupError::UnsupportedFormat {
                attribute: "position",
                reason: format!(
                    "positions need 3 Float or Double components, attribute has {} {ty:?}",
                    positions.component_count()
                ),
            });
        }
    }

    let ty = output.corners.attribute_type();
    let fits = match ty {
        AttributeType::Int => max_corner.is_none_or(|max| i32::try_from(max).is_ok()),
        AttributeType::UByte => max_corner.is_none_or(|max| u8::try_from(max).is_ok()),
        AttributeType::Float | AttributeType::Double => false,
    };
    if !fits {
        return Err(DedupError::UnsupportedFormat {
            attribute: "corner",
            reason: format!(
                "{ty:?} storage cannot hold point index {}",
                max_corner.unwrap_or(0)
            ),
        });
    }
    Ok(())
}

/// Run [`remove_doubles`] into a new mesh with the input's position type.
///
/// # Errors
///
/// Same as [`remove_doubles`].
pub fn remove_doubles_owned(
    input: &PolyMesh,
    params: &DedupParams,
) -> DedupResult<(PolyMesh, DedupSummary)> {
    let layout = MeshLayout {
        position_type: input.positions.attribute_type(),
        ..MeshLayout::default()
    };
    let mut allocator = OwnedAllocator::new(layout);
    let summary = remove_doubles(input, &mut allocator, params)?;
    let mesh = allocator.into_mesh().ok_or_else(|| {
        DedupError::invariant("remove doubles finished without allocating an output mesh")
    })?;
    Ok((mesh, summary))
}
