//! Arena-backed 3D tree over point positions.
//!
//! The tree is built once over a fixed point set by splitting each range of
//! nodes around the median along a cycling axis (x, y, z, x, ...). Nodes live
//! in a single arena sized to the point count; a node refers to its point and
//! to its children by index, never by address.
//!
//! Splits are closed on the right: every point in a node's left subtree has a
//! coordinate strictly below the node's along the split axis, and every point
//! in its right subtree has a coordinate at or above it. Duplicate coordinates
//! therefore push the split toward the start of the range, which can unbalance
//! the tree (all-coincident input degrades to a chain). Construction and both
//! queries walk the tree with explicit stacks, so depth is bounded by the heap
//! rather than the call stack.
//!
//! # Example
//!
//! ```
//! use mesh_dedup::KdTree;
//! use nalgebra::Point3;
//!
//! let points = [
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(5.0, 0.0, 0.0),
//!     Point3::new(0.0, 0.0, 0.00001),
//! ];
//! let tree = KdTree::build(&points).unwrap();
//!
//! // The query point is in the tree, so it is its own nearest neighbor
//! assert_eq!(tree.nearest(1), (1, 0.0));
//!
//! // Point 2 lies within 0.001 of point 0
//! assert_eq!(tree.equivalent(2, 0.001), 0);
//! ```

// Point counts are checked against u32::MAX at build time
#![allow(clippy::cast_possible_truncation)]

use nalgebra::Point3;

/// Sentinel child index meaning "no child".
const NONE: u32 = u32::MAX;

/// One arena slot. `point` is swapped between slots while partitioning;
/// `left`/`right` are arena indices or [`NONE`].
#[derive(Debug, Clone, Copy)]
struct KdNode {
    point: u32,
    left: u32,
    right: u32,
}

/// Where a finished subtree gets linked.
#[derive(Debug, Clone, Copy)]
enum Link {
    Root,
    Left(usize),
    Right(usize),
}

/// Pending work while walking the tree.
#[derive(Debug, Clone, Copy)]
enum Step {
    /// Visit a node whose split axis is `axis`.
    Visit(u32, usize),
    /// Visit the far side of a split unless it lies `dx2` (squared) away
    /// from the query and the best distance is already smaller.
    Far(u32, usize, f64),
}

/// Balanced 3D tree answering nearest-point and radius queries.
#[derive(Debug, Clone)]
pub struct KdTree<'a> {
    points: &'a [Point3<f64>],
    nodes: Vec<KdNode>,
    root: u32,
    depth: usize,
}

impl<'a> KdTree<'a> {
    /// Build a tree over `points`.
    ///
    /// Returns `None` when `points` is empty or holds `u32::MAX` points or more.
    ///
    /// Distinct coordinates give a balanced tree built in O(N log N).
    /// Repeated coordinates push splits toward the start of their range, so
    /// all-coincident input builds a chain of depth N in O(N²) time. Queries
    /// on such a chain are linear.
    #[must_use]
    pub fn build(points: &'a [Point3<f64>]) -> Option<Self> {
        if points.is_empty() || points.len() >= NONE as usize {
            return None;
        }

        let mut nodes: Vec<KdNode> = (0..points.len() as u32)
            .map(|point| KdNode {
                point,
                left: NONE,
                right: NONE,
            })
            .collect();

        let mut root = NONE;
        let mut depth = 0;
        // (start, end, axis, level, link)
        let mut stack = vec![(0, nodes.len(), 0, 1, Link::Root)];

        while let Some((start, end, axis, level, link)) = stack.pop() {
            if end <= start {
                continue;
            }
            let median = find_median(&mut nodes, points, start, end, axis);
            depth = depth.max(level);

            let index = median as u32;
            match link {
                Link::Root => root = index,
                Link::Left(parent) => nodes[parent].left = index,
                Link::Right(parent) => nodes[parent].right = index,
            }

            let next = (axis + 1) % 3;
            stack.push((median + 1, end, next, level + 1, Link::Right(median)));
            stack.push((start, median, next, level + 1, Link::Left(median)));
        }

        Some(Self {
            points,
            nodes,
            root,
            depth,
        })
    }

    /// Number of points in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: an empty point set does not build a tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels on the longest root-to-leaf path.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Positions the tree was built over.
    #[must_use]
    pub const fn points(&self) -> &'a [Point3<f64>] {
        self.points
    }

    /// Nearest indexed point to point `query`, with its squared distance.
    ///
    /// Since `query` is itself indexed, this returns `(query, 0.0)` unless an
    /// earlier-visited point coincides with it exactly.
    ///
    /// # Panics
    ///
    /// Panics if `query` is not a valid point index.
    #[must_use]
    pub fn nearest(&self, query: u32) -> (u32, f64) {
        self.nearest_to(&self.points[query as usize])
            .unwrap_or((query, 0.0))
    }

    /// Nearest indexed point to an arbitrary position, with its squared
    /// distance. The search stops at the first exact match.
    ///
    /// Returns `None` if no distance is comparable (NaN coordinates).
    #[must_use]
    pub fn nearest_to(&self, target: &Point3<f64>) -> Option<(u32, f64)> {
        let mut best: Option<(u32, f64)> = None;
        let mut stack = vec![Step::Visit(self.root, 0)];

        while let Some(step) = stack.pop() {
            let (node, axis) = match step {
                Step::Visit(node, axis) => (node, axis),
                Step::Far(node, axis, dx2) => {
                    if best.is_some_and(|(_, best_dist)| dx2 > best_dist) {
                        continue;
                    }
                    (node, axis)
                }
            };
            if node == NONE {
                continue;
            }

            let slot = self.nodes[node as usize];
            let position = &self.points[slot.point as usize];
            let d = (position - target).norm_squared();
            let dx = position[axis] - target[axis];

            if !d.is_nan() && best.is_none_or(|(_, best_dist)| d < best_dist) {
                best = Some((slot.point, d));
            }
            if d == 0.0 {
                break;
            }

            let next = (axis + 1) % 3;
            let (near, far) = if dx > 0.0 {
                (slot.left, slot.right)
            } else {
                (slot.right, slot.left)
            };
            stack.push(Step::Far(far, next, dx * dx));
            stack.push(Step::Visit(near, next));
        }

        best
    }

    /// Lowest point index lying within `radius` of point `query`.
    ///
    /// Ties are broken by original point index, never by traversal order, so
    /// the answer only depends on the point set. A point is always within any
    /// non-negative radius of itself; if nothing is found (negative or NaN
    /// radius) `query` is returned.
    ///
    /// # Panics
    ///
    /// Panics if `query` is not a valid point index.
    #[must_use]
    pub fn equivalent(&self, query: u32, radius: f64) -> u32 {
        let mut best = query;
        self.for_each_within(&self.points[query as usize], radius, |point| {
            best = best.min(point);
        });
        best
    }

    /// Every point index within `radius` of `target`, ascending.
    #[must_use]
    pub fn within_radius(&self, target: &Point3<f64>, radius: f64) -> Vec<u32> {
        let mut found = Vec::new();
        self.for_each_within(target, radius, |point| found.push(point));
        found.sort_unstable();
        found
    }

    fn for_each_within(&self, target: &Point3<f64>, radius: f64, mut visit: impl FnMut(u32)) {
        if radius.is_nan() || radius < 0.0 {
            return;
        }
        let sq_radius = radius * radius;
        let mut stack = vec![(self.root, 0)];

        while let Some((node, axis)) = stack.pop() {
            if node == NONE {
                continue;
            }
            let slot = self.nodes[node as usize];
            let position = &self.points[slot.point as usize];
            let d = (position - target).norm_squared();
            let dx = position[axis] - target[axis];

            if d <= sq_radius {
                visit(slot.point);
            }

            let next = (axis + 1) % 3;
            let (near, far) = if dx > 0.0 {
                (slot.left, slot.right)
            } else {
                (slot.right, slot.left)
            };
            // NaN coordinates give no ordering, so both sides are searched
            if dx.is_nan() || dx * dx <= sq_radius {
                stack.push((far, next));
            }
            stack.push((near, next));
        }
    }
}

fn coord(nodes: &[KdNode], points: &[Point3<f64>], slot: usize, axis: usize) -> f64 {
    points[nodes[slot].point as usize][axis]
}

/// Swap the points two slots refer to, leaving child links in place.
fn swap_points(nodes: &mut [KdNode], a: usize, b: usize) {
    let tmp = nodes[a].point;
    nodes[a].point = nodes[b].point;
    nodes[b].point = tmp;
}

/// Quickselect the median slot of `nodes[start..end]` along `axis`.
///
/// Partitions around the value at the middle slot and narrows the range until
/// the partition boundary holds the same value as the middle slot. That
/// boundary is accepted as the median even when duplicates mean it is not the
/// exact middle, which keeps everything before it strictly smaller.
fn find_median(
    nodes: &mut [KdNode],
    points: &[Point3<f64>],
    mut start: usize,
    mut end: usize,
    axis: usize,
) -> usize {
    if end == start + 1 {
        return start;
    }
    let md = start + (end - start) / 2;

    loop {
        let pivot = coord(nodes, points, md, axis);

        swap_points(nodes, md, end - 1);
        let mut store = start;
        for p in start..end {
            if coord(nodes, points, p, axis).total_cmp(&pivot).is_lt() {
                if p != store {
                    swap_points(nodes, p, store);
                }
                store += 1;
            }
        }
        swap_points(nodes, store, end - 1);

        let boundary = coord(nodes, points, store, axis);
        if boundary.total_cmp(&coord(nodes, points, md, axis)).is_eq() {
            return store;
        }

        if store > md {
            end = store;
        } else {
            start = store;
        }
    }
}
