//! Bounding Volume Hierarchy acceleration structure.
//!
//! Built in two phases: a mutable construction tree partitioned with SAH
//! (median splits for small nodes), then flattened into a contiguous
//! pre-order node array plus a primitive-reference array for traversal.
//! The same tree is instantiated over the triangles of a single mesh and
//! over the mesh instances of the whole scene.

use glint_math::{Aabb, Interval, Ray, Vec3};

use crate::hit::{RayHit, INVALID_INDEX};
use crate::primitive::Primitive;

const MAX_DEPTH: u32 = 50;
const MIN_PRIMITIVES_PER_LEAF: usize = 6;
// when a node has fewer primitives than this it skips SAH and splits at the
// centroid median; SAH on tiny nodes costs more than it saves
const PERFECT_SPLIT_THRESHOLD: usize = 20;
// number of split planes SAH evaluates per node
const SAH_TRY_COUNT: usize = 5;
// cost of traversing a node, relative to an intersection cost of 1.0
const SAH_TRAVERSAL_COST: f32 = 0.125;

/// Node of the mutable construction tree. Destroyed after flattening.
struct BuildNode {
    bounds: Aabb,
    children: Option<(Box<BuildNode>, Box<BuildNode>)>,
    /// Handles into the primitive array; cleared once distributed.
    primitives: Vec<u32>,
    split_axis: u8,
}

impl BuildNode {
    fn new() -> Self {
        Self {
            bounds: Aabb::EMPTY,
            children: None,
            primitives: Vec::new(),
            split_axis: 0,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Node of the flat traversal tree.
///
/// The left child of a non-leaf always sits at the next index, so only the
/// right child is stored. The root is at index 0 and is never anyone's
/// right child, which makes `right == 0` an unambiguous leaf marker.
#[derive(Debug, Clone, Copy)]
pub struct FlatNode {
    pub bounds: Aabb,
    pub right: u32,
    /// For leaves, offset of the node's run in the reference array;
    /// `INVALID_INDEX` for interior nodes.
    pub primitives: u32,
    pub split_axis: u8,
}

impl FlatNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.right == 0
    }
}

/// A BVH over an owned set of primitives.
///
/// `intersect` finds the closest hit front-to-back; a filter variant serves
/// shadow rays and back-face culling without a second traversal routine.
pub struct Bvh<P> {
    primitives: Vec<P>,
    nodes: Vec<FlatNode>,
    /// Primitive handles in leaf order; each leaf's run ends with
    /// `INVALID_INDEX`.
    refs: Vec<u32>,
    built: bool,

    // build statistics
    depth: u32,
    node_count: usize,
    leaf_count: usize,
    max_leaf_size: usize,
}

impl<P> Default for Bvh<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Bvh<P> {
    pub fn new() -> Self {
        Self {
            primitives: Vec::new(),
            nodes: Vec::new(),
            refs: Vec::new(),
            built: false,
            depth: 0,
            node_count: 1,
            leaf_count: 0,
            max_leaf_size: 0,
        }
    }

    pub fn add_primitive(&mut self, primitive: P) {
        debug_assert!(!self.built, "primitives must be added before build()");
        self.primitives.push(primitive);
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn primitives(&self) -> &[P] {
        &self.primitives
    }

    /// Look up a primitive by the handle recorded in a hit.
    #[inline]
    pub fn primitive(&self, handle: u32) -> &P {
        &self.primitives[handle as usize]
    }

    /// The flat traversal nodes, in pre-order.
    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    /// The flat primitive-reference array with its leaf sentinels.
    pub fn refs(&self) -> &[u32] {
        &self.refs
    }

    /// Bounding box of everything in the tree.
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |node| node.bounds)
    }
}

impl<P: Primitive> Bvh<P> {
    pub fn from_primitives(primitives: Vec<P>) -> Self {
        let mut bvh = Self::new();
        bvh.primitives = primitives;
        bvh.build();
        bvh
    }

    /// Build the construction tree, flatten it, and drop it.
    pub fn build(&mut self) {
        let count = self.primitives.len();
        log::debug!("building BVH over {count} primitives");

        // cache per-primitive boxes and centroids; partitioning consults
        // them constantly
        let boxes: Vec<Aabb> = self.primitives.iter().map(|p| p.bounds()).collect();
        let centroids: Vec<Vec3> = self.primitives.iter().map(|p| p.centroid()).collect();

        let mut root = BuildNode::new();
        root.primitives = (0..count as u32).collect();
        for &handle in &root.primitives {
            root.bounds.grow_box(&boxes[handle as usize]);
        }

        self.build_node(&mut root, 0, &boxes, &centroids);

        // flatten; reserve so no reallocation happens while pushing
        self.nodes.reserve(self.node_count);
        self.refs.reserve(count + self.leaf_count);
        let flat_root = self.make_flat_node(&mut root);
        self.nodes.push(flat_root);
        if !root.is_leaf() {
            self.flatten(&mut root);
        }

        self.built = true;
        log::info!(
            "BVH built: {} primitives, {} nodes, {} leaves, depth {}, largest leaf {}",
            count,
            self.node_count,
            self.leaf_count,
            self.depth,
            self.max_leaf_size
        );
    }

    fn build_node(&mut self, node: &mut BuildNode, depth: u32, boxes: &[Aabb], centroids: &[Vec3]) {
        if depth > MAX_DEPTH || node.primitives.len() <= MIN_PRIMITIVES_PER_LEAF {
            self.finalize_leaf(node);
            return;
        }
        self.depth = self.depth.max(depth);

        // split on the axis where the centroids spread the most
        let mut centroid_bounds = Aabb::EMPTY;
        for &handle in &node.primitives {
            centroid_bounds.grow(centroids[handle as usize]);
        }
        let axis = centroid_bounds.longest_axis();
        node.split_axis = axis as u8;

        let mut left = Box::new(BuildNode::new());
        let mut right = Box::new(BuildNode::new());

        if node.primitives.len() < PERFECT_SPLIT_THRESHOLD {
            // median split: partition around the middle element
            let mid = node.primitives.len() / 2;
            node.primitives.select_nth_unstable_by(mid, |&a, &b| {
                let ca = centroids[a as usize][axis];
                let cb = centroids[b as usize][axis];
                ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
            });

            for (i, &handle) in node.primitives.iter().enumerate() {
                let child = if i < mid { &mut left } else { &mut right };
                child.bounds.grow_box(&boxes[handle as usize]);
                child.primitives.push(handle);
            }
        } else {
            let no_split_cost = node.primitives.len() as f32;

            // try evenly distributed split planes and keep the cheapest
            let mut best_sah = f32::MAX;
            let mut best_ratio = 0.0;
            for i in 0..SAH_TRY_COUNT {
                let ratio = (i as f32 + 1.0) / (SAH_TRY_COUNT as f32 + 1.0);
                let sah = self.cost_sah(node, axis, ratio, boxes, centroids);
                if best_sah > sah {
                    best_sah = sah;
                    best_ratio = ratio;
                }
            }

            // a leaf beats any split this node has to offer
            if best_sah > no_split_cost {
                self.finalize_leaf(node);
                return;
            }

            let split = split_plane(&node.bounds, axis, best_ratio);
            for &handle in &node.primitives {
                let child = if centroids[handle as usize][axis] > split {
                    &mut right
                } else {
                    &mut left
                };
                child.bounds.grow_box(&boxes[handle as usize]);
                child.primitives.push(handle);
            }
        }

        self.node_count += 2;
        self.build_node(&mut left, depth + 1, boxes, centroids);
        self.build_node(&mut right, depth + 1, boxes, centroids);
        node.children = Some((left, right));
        node.primitives.clear();
    }

    fn finalize_leaf(&mut self, node: &BuildNode) {
        self.max_leaf_size = self.max_leaf_size.max(node.primitives.len());
        self.leaf_count += 1;
    }

    /// SAH cost of splitting `node` on `axis` at the plane picked by
    /// `ratio`, with intersection cost 1.0 per primitive.
    fn cost_sah(
        &self,
        node: &BuildNode,
        axis: usize,
        ratio: f32,
        boxes: &[Aabb],
        centroids: &[Vec3],
    ) -> f32 {
        let split = split_plane(&node.bounds, axis, ratio);

        let mut counts = [0usize; 2];
        let mut sides = [Aabb::EMPTY, Aabb::EMPTY];
        for &handle in &node.primitives {
            let side = (centroids[handle as usize][axis] > split) as usize;
            counts[side] += 1;
            sides[side].grow_box(&boxes[handle as usize]);
        }

        let parent_area = node.bounds.surface_area();
        let area = |side: usize| {
            if counts[side] > 0 {
                sides[side].surface_area()
            } else {
                0.0
            }
        };
        SAH_TRAVERSAL_COST
            + (area(0) * counts[0] as f32 + area(1) * counts[1] as f32) / parent_area
    }

    /// Emit the pre-order flat array.
    ///
    /// Expects the node's own FlatNode to have been pushed already; pushes
    /// the left subtree (so the left child lands at parent + 1), then the
    /// right, and patches the parent's right pointer.
    fn flatten(&mut self, node: &mut BuildNode) {
        let parent_index = self.nodes.len() - 1;
        let (mut left, mut right) = node.children.take().expect("flatten called on a leaf");

        let flat = self.make_flat_node(&mut left);
        self.nodes.push(flat);
        if !left.is_leaf() {
            self.flatten(&mut left);
        }

        let flat = self.make_flat_node(&mut right);
        self.nodes.push(flat);
        self.nodes[parent_index].right = self.nodes.len() as u32 - 1;

        if !right.is_leaf() {
            self.flatten(&mut right);
        }
    }

    /// Copy one construction node into flat form; leaves move their
    /// primitive handles into the reference array and gain a sentinel.
    fn make_flat_node(&mut self, node: &mut BuildNode) -> FlatNode {
        if node.is_leaf() {
            let begin = self.refs.len() as u32;
            self.refs.extend(node.primitives.drain(..));
            self.refs.push(INVALID_INDEX);
            FlatNode {
                bounds: node.bounds,
                right: 0,
                primitives: begin,
                split_axis: node.split_axis,
            }
        } else {
            FlatNode {
                bounds: node.bounds,
                right: 0,
                primitives: INVALID_INDEX,
                split_axis: node.split_axis,
            }
        }
    }

    /// Closest hit in (interval.min, interval.max].
    pub fn intersect(&self, ray: &Ray, interval: Interval, hit: &mut RayHit) -> bool {
        self.intersect_filtered(ray, interval, hit, |_| true)
    }

    /// Closest hit among primitives accepted by `filter`.
    pub fn intersect_filtered<F>(
        &self,
        ray: &Ray,
        interval: Interval,
        hit: &mut RayHit,
        filter: F,
    ) -> bool
    where
        F: Fn(&P) -> bool,
    {
        debug_assert!(self.built, "BVH must be built before intersection");
        if !self.built || self.primitives.is_empty() {
            return false;
        }
        if !self.nodes[0].bounds.hit(ray) {
            return false;
        }
        let mut t_max = interval.max;
        self.intersect_node(0, ray, interval.min, &mut t_max, hit, &filter)
    }

    fn intersect_node<F>(
        &self,
        node_index: u32,
        ray: &Ray,
        t_min: f32,
        t_max: &mut f32,
        hit: &mut RayHit,
        filter: &F,
    ) -> bool
    where
        F: Fn(&P) -> bool,
    {
        let node = &self.nodes[node_index as usize];
        let mut has_hit = false;

        if node.is_leaf() {
            debug_assert!(node.primitives != INVALID_INDEX, "leaf without primitives");
            // the run ends at the sentinel handle
            let mut i = node.primitives as usize;
            while self.refs[i] != INVALID_INDEX {
                let handle = self.refs[i];
                let primitive = &self.primitives[handle as usize];
                if filter(primitive) && primitive.intersect(ray, t_min, *t_max, hit) {
                    *t_max = hit.t;
                    hit.object_index = handle;
                    has_hit = true;
                }
                i += 1;
            }
        } else {
            // Visit the child the ray points into first; the other child
            // only matters if its box is closer than the best hit so far.
            let children = [node_index + 1, node.right];
            let entries = [
                self.nodes[children[0] as usize].bounds.entry_distance(ray),
                self.nodes[children[1] as usize].bounds.entry_distance(ray),
            ];

            let towards = (ray.direction[node.split_axis as usize] > 0.0) as usize;
            let near = 1 - towards;
            let far = towards;

            if entries[near].is_some()
                && self.intersect_node(children[near], ray, t_min, t_max, hit, filter)
            {
                has_hit = true;
            }
            if let Some(entry) = entries[far] {
                if *t_max > entry
                    && self.intersect_node(children[far], ray, t_min, t_max, hit, filter)
                {
                    has_hit = true;
                }
            }
        }

        has_hit
    }
}

fn split_plane(bounds: &Aabb, axis: usize, ratio: f32) -> f32 {
    // lerp between the min and max of the box; the interpolation runs from
    // max to min as ratio grows, kept this way because the SAH ratios were
    // tuned against it
    bounds.min[axis] * ratio + bounds.max[axis] * (1.0 - ratio)
}
