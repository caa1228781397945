use crate::{Mat4, Ray, Vec3};

/// Extents at or below this are treated as empty on that axis.
const EXTENT_EPSILON: f32 = 1e-6;

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// Defined by its two corners. A freshly constructed box is inverted
/// (min = +inf, max = -inf) so that growing it by the first point or box
/// snaps it to that point or box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// An empty AABB (contains nothing).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new AABB from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// True when the box bounds (almost) no volume on some axis.
    pub fn is_empty(&self) -> bool {
        let extent = self.max - self.min;
        extent.x <= EXTENT_EPSILON || extent.y <= EXTENT_EPSILON || extent.z <= EXTENT_EPSILON
    }

    /// Grow the box to contain a point.
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow the box to contain another box.
    pub fn grow_box(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Total surface area, the SAH quality measure.
    pub fn surface_area(&self) -> f32 {
        if self.max.x < self.min.x {
            return 0.0;
        }
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    ///
    /// Ties go to the first axis.
    pub fn longest_axis(&self) -> usize {
        let extent = self.max - self.min;
        let mut axis = 0;
        let mut largest = f32::NEG_INFINITY;
        for i in 0..3 {
            if largest < extent[i] {
                axis = i;
                largest = extent[i];
            }
        }
        axis
    }

    /// Bounding box of this box's image under an affine transform.
    ///
    /// The transformed corners are generally no longer axis-aligned, so the
    /// result bounds all eight of them. Each bit of the corner index picks
    /// min or max on one axis.
    pub fn transformed_by(&self, matrix: &Mat4) -> Aabb {
        let mut out = Aabb::EMPTY;
        for corner in 0..8u32 {
            let point = Vec3::new(
                if corner & 1 == 0 { self.min.x } else { self.max.x },
                if corner & 2 == 0 { self.min.y } else { self.max.y },
                if corner & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.grow(matrix.transform_point3(point));
        }
        out
    }

    /// Slab test returning the distance to the box entry point, or `None` on
    /// a miss.
    ///
    /// Zero direction components produce signed-infinite slab distances,
    /// which resolve correctly; the one hazard is `0 * inf = NaN` when the
    /// origin sits exactly on a slab plane. `f32::min`/`f32::max` drop a NaN
    /// operand, so such an axis simply does not constrain the interval.
    pub fn entry_distance(&self, ray: &Ray) -> Option<f32> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let inv = 1.0 / ray.direction[axis];
            let t0 = (self.min[axis] - ray.origin[axis]) * inv;
            let t1 = (self.max[axis] - ray.origin[axis]) * inv;
            let (near, far) = if inv < 0.0 { (t1, t0) } else { (t0, t1) };
            t_enter = t_enter.max(near);
            t_exit = t_exit.min(far);
        }

        (t_enter <= t_exit).then_some(t_enter)
    }

    /// Test if a ray intersects this AABB at all.
    #[inline]
    pub fn hit(&self, ray: &Ray) -> bool {
        self.entry_distance(ray).is_some()
    }
}
