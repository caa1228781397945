use glint_math::{Aabb, Ray, Vec3};

use crate::hit::RayHit;

/// Anything a BVH can be built over and traced against.
///
/// Implemented by mesh triangles and by whole mesh instances; the same
/// tree and traversal code serves both levels.
pub trait Primitive {
    /// Bounding box of the primitive.
    fn bounds(&self) -> Aabb;

    /// Point the build partitions by, usually the box or vertex centroid.
    fn centroid(&self) -> Vec3;

    /// Intersect a ray with the primitive, accepting hits with
    /// t in (t_min, t_max].
    ///
    /// On a hit, fills the parts of `hit` the primitive knows about and
    /// returns true; `hit` must stay untouched on a miss.
    fn intersect(&self, ray: &Ray, t_min: f32, t_max: f32, hit: &mut RayHit) -> bool;
}
