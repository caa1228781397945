use glint_math::{Vec2, Vec3};

/// Marks "no primitive" in hit records and flat-tree reference runs.
pub const INVALID_INDEX: u32 = u32::MAX;

/// Intersection record, filled in place during traversal.
///
/// Traversal writes `t`, the barycentrics, `triangle_index` and
/// `object_index`; the world fills position, shading normal and texture
/// coordinates afterwards for the one hit that survives.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub t: f32,
    pub position: Vec3,
    pub normal: Vec3,
    /// Barycentric (u, v) of the hit triangle.
    pub bary: Vec2,
    /// Interpolated texture coordinates.
    pub tex_coords: Vec2,
    pub triangle_index: u32,
    pub object_index: u32,
    /// Recursion depth of the ray that produced this hit.
    pub depth: u32,
}

impl Default for RayHit {
    fn default() -> Self {
        Self {
            t: f32::MAX,
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            bary: Vec2::ZERO,
            tex_coords: Vec2::ZERO,
            triangle_index: INVALID_INDEX,
            object_index: INVALID_INDEX,
            depth: 0,
        }
    }
}

impl RayHit {
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.object_index != INVALID_INDEX
    }
}
