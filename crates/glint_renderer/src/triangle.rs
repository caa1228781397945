//! Triangle primitive for ray tracing.

use glint_math::{Aabb, Ray, Vec2, Vec3};

use crate::hit::RayHit;
use crate::primitive::Primitive;

/// Determinants below this magnitude mean a degenerate or ray-parallel
/// triangle; such intersections are rejected.
const DEGENERACY_EPSILON: f32 = 1e-12;

/// A mesh triangle: three corners plus the triangle's index in its mesh.
///
/// Stored by value inside the mesh's BVH; the owning mesh keeps the
/// per-vertex shading data this primitive does not need.
#[derive(Debug, Clone, Copy)]
pub struct MeshTri {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    index: u32,
}

impl MeshTri {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, index: u32) -> Self {
        Self { v0, v1, v2, index }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Unnormalised geometric normal.
    #[inline]
    pub fn normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(self.v2 - self.v0)
    }
}

impl Primitive for MeshTri {
    fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        bounds.grow(self.v0);
        bounds.grow(self.v1);
        bounds.grow(self.v2);
        bounds
    }

    fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Plane intersection followed by a barycentric inside test.
    fn intersect(&self, ray: &Ray, t_min: f32, t_max: f32, hit: &mut RayHit) -> bool {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        let normal = e1.cross(e2).normalize();

        let denom = normal.dot(ray.direction);
        if denom.abs() < DEGENERACY_EPSILON {
            return false;
        }
        let t = -normal.dot(ray.origin - self.v0) / denom;
        if !(t > t_min && t <= t_max) {
            return false;
        }

        let p = ray.at(t);
        let uu = e1.dot(e1);
        let uv = e1.dot(e2);
        let vv = e2.dot(e2);
        let w = p - self.v0;
        let wu = w.dot(e1);
        let wv = w.dot(e2);
        let det = uv * uv - uu * vv;
        if det.abs() < DEGENERACY_EPSILON {
            return false;
        }
        let inverse_det = 1.0 / det;

        let u = (uv * wv - vv * wu) * inverse_det;
        if !(0.0..=1.0).contains(&u) {
            return false;
        }
        let v = (uv * wu - uu * wv) * inverse_det;
        if v < 0.0 || u + v > 1.0 {
            return false;
        }

        hit.t = t;
        hit.bary = Vec2::new(u, v);
        hit.triangle_index = self.index;
        true
    }
}
