//! A mesh paired with its triangle BVH.

use std::sync::Arc;

use glint_core::Mesh;
use glint_math::{Aabb, Interval, Ray};

use crate::bvh::Bvh;
use crate::hit::RayHit;
use crate::triangle::MeshTri;

/// Traceable mesh: shared geometry plus the BVH over its triangles.
///
/// Shared between instances through an `Arc`, so a mesh placed many times
/// is accelerated once.
pub struct MeshAccel {
    mesh: Arc<Mesh>,
    bvh: Bvh<MeshTri>,
}

impl MeshAccel {
    pub fn build(mesh: Arc<Mesh>) -> Self {
        let mut bvh = Bvh::new();
        for (index, _) in mesh.indices.iter().enumerate() {
            let [v0, v1, v2] = mesh.triangle(index);
            bvh.add_primitive(MeshTri::new(v0, v1, v2, index as u32));
        }
        bvh.build();
        Self { mesh, bvh }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn bounds(&self) -> Aabb {
        self.mesh.bounds
    }

    pub fn bvh(&self) -> &Bvh<MeshTri> {
        &self.bvh
    }

    /// Closest triangle hit; single-sided lookups cull triangles facing
    /// away from the ray.
    pub fn intersect(
        &self,
        ray: &Ray,
        interval: Interval,
        hit: &mut RayHit,
        double_sided: bool,
    ) -> bool {
        if double_sided {
            self.bvh.intersect(ray, interval, hit)
        } else {
            self.bvh
                .intersect_filtered(ray, interval, hit, |tri: &MeshTri| {
                    tri.normal().dot(ray.direction) < 0.0
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_math::Vec3;

    fn single_triangle_accel() -> MeshAccel {
        // CCW triangle at z = -5 facing +Z
        let mesh = Mesh::from_arrays(
            &[-1.0, -1.0, -5.0, 1.0, -1.0, -5.0, 0.0, 1.0, -5.0],
            &[0, 1, 2],
            None,
        )
        .unwrap();
        MeshAccel::build(Arc::new(mesh))
    }

    #[test]
    fn test_intersect() {
        let accel = single_triangle_accel();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut hit = RayHit::default();

        assert!(accel.intersect(&ray, Interval::new(1e-4, f32::MAX), &mut hit, true));
        assert!((hit.t - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_single_sided_culls_back_faces() {
        let accel = single_triangle_accel();
        // approach from behind the triangle
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        let mut hit = RayHit::default();

        assert!(!accel.intersect(&ray, Interval::new(1e-4, f32::MAX), &mut hit, false));
        assert!(accel.intersect(&ray, Interval::new(1e-4, f32::MAX), &mut hit, true));
    }
}
