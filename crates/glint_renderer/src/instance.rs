//! Mesh instances: a shared mesh placed in the world by a transform.

use std::sync::Arc;

use glint_core::Material;
use glint_math::{Aabb, Mat4, Ray, RayKind, Vec3};

use crate::hit::RayHit;
use crate::mesh_accel::MeshAccel;
use crate::primitive::Primitive;

/// One placement of a mesh in the scene.
///
/// Appears as a primitive in the scene-level BVH. Rays are carried into
/// instance-local space by the inverse transform; the direction is *not*
/// renormalised, so a hit's `t` is still measured along the world ray and
/// the world hit position is simply `ray.at(t)`.
pub struct MeshInstance {
    mesh: Arc<MeshAccel>,
    forward: Mat4,
    inverse: Mat4,
    /// Identity transforms skip the ray transform entirely.
    identity: bool,
    material_index: u32,
    // material flags consulted during traversal
    casts_shadows: bool,
    double_sided: bool,
    world_bounds: Aabb,
}

impl MeshInstance {
    /// Place `mesh` with the given transform. The shadow and sidedness
    /// flags come from the material this instance is shaded with.
    pub fn new(
        mesh: Arc<MeshAccel>,
        transform: Option<Mat4>,
        material_index: u32,
        material: &Material,
    ) -> Self {
        let (forward, inverse, identity, world_bounds) = match transform {
            Some(matrix) => (
                matrix,
                matrix.inverse(),
                false,
                mesh.bounds().transformed_by(&matrix),
            ),
            None => (Mat4::IDENTITY, Mat4::IDENTITY, true, mesh.bounds()),
        };

        Self {
            mesh,
            forward,
            inverse,
            identity,
            material_index,
            casts_shadows: material.casts_shadows,
            double_sided: material.double_sided,
            world_bounds,
        }
    }

    pub fn mesh(&self) -> &MeshAccel {
        &self.mesh
    }

    pub fn material_index(&self) -> u32 {
        self.material_index
    }

    pub fn world_bounds(&self) -> Aabb {
        self.world_bounds
    }

    /// Carry a world-space point into instance-local space.
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        if self.identity {
            point
        } else {
            self.inverse.transform_point3(point)
        }
    }

    /// Carry an instance-local normal back to world space.
    pub fn transform_normal(&self, normal: Vec3) -> Vec3 {
        if self.identity {
            normal
        } else {
            self.forward.transform_vector3(normal).normalize()
        }
    }
}

impl Primitive for MeshInstance {
    fn bounds(&self) -> Aabb {
        self.world_bounds
    }

    fn centroid(&self) -> Vec3 {
        self.world_bounds.centroid()
    }

    fn intersect(&self, ray: &Ray, t_min: f32, t_max: f32, hit: &mut RayHit) -> bool {
        // materials that do not cast shadows are invisible to shadow rays
        if ray.kind == RayKind::Shadow && !self.casts_shadows {
            return false;
        }

        let local_ray = if self.identity {
            *ray
        } else {
            ray.with_endpoints(
                self.inverse.transform_point3(ray.origin),
                self.inverse.transform_vector3(ray.direction),
            )
        };

        let found = self.mesh.intersect(
            &local_ray,
            glint_math::Interval::new(t_min, t_max),
            hit,
            self.double_sided,
        );
        if found {
            // geometric normal in world space; smooth shading replaces it
            // later when the material asks for it
            let normal = self.mesh.mesh().triangle_normals[hit.triangle_index as usize];
            hit.normal = self.transform_normal(normal);
        }
        found
    }
}
