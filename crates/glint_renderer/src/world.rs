//! The built scene the integrator traces against.

use std::sync::Arc;

use glint_core::{Albedo, Camera, Material, PointLight, Scene, Texture};
use glint_math::{Interval, Ray, Vec3};

use crate::bvh::Bvh;
use crate::hit::RayHit;
use crate::instance::MeshInstance;
use crate::mesh_accel::MeshAccel;

/// Hits closer than this are treated as self-intersection noise.
pub const T_MIN: f32 = 1e-4;

/// A scene with all of its acceleration structures in place.
///
/// Built once on one thread, then shared read-only by every render worker:
/// per-mesh triangle BVHs, one top-level BVH over the mesh instances, and
/// the material/texture/light tables shading consults.
pub struct World {
    pub background: Vec3,
    pub camera: Camera,
    pub lights: Vec<PointLight>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    meshes: Vec<Arc<MeshAccel>>,
    bvh: Bvh<MeshInstance>,
}

impl World {
    /// Consume a loaded scene and build every acceleration structure.
    pub fn build(scene: Scene) -> Self {
        let meshes: Vec<Arc<MeshAccel>> = scene
            .meshes
            .iter()
            .map(|mesh| Arc::new(MeshAccel::build(mesh.clone())))
            .collect();

        let mut bvh = Bvh::new();
        for object in &scene.objects {
            let material = &scene.materials[object.material_index];
            bvh.add_primitive(MeshInstance::new(
                meshes[object.mesh].clone(),
                object.transform,
                object.material_index as u32,
                material,
            ));
        }
        bvh.build();

        Self {
            background: scene.background,
            camera: scene.camera,
            lights: scene.lights,
            materials: scene.materials,
            textures: scene.textures,
            meshes,
            bvh,
        }
    }

    pub fn instances(&self) -> &[MeshInstance] {
        self.bvh.primitives()
    }

    pub fn meshes(&self) -> &[Arc<MeshAccel>] {
        &self.meshes
    }

    /// Closest hit along a ray, or a default record on a miss.
    pub fn intersect(&self, ray: &Ray) -> RayHit {
        let mut hit = RayHit::default();
        self.bvh
            .intersect(ray, Interval::new(T_MIN, f32::MAX), &mut hit);
        hit
    }

    /// Whether anything opaque blocks the ray within `max_t`.
    pub fn occluded(&self, ray: &Ray, max_t: f32) -> bool {
        let mut hit = RayHit::default();
        self.bvh.intersect(ray, Interval::new(T_MIN, max_t), &mut hit)
    }

    /// The material a hit is shaded with.
    pub fn material_for(&self, hit: &RayHit) -> &Material {
        let index = self.bvh.primitive(hit.object_index).material_index() as usize;
        debug_assert!(index < self.materials.len(), "material index out of range");
        &self.materials[index]
    }

    /// Complete a traversal hit with world position, shading normal and
    /// texture coordinates.
    pub fn fill_hit_info(&self, hit: &mut RayHit, ray: &Ray) {
        if !hit.is_hit() {
            return;
        }

        let instance = self.bvh.primitive(hit.object_index);
        let material = &self.materials[instance.material_index() as usize];
        let mesh = instance.mesh().mesh();

        hit.position = ray.at(hit.t);

        let [a, b, c] = mesh.indices[hit.triangle_index as usize];
        let (u, v) = (hit.bary.x, hit.bary.y);
        let w = 1.0 - u - v;

        if material.smooth {
            let normal = mesh.normals[a as usize] * w
                + mesh.normals[b as usize] * u
                + mesh.normals[c as usize] * v;
            hit.normal = instance.transform_normal(normal.normalize());
        }
        // otherwise keep the geometric normal traversal already produced

        let tex = mesh.uvs[a as usize] * w + mesh.uvs[b as usize] * u + mesh.uvs[c as usize] * v;
        hit.tex_coords = tex.truncate();
    }

    /// Resolve a diffuse albedo at a hit.
    pub fn sample_albedo(&self, albedo: &Albedo, hit: &RayHit) -> Vec3 {
        match albedo {
            Albedo::Color(color) => *color,
            Albedo::Texture(index) => match self.textures.get(*index) {
                Some(texture) => texture.sample(hit.bary, hit.tex_coords),
                None => {
                    log::error!("texture index {index} out of range");
                    Vec3::ZERO
                }
            },
        }
    }
}
