//! Surface materials.
//!
//! The material set is closed and known up front, so it is a plain enum and
//! shading dispatches statically instead of through trait objects.

use glint_math::Vec3;

/// Where a diffuse surface gets its colour from.
#[derive(Clone, Debug)]
pub enum Albedo {
    Color(Vec3),
    /// Index into the scene's texture table.
    Texture(usize),
}

/// The shading model of a material.
#[derive(Clone, Debug)]
pub enum MaterialKind {
    /// Lambertian surface lit by the point lights plus one indirect bounce.
    Diffuse { albedo: Albedo },
    /// Perfect mirror.
    Reflective { albedo: Vec3 },
    /// Dielectric with Fresnel-weighted reflection/transmission.
    Refractive { ior: f32, absorption: Vec3 },
    /// Flat, unlit colour.
    Constant { albedo: Vec3 },
}

/// A material: shading model plus the flags traversal and shading consult.
#[derive(Clone, Debug)]
pub struct Material {
    pub kind: MaterialKind,
    /// Interpolate vertex normals instead of using the face normal.
    pub smooth: bool,
    /// Whether surfaces with this material occlude shadow rays.
    pub casts_shadows: bool,
    /// Whether this material tests the lights for occlusion at all.
    pub receives_shadows: bool,
    /// Whether back faces are hit; single-sided materials cull them.
    pub double_sided: bool,
}

impl Material {
    /// Flag defaults depend on the shading model: mirrors and diffuse
    /// surfaces behave like solid matter, refractive ones pass light
    /// through, constant ones ignore lighting entirely.
    pub fn new(kind: MaterialKind) -> Self {
        let (casts_shadows, receives_shadows, double_sided) = match kind {
            MaterialKind::Diffuse { .. } => (true, true, false),
            MaterialKind::Reflective { .. } => (true, true, false),
            MaterialKind::Refractive { .. } => (false, false, true),
            MaterialKind::Constant { .. } => (true, false, false),
        };
        Self {
            kind,
            smooth: false,
            casts_shadows,
            receives_shadows,
            double_sided,
        }
    }

    /// The fallback when a scene declares no materials: white diffuse,
    /// smooth shaded.
    pub fn default_diffuse() -> Self {
        let mut material = Material::new(MaterialKind::Diffuse {
            albedo: Albedo::Color(Vec3::ONE),
        });
        material.smooth = true;
        material
    }
}
