//! Recursive shading.
//!
//! A bounded-depth Whitted-style integrator with one cosine-weighted
//! indirect bounce on diffuse surfaces. Dispatch over the material variants
//! is a plain match; the set is closed.

use std::f32::consts::PI;

use glint_core::MaterialKind;
use glint_math::{Ray, Vec3};

use crate::hit::RayHit;
use crate::sampler::Sampler;
use crate::world::World;

/// Rays stop spawning children at this depth and return the background.
pub const MAX_TRACE_DEPTH: u32 = 3;

/// Child rays start this far off the surface, pushed along the normal
/// toward the outgoing side.
const OFFSET_EPSILON: f32 = 1e-3;

/// Trace a ray into the world and shade whatever it hits.
pub fn trace(world: &World, ray: &Ray, depth: u32, sampler: &mut Sampler) -> Vec3 {
    let mut hit = world.intersect(ray);
    if !hit.is_hit() {
        return world.background;
    }
    hit.depth = depth;
    world.fill_hit_info(&mut hit, ray);
    shade(world, ray, &hit, sampler)
}

fn shade(world: &World, ray: &Ray, hit: &RayHit, sampler: &mut Sampler) -> Vec3 {
    if hit.depth >= MAX_TRACE_DEPTH {
        return world.background;
    }

    let material = world.material_for(hit);
    match &material.kind {
        MaterialKind::Diffuse { albedo } => {
            shade_diffuse(world, hit, albedo, material.receives_shadows, sampler)
        }
        MaterialKind::Reflective { albedo } => {
            shade_reflective(world, ray, hit, *albedo, sampler)
        }
        MaterialKind::Refractive { ior, absorption } => {
            shade_refractive(world, ray, hit, *ior, *absorption, sampler)
        }
        MaterialKind::Constant { albedo } => *albedo,
    }
}

fn shade_diffuse(
    world: &World,
    hit: &RayHit,
    albedo: &glint_core::Albedo,
    receives_shadows: bool,
    sampler: &mut Sampler,
) -> Vec3 {
    let mut radiance = Vec3::ZERO;

    for light in &world.lights {
        let to_light = light.position - hit.position;
        let distance_sq = to_light.length_squared();
        let distance = distance_sq.sqrt();
        let direction = to_light / distance;

        if receives_shadows {
            let shadow_ray = Ray::shadow(
                hit.position + hit.normal * OFFSET_EPSILON,
                direction,
            );
            if world.occluded(&shadow_ray, distance - OFFSET_EPSILON) {
                continue;
            }
        }

        radiance += light.color * light.intensity * hit.normal.dot(direction).max(0.0)
            / (4.0 * PI * distance_sq);
    }

    // one indirect bounce, cosine weighted about the normal
    let bounce = Ray::new(
        hit.position + hit.normal * OFFSET_EPSILON,
        sampler.cosine_hemisphere(hit.normal),
    );
    radiance += trace(world, &bounce, hit.depth + 1, sampler);

    radiance * world.sample_albedo(albedo, hit)
}

fn shade_reflective(
    world: &World,
    ray: &Ray,
    hit: &RayHit,
    albedo: Vec3,
    sampler: &mut Sampler,
) -> Vec3 {
    let direction = reflect(ray.direction, hit.normal).normalize();
    // push the origin off the surface on the outgoing side; double-sided
    // mirrors can be hit from behind their geometric normal
    let offset = if direction.dot(hit.normal) >= 0.0 {
        hit.normal
    } else {
        -hit.normal
    } * OFFSET_EPSILON;
    let reflected = Ray::new(hit.position + offset, direction);
    trace(world, &reflected, hit.depth + 1, sampler) * albedo
}

fn shade_refractive(
    world: &World,
    ray: &Ray,
    hit: &RayHit,
    ior: f32,
    absorption: Vec3,
    sampler: &mut Sampler,
) -> Vec3 {
    let entering = hit.normal.dot(ray.direction) < 0.0;

    let (n1, n2, normal) = if entering {
        (1.0, ior, hit.normal)
    } else {
        (ior, 1.0, -hit.normal)
    };
    let eta = n1 / n2;

    let cos_incident = (-normal.dot(ray.direction)).min(1.0);
    let sin2_transmitted = eta * eta * (1.0 - cos_incident * cos_incident);
    let total_internal = sin2_transmitted > 1.0;

    let fresnel = if total_internal {
        1.0
    } else {
        // Schlick, using the transmitted angle when leaving the denser side
        let cos = if n1 > n2 {
            (1.0 - sin2_transmitted).sqrt()
        } else {
            cos_incident
        };
        let r0 = ((n1 - n2) / (n1 + n2)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cos).clamp(0.0, 1.0).powi(5)
    };

    let refracted = refract(ray.direction, normal, eta);
    // a zero or non-finite transmitted direction is numeric trouble;
    // fall back to the reflection branch for this ray and carry on
    let refraction_unusable = total_internal || !refracted.is_finite()
        || refracted.length_squared() < 1e-12;

    let color = if refraction_unusable || sampler.next_f32() < fresnel {
        let reflected = Ray::new(
            hit.position + normal * OFFSET_EPSILON,
            reflect(ray.direction, normal).normalize(),
        );
        trace(world, &reflected, hit.depth + 1, sampler)
    } else {
        let transmitted = Ray::new(
            hit.position - normal * OFFSET_EPSILON,
            refracted.normalize(),
        );
        trace(world, &transmitted, hit.depth + 1, sampler)
    };

    if entering {
        color
    } else {
        // the ray just crossed the medium; attenuate by the distance it
        // travelled inside
        color * (-absorption * hit.t).exp()
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a vector through a surface with relative IOR `eta`.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = eta * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect() {
        let v = Vec3::new(1.0, -1.0, 0.0).normalize();
        let r = reflect(v, Vec3::Y);
        assert!((r - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn test_refract_straight_through_matched_media() {
        let v = Vec3::new(0.0, -1.0, 0.0);
        let r = refract(v, Vec3::Y, 1.0);
        assert!((r - v).length() < 1e-6);
    }

    #[test]
    fn test_refract_bends_toward_normal_entering_denser() {
        let v = Vec3::new(1.0, -1.0, 0.0).normalize();
        let r = refract(v, Vec3::Y, 1.0 / 1.5).normalize();
        // more vertical than the incident direction
        assert!(r.y < 0.0);
        assert!(r.x.abs() < v.x.abs());
    }
}
