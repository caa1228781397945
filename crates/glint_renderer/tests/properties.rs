//! Randomised invariant checks for the acceleration structures and the
//! deterministic sampling pipeline.

use glint_core::Scene;
use glint_math::{Aabb, Interval, Mat4, Ray, UVec2, Vec3};
use glint_renderer::{
    trace, Bvh, MeshTri, Primitive, RayHit, RenderSettings, Renderer, Sampler, World,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vec3(rng: &mut StdRng, min: f32, max: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(min..max),
        rng.gen_range(min..max),
        rng.gen_range(min..max),
    )
}

fn random_unit(rng: &mut StdRng) -> Vec3 {
    loop {
        let v = random_vec3(rng, -1.0, 1.0);
        let len_sq = v.length_squared();
        if len_sq > 1e-4 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

fn random_triangle_soup(rng: &mut StdRng, count: usize) -> Vec<MeshTri> {
    (0..count)
        .map(|i| {
            let anchor = random_vec3(rng, -4.0, 4.0);
            MeshTri::new(
                anchor,
                anchor + random_vec3(rng, -1.0, 1.0),
                anchor + random_vec3(rng, -1.0, 1.0),
                i as u32,
            )
        })
        .collect()
}

/// Traversal must agree with brute force for every ray: no missed closer
/// hits, no phantom hits.
#[test]
fn bvh_matches_brute_force_on_random_rays() {
    let mut rng = StdRng::seed_from_u64(42);
    let triangles = random_triangle_soup(&mut rng, 256);
    let bvh = Bvh::from_primitives(triangles.clone());

    let mut hits = 0;
    for i in 0..10_000 {
        let ray = Ray::new(random_vec3(&mut rng, -6.0, 6.0), random_unit(&mut rng));

        let mut fast = RayHit::default();
        let fast_found = bvh.intersect(&ray, Interval::new(1e-4, f32::MAX), &mut fast);

        let mut best_t = f32::MAX;
        let mut brute_found = false;
        for tri in &triangles {
            let mut candidate = RayHit::default();
            if tri.intersect(&ray, 1e-4, best_t, &mut candidate) {
                best_t = candidate.t;
                brute_found = true;
            }
        }

        assert_eq!(fast_found, brute_found, "ray {i}: existence disagrees");
        if fast_found {
            hits += 1;
            assert!(
                (fast.t - best_t).abs() <= 1e-4 * best_t.max(1.0),
                "ray {i}: bvh t {} vs brute force t {}",
                fast.t,
                best_t
            );
        }
    }
    // the soup is dense enough that this exercises real traversal
    assert!(hits > 500, "only {hits} of 10000 rays hit anything");
}

/// A ray aimed at a point on the box's surface must see the box no farther
/// than that point.
#[test]
fn slab_entry_distance_bounds_surface_hits() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..2_000 {
        let a = random_vec3(&mut rng, -5.0, 5.0);
        let b = a + random_vec3(&mut rng, 0.1, 4.0);
        let aabb = Aabb::from_points(a, b);

        // pick a point on a random face
        let mut surface = Vec3::new(
            rng.gen_range(aabb.min.x..=aabb.max.x),
            rng.gen_range(aabb.min.y..=aabb.max.y),
            rng.gen_range(aabb.min.z..=aabb.max.z),
        );
        let face = rng.gen_range(0..6usize);
        surface[face / 2] = if face % 2 == 0 {
            aabb.min[face / 2]
        } else {
            aabb.max[face / 2]
        };

        let origin = surface + random_unit(&mut rng) * rng.gen_range(1.0..10.0);
        let to_surface = surface - origin;
        let t_hit = to_surface.length();
        let ray = Ray::new(origin, to_surface / t_hit);

        let entry = aabb
            .entry_distance(&ray)
            .expect("ray aimed at the surface must hit the box");
        assert!(
            entry <= t_hit + 1e-3,
            "entry {entry} beyond the surface point at {t_hit}"
        );

        // the reverse ray bounds the exit side the same way
        let far_origin = surface + ray.direction * rng.gen_range(1.0..10.0);
        let reverse = Ray::new(far_origin, -ray.direction);
        let reverse_entry = reverse
            .direction
            .dot(surface - far_origin)
            .max(0.0);
        let entry_back = aabb
            .entry_distance(&reverse)
            .expect("reverse ray must hit the box");
        assert!(entry_back <= reverse_entry + 1e-3);
    }
}

/// A diffuse surface with albedo <= 1 and no lights cannot brighten the
/// environment.
#[test]
fn diffuse_energy_is_bounded() {
    let world = World::build(
        Scene::from_json(
            r#"{
        "settings": {
            "image_settings": { "width": 8, "height": 8 },
            "background_color": [1, 1, 1]
        },
        "camera": { "matrix": [1,0,0,0,1,0,0,0,1], "position": [0, 1, 3] },
        "objects": [
            {
                "vertices": [-10, 0, -10, 10, 0, -10, 10, 0, 10, -10, 0, 10],
                "triangles": [0, 2, 1, 0, 3, 2]
            }
        ],
        "materials": [ { "type": "diffuse", "albedo": [1, 1, 1] } ]
    }"#,
            None,
        )
        .unwrap(),
    );

    let origin = Vec3::new(0.0, 1.0, 3.0);
    for i in 0..10_000u32 {
        let mut sampler = Sampler::for_pixel(UVec2::new(i % 100, i / 100), 100, 0, 1);
        // fan rays across the floor
        let target = Vec3::new(
            (i % 100) as f32 / 10.0 - 5.0,
            0.0,
            (i / 100) as f32 / 10.0 - 5.0,
        );
        let ray = Ray::new(origin, (target - origin).normalize());
        let radiance = trace(&world, &ray, 0, &mut sampler);

        for axis in 0..3 {
            assert!(
                radiance[axis] <= 1.01,
                "ray {i} gained energy: {radiance:?}"
            );
        }
    }
}

/// Hits on a transformed instance must land on the mesh after the inverse
/// transform.
#[test]
fn instance_hits_round_trip_to_mesh_space() {
    use glint_core::{Albedo, Material, MaterialKind, Mesh};
    use glint_renderer::{MeshAccel, MeshInstance};
    use std::sync::Arc;

    // single triangle in the z = 0 plane
    let mesh = Mesh::from_arrays(
        &[-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.5, 0.0],
        &[0, 1, 2],
        None,
    )
    .unwrap();
    let accel = Arc::new(MeshAccel::build(Arc::new(mesh)));
    let material = Material::new(MaterialKind::Diffuse {
        albedo: Albedo::Color(Vec3::ONE),
    });

    let transform = Mat4::from_translation(Vec3::new(2.0, -1.0, -6.0))
        * Mat4::from_rotation_y(0.7)
        * Mat4::from_rotation_x(-0.3)
        * Mat4::from_scale(Vec3::new(1.5, 2.0, 0.75));
    let instance = MeshInstance::new(accel, Some(transform), 0, &material);

    let mut rng = StdRng::seed_from_u64(11);
    let mut hits = 0;
    for _ in 0..5_000 {
        let origin = random_vec3(&mut rng, -1.0, 5.0) + Vec3::new(0.0, 0.0, 4.0);
        let target = Vec3::new(
            rng.gen_range(1.0..3.0),
            rng.gen_range(-3.0..1.0),
            rng.gen_range(-7.0..-5.0),
        );
        let ray = Ray::new(origin, (target - origin).normalize());

        let mut hit = RayHit::default();
        if instance.intersect(&ray, 1e-4, f32::MAX, &mut hit) {
            hits += 1;
            let local = instance.to_local(ray.at(hit.t));
            // the mesh triangle lives in the z = 0 plane
            assert!(
                local.z.abs() < 1e-4,
                "local point {local:?} is off the mesh plane"
            );
        }
    }
    assert!(hits > 100, "too few instance hits to be meaningful: {hits}");
}

/// Identical seeds give byte-identical frames, regardless of thread count.
#[test]
fn renders_are_deterministic() {
    let scene_json = r#"{
        "settings": {
            "image_settings": { "width": 24, "height": 16 },
            "background_color": [0.05, 0.05, 0.1]
        },
        "camera": { "matrix": [1,0,0,0,1,0,0,0,1], "position": [0, 0.5, 3] },
        "lights": [ { "position": [2, 4, 2], "intensity": 60 } ],
        "objects": [
            {
                "vertices": [-4, 0, -4, 4, 0, -4, 4, 0, 4, -4, 0, 4],
                "triangles": [0, 2, 1, 0, 3, 2]
            },
            {
                "vertices": [-1, -1, -3, 1, -1, -3, 0, 1, -3],
                "triangles": [0, 1, 2],
                "material_index": 1
            }
        ],
        "materials": [
            { "type": "diffuse", "albedo": [0.7, 0.7, 0.7] },
            { "type": "reflective", "albedo": [0.9, 0.8, 0.7] }
        ]
    }"#;

    let settings = RenderSettings {
        spp: 2,
        ..Default::default()
    };

    let mut frames = Vec::new();
    for threads in [1, 4] {
        for _ in 0..2 {
            let world = World::build(Scene::from_json(scene_json, None).unwrap());
            let mut renderer = Renderer::new(world, settings.clone(), threads).unwrap();
            frames.push(renderer.render_frame(0).unwrap());
        }
    }

    let reference = frames[0].to_rgba8();
    for frame in &frames[1..] {
        assert_eq!(frame.to_rgba8(), reference);
        assert_eq!(frame.pixels, frames[0].pixels);
    }
}
