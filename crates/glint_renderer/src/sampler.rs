//! Deterministic per-pixel sampling.
//!
//! Every pixel gets its own generator seeded from (x, y, frame, base seed),
//! so renders are reproducible regardless of tile scheduling and no global
//! RNG state exists anywhere.

use glint_math::{UVec2, Vec2, Vec3};

/// PCG-style avalanche hash. Good enough to decorrelate neighbouring
/// pixel seeds.
#[inline]
pub fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747796405).wrapping_add(2891336453);
    let word = ((state >> ((state >> 28).wrapping_add(4))) ^ state).wrapping_mul(277803737);
    (word >> 22) ^ word
}

fn radical_inverse_vdc(mut bits: u32) -> f32 {
    bits = bits.rotate_left(16);
    bits = ((bits & 0x5555_5555) << 1) | ((bits & 0xAAAA_AAAA) >> 1);
    bits = ((bits & 0x3333_3333) << 2) | ((bits & 0xCCCC_CCCC) >> 2);
    bits = ((bits & 0x0F0F_0F0F) << 4) | ((bits & 0xF0F0_F0F0) >> 4);
    bits = ((bits & 0x00FF_00FF) << 8) | ((bits & 0xFF00_FF00) >> 8);
    bits as f32 * 2.328_306_4e-10 // / 0x100000000
}

/// The Hammersley low-discrepancy point set on the unit square.
pub fn hammersley(i: u32, n: u32) -> Vec2 {
    Vec2::new(i as f32 / n as f32, radical_inverse_vdc(i))
}

/// Per-pixel random number generator (an LCG seeded through `pcg_hash`).
pub struct Sampler {
    state: u32,
}

impl Sampler {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seed deterministically from pixel position, frame and base seed.
    pub fn for_pixel(pixel: UVec2, width: u32, frame: u32, base_seed: u32) -> Self {
        let frame_seed = pcg_hash(frame.wrapping_add(base_seed));
        let pixel_index = pixel.x.wrapping_add(pixel.y.wrapping_mul(width));
        Self {
            state: pcg_hash(pixel_index.wrapping_add(frame_seed)),
        }
    }

    /// Next float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345) & 0x7fff_ffff;
        self.state as f32 / 0x8000_0000u32 as f32
    }

    pub fn next_vec2(&mut self) -> Vec2 {
        Vec2::new(self.next_f32(), self.next_f32())
    }

    /// Cosine-weighted direction in the hemisphere around `normal`.
    ///
    /// Samples a disk and projects it up (Malley's method), then rotates
    /// into the normal's frame.
    pub fn cosine_hemisphere(&mut self, normal: Vec3) -> Vec3 {
        let r1 = self.next_f32();
        let r2 = self.next_f32();

        let radius = r1.sqrt();
        let theta = 2.0 * std::f32::consts::PI * r2;
        let x = radius * theta.cos();
        let y = radius * theta.sin();
        let z = (1.0 - r1).sqrt();

        let (tangent, bitangent) = tangent_basis(normal);
        x * tangent + y * bitangent + z * normal
    }
}

/// Orthonormal tangent/bitangent for a unit normal.
fn tangent_basis(n: Vec3) -> (Vec3, Vec3) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;

    let tangent = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bitangent = Vec3::new(b, sign + n.y * n.y * a, -n.y);

    (tangent, bitangent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Sampler::for_pixel(UVec2::new(3, 7), 64, 0, 42);
        let mut b = Sampler::for_pixel(UVec2::new(3, 7), 64, 0, 42);
        for _ in 0..32 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }

    #[test]
    fn test_neighbouring_pixels_differ() {
        let mut a = Sampler::for_pixel(UVec2::new(3, 7), 64, 0, 42);
        let mut b = Sampler::for_pixel(UVec2::new(4, 7), 64, 0, 42);
        let same = (0..8).filter(|_| a.next_f32() == b.next_f32()).count();
        assert!(same < 8);
    }

    #[test]
    fn test_frame_changes_sequence() {
        let mut a = Sampler::for_pixel(UVec2::new(3, 7), 64, 0, 42);
        let mut b = Sampler::for_pixel(UVec2::new(3, 7), 64, 1, 42);
        let same = (0..8).filter(|_| a.next_f32() == b.next_f32()).count();
        assert!(same < 8);
    }

    #[test]
    fn test_next_f32_range() {
        let mut sampler = Sampler::new(1);
        for _ in 0..1000 {
            let x = sampler.next_f32();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_hammersley_first_component() {
        let p = hammersley(4, 16);
        assert!((p.x - 0.25).abs() < 1e-6);
        // radical inverse of 1 is 0.5
        assert!((hammersley(1, 2).y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_hemisphere_stays_above_surface() {
        let mut sampler = Sampler::new(7);
        for normal in [Vec3::Y, Vec3::NEG_Z, Vec3::new(1.0, 1.0, 0.3).normalize()] {
            for _ in 0..500 {
                let dir = sampler.cosine_hemisphere(normal);
                assert!(dir.dot(normal) >= 0.0);
                assert!((dir.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_cosine_hemisphere_mean_direction() {
        // the sample mean should line up with the normal
        let mut sampler = Sampler::new(99);
        let normal = Vec3::Y;
        let mut mean = Vec3::ZERO;
        for _ in 0..4000 {
            mean += sampler.cosine_hemisphere(normal);
        }
        mean = mean.normalize();
        assert!(mean.dot(normal) > 0.95);
    }
}
