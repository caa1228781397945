//! Procedural and bitmap textures, sampled by hit coordinates.

use std::path::Path;

use glint_math::{Vec2, Vec3};

use crate::error::{SceneError, SceneResult};

/// A texture in the scene's texture table.
///
/// `Checker` and `Bitmap` sample by interpolated texture coordinates,
/// `Edges` by the raw triangle barycentrics.
#[derive(Clone, Debug)]
pub enum Texture {
    /// Uniform colour.
    Albedo(Vec3),
    Checker {
        color_a: Vec3,
        color_b: Vec3,
        square_size: f32,
    },
    Edges {
        edge_color: Vec3,
        inner_color: Vec3,
        edge_width: f32,
    },
    Bitmap(Bitmap),
}

impl Texture {
    /// Sample the texture.
    ///
    /// `bary` is the (u, v) barycentric pair of the hit triangle, `uv` the
    /// interpolated texture coordinates.
    pub fn sample(&self, bary: Vec2, uv: Vec2) -> Vec3 {
        match self {
            Texture::Albedo(color) => *color,
            Texture::Checker {
                color_a,
                color_b,
                square_size,
            } => {
                let checker =
                    (uv.x / square_size) as i32 % 2 == (uv.y / square_size) as i32 % 2;
                if checker {
                    *color_a
                } else {
                    *color_b
                }
            }
            Texture::Edges {
                edge_color,
                inner_color,
                edge_width,
            } => {
                let dist = bary.x.min(bary.y).min(1.0 - bary.x - bary.y);
                if dist < *edge_width {
                    *edge_color
                } else {
                    *inner_color
                }
            }
            Texture::Bitmap(bitmap) => bitmap.sample(uv),
        }
    }
}

/// A decoded image, stored as linear-float RGB.
#[derive(Clone, Debug)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major, top row first.
    pub pixels: Vec<Vec3>,
}

impl Bitmap {
    /// Decode an image file.
    ///
    /// Rows are kept in decode order; `sample` flips V instead, so no
    /// load-time flip state exists anywhere.
    pub fn load(path: &Path) -> SceneResult<Self> {
        let img = image::open(path).map_err(|source| SceneError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        let rgb = img.to_rgb32f();
        let (width, height) = rgb.dimensions();
        let pixels = rgb
            .pixels()
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Nearest sample with wrap-around, (0, 0) at the bottom-left.
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        if self.width == 0 || self.height == 0 {
            return Vec3::ZERO;
        }
        let u = uv.x.rem_euclid(1.0);
        let v = 1.0 - uv.y.rem_euclid(1.0);

        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);

        self.pixels[(y * self.width + x) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_albedo_sample() {
        let tex = Texture::Albedo(Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(tex.sample(Vec2::ZERO, Vec2::ZERO), Vec3::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn test_checker_alternates() {
        let tex = Texture::Checker {
            color_a: Vec3::ONE,
            color_b: Vec3::ZERO,
            square_size: 0.25,
        };

        let a = tex.sample(Vec2::ZERO, Vec2::new(0.1, 0.1));
        let b = tex.sample(Vec2::ZERO, Vec2::new(0.3, 0.1));
        assert_ne!(a, b);

        // Stepping one square along both axes returns to the same colour
        let c = tex.sample(Vec2::ZERO, Vec2::new(0.3, 0.3));
        assert_eq!(a, c);
    }

    #[test]
    fn test_edges_band() {
        let tex = Texture::Edges {
            edge_color: Vec3::X,
            inner_color: Vec3::Y,
            edge_width: 0.1,
        };

        // Centroid is far from all edges
        let inner = tex.sample(Vec2::new(1.0 / 3.0, 1.0 / 3.0), Vec2::ZERO);
        assert_eq!(inner, Vec3::Y);

        // Near the u = 0 edge
        let edge = tex.sample(Vec2::new(0.01, 0.5), Vec2::ZERO);
        assert_eq!(edge, Vec3::X);
    }

    #[test]
    fn test_bitmap_sample_orientation() {
        // 1x2 bitmap: top row red, bottom row green
        let bitmap = Bitmap {
            width: 1,
            height: 2,
            pixels: vec![Vec3::X, Vec3::Y],
        };

        // v near 0 samples the bottom row
        assert_eq!(bitmap.sample(Vec2::new(0.0, 0.1)), Vec3::Y);
        assert_eq!(bitmap.sample(Vec2::new(0.0, 0.9)), Vec3::X);
    }
}
