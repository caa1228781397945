//! Render output buffer and image writers.

use std::io::Write;
use std::path::Path;

use glint_math::{UVec2, Vec3};

use crate::error::RenderError;
use crate::tile::Tile;

/// Linear RGB float image the renderer accumulates into.
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

impl Frame {
    /// Create a new frame filled with black.
    pub fn new(resolution: UVec2) -> Self {
        Self {
            width: resolution.x,
            height: resolution.y,
            pixels: vec![Vec3::ZERO; (resolution.x * resolution.y) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Vec3) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Copy a tile's pixels (row-major within the tile) into place.
    pub fn blit(&mut self, tile: &Tile, pixels: &[Vec3]) {
        debug_assert_eq!(pixels.len(), tile.pixel_count() as usize);
        for row in 0..tile.height {
            let src = (row * tile.width) as usize;
            let dst = ((tile.y + row) * self.width + tile.x) as usize;
            self.pixels[dst..dst + tile.width as usize]
                .copy_from_slice(&pixels[src..src + tile.width as usize]);
        }
    }

    /// Tone map to 8-bit RGBA: clamp to [0, 1] and scale.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.push(quantize(color.x));
            bytes.push(quantize(color.y));
            bytes.push(quantize(color.z));
            bytes.push(255);
        }
        bytes
    }

    /// Write a binary PPM (P6).
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut row = Vec::with_capacity(self.width as usize * 3);
        for y in 0..self.height {
            row.clear();
            for x in 0..self.width {
                let color = self.get(x, y);
                row.push(quantize(color.x));
                row.push(quantize(color.y));
                row.push(quantize(color.z));
            }
            out.write_all(&row)?;
        }
        Ok(())
    }

    /// Save to a file; the extension picks the format (`.png` or PPM).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("png") => self.save_png(path),
            _ => self.save_ppm(path),
        }
    }

    fn save_ppm(&self, path: &Path) -> Result<(), RenderError> {
        let file = std::fs::File::create(path).map_err(|source| RenderError::ImageWrite {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = std::io::BufWriter::new(file);
        self.write_ppm(&mut writer)
            .map_err(|source| RenderError::ImageWrite {
                path: path.to_path_buf(),
                source,
            })
    }

    fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        let buffer =
            image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8())
                .expect("frame byte count matches dimensions");
        buffer.save(path).map_err(|source| RenderError::ImageEncode {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[inline]
fn quantize(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blit_places_tile_pixels() {
        let mut frame = Frame::new(UVec2::new(8, 8));
        let tile = Tile {
            x: 4,
            y: 2,
            width: 2,
            height: 2,
            index: 0,
        };
        let pixels = vec![Vec3::X, Vec3::Y, Vec3::Z, Vec3::ONE];
        frame.blit(&tile, &pixels);

        assert_eq!(frame.get(4, 2), Vec3::X);
        assert_eq!(frame.get(5, 2), Vec3::Y);
        assert_eq!(frame.get(4, 3), Vec3::Z);
        assert_eq!(frame.get(5, 3), Vec3::ONE);
        // untouched elsewhere
        assert_eq!(frame.get(0, 0), Vec3::ZERO);
    }

    #[test]
    fn test_ppm_header_and_size() {
        let mut frame = Frame::new(UVec2::new(3, 2));
        frame.set(0, 0, Vec3::ONE);

        let mut buffer = Vec::new();
        frame.write_ppm(&mut buffer).unwrap();

        assert!(buffer.starts_with(b"P6\n3 2\n255\n"));
        let header_len = b"P6\n3 2\n255\n".len();
        assert_eq!(buffer.len(), header_len + 3 * 2 * 3);
        // first pixel is white
        assert_eq!(&buffer[header_len..header_len + 3], &[255, 255, 255]);
    }

    #[test]
    fn test_png_round_trip() {
        let mut frame = Frame::new(UVec2::new(2, 2));
        frame.set(0, 0, Vec3::X);
        frame.set(1, 1, Vec3::ONE);

        let path = std::env::temp_dir().join("glint_frame_roundtrip.png");
        frame.save(&path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(1, 1).0, [255, 255, 255, 255]);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_tone_map_clamps() {
        let mut frame = Frame::new(UVec2::new(1, 1));
        frame.set(0, 0, Vec3::new(2.0, -1.0, 0.5));

        let bytes = frame.to_rgba8();
        assert_eq!(bytes[0], 255);
        assert_eq!(bytes[1], 0);
        assert_eq!(bytes[2], 127);
        assert_eq!(bytes[3], 255);
    }
}
