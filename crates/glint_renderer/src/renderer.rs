//! The render front-end: drives the tile pool over the image.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use glint_math::{UVec2, Vec3};

use crate::error::RenderError;
use crate::frame::Frame;
use crate::integrator::trace;
use crate::sampler::Sampler;
use crate::tile::{generate_tiles, TileJob, TilePool, DEFAULT_TILE_SIZE};
use crate::world::World;

/// Knobs for a render.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Scales the scene-declared resolution.
    pub resolution_scale: f32,
    /// Samples per pixel.
    pub spp: u32,
    pub tile_size: u32,
    /// Folded into every pixel's sampler seed.
    pub base_seed: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution_scale: 1.0,
            spp: 1,
            tile_size: DEFAULT_TILE_SIZE,
            base_seed: 0,
        }
    }
}

/// Renders frames of a built world on a reusable worker pool.
pub struct Renderer {
    world: World,
    pool: TilePool,
    settings: RenderSettings,
}

impl Renderer {
    /// `threads` = 0 uses the hardware concurrency.
    pub fn new(world: World, settings: RenderSettings, threads: usize) -> Result<Self, RenderError> {
        let pool = TilePool::new(threads)?;
        log::info!(
            "renderer ready: {} worker threads, {} spp",
            pool.thread_count(),
            settings.spp
        );
        Ok(Self {
            world,
            pool,
            settings,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Output resolution after scaling.
    pub fn resolution(&self) -> UVec2 {
        let base = self.world.camera.resolution;
        UVec2::new(
            ((base.x as f32 * self.settings.resolution_scale) as u32).max(1),
            ((base.y as f32 * self.settings.resolution_scale) as u32).max(1),
        )
    }

    /// Number of camera poses to render with the `a` CLI flag.
    pub fn frame_count(&self) -> usize {
        self.world.camera.frame_count()
    }

    /// Render one frame of the camera animation.
    pub fn render_frame(&mut self, frame: u32) -> Result<Frame, RenderError> {
        let resolution = self.resolution();
        self.world.camera.set_resolution(resolution);
        self.world.camera.set_frame(frame as usize);

        let world = &self.world;
        let settings = &self.settings;
        let spp = settings.spp.max(1);

        let tiles = generate_tiles(resolution, settings.tile_size);
        let progress = Progress::new("rendering", tiles.len());
        let output = Mutex::new(Frame::new(resolution));

        let jobs: Vec<TileJob> = tiles
            .iter()
            .map(|tile| {
                let tile = *tile;
                let output = &output;
                let progress = &progress;
                Box::new(move || {
                    let mut pixels = Vec::with_capacity(tile.pixel_count() as usize);
                    for local_y in 0..tile.height {
                        for local_x in 0..tile.width {
                            let pixel = UVec2::new(tile.x + local_x, tile.y + local_y);
                            let mut sampler = Sampler::for_pixel(
                                pixel,
                                resolution.x,
                                frame,
                                settings.base_seed,
                            );

                            let mut color = Vec3::ZERO;
                            for _ in 0..spp {
                                let jitter = sampler.next_vec2();
                                let ray = world.camera.generate_ray(pixel, jitter);
                                color += trace(world, &ray, 0, &mut sampler);
                            }
                            color /= spp as f32;
                            pixels.push(color.clamp(Vec3::ZERO, Vec3::ONE));
                        }
                    }
                    output.lock().unwrap().blit(&tile, &pixels);
                    progress.step();
                    Ok(())
                }) as TileJob
            })
            .collect();

        self.pool.run(jobs)?;
        progress.finish();

        Ok(output.into_inner().unwrap())
    }
}

/// Percent progress over a known amount of work, reported through the log.
struct Progress {
    name: &'static str,
    total: usize,
    current: AtomicUsize,
}

impl Progress {
    fn new(name: &'static str, total: usize) -> Self {
        Self {
            name,
            total,
            current: AtomicUsize::new(0),
        }
    }

    fn step(&self) {
        let done = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        // one line per ~decile is plenty
        let decile = self.total.div_ceil(10).max(1);
        if done % decile == 0 && done < self.total {
            log::info!("{}: {}%", self.name, done * 100 / self.total);
        }
    }

    fn finish(&self) {
        log::info!("{}: 100%", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::Scene;

    fn empty_scene_world() -> World {
        let json = r#"{
            "settings": {
                "image_settings": { "width": 4, "height": 4 },
                "background_color": [0.2, 0.3, 0.4]
            },
            "camera": { "matrix": [1,0,0,0,1,0,0,0,1], "position": [0,0,0] }
        }"#;
        World::build(Scene::from_json(json, None).unwrap())
    }

    #[test]
    fn test_empty_scene_renders_background() {
        let mut renderer =
            Renderer::new(empty_scene_world(), RenderSettings::default(), 2).unwrap();
        let frame = renderer.render_frame(0).unwrap();

        assert_eq!(frame.width, 4);
        assert_eq!(frame.height, 4);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(frame.get(x, y), Vec3::new(0.2, 0.3, 0.4));
            }
        }
    }

    #[test]
    fn test_resolution_scale() {
        let settings = RenderSettings {
            resolution_scale: 2.0,
            ..Default::default()
        };
        let renderer = Renderer::new(empty_scene_world(), settings, 1).unwrap();
        assert_eq!(renderer.resolution(), UVec2::new(8, 8));
    }
}
