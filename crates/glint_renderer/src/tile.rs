//! Tile scheduling.
//!
//! The render is cut into fixed-size pixel tiles; each tile becomes one job
//! for a fixed pool of worker threads. The pool consumes a job list that is
//! queued in full before anything runs: every job executes exactly once,
//! `run` returns once the last job has finished, and the first job error is
//! surfaced without cancelling the workers still going.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use glint_math::UVec2;
use rayon::prelude::*;

use crate::error::RenderError;

/// Default edge length of a render tile, in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// A rectangular region of the output image.
#[derive(Debug, Clone, Copy)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Index of this tile in the job list.
    pub index: usize,
}

impl Tile {
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Cut a resolution into tiles, row-major. Edge tiles shrink to fit.
pub fn generate_tiles(resolution: UVec2, tile_size: u32) -> Vec<Tile> {
    let mut tiles = Vec::new();
    let mut index = 0;

    let mut y = 0;
    while y < resolution.y {
        let mut x = 0;
        while x < resolution.x {
            tiles.push(Tile {
                x,
                y,
                width: tile_size.min(resolution.x - x),
                height: tile_size.min(resolution.y - y),
                index,
            });
            index += 1;
            x += tile_size;
        }
        y += tile_size;
    }

    tiles
}

/// A queued unit of work. Borrows are fine; the pool never outlives them.
pub type TileJob<'a> = Box<dyn Fn() -> Result<(), RenderError> + Send + Sync + 'a>;

/// Fixed-size worker pool that drains a job list exactly once per `run`.
///
/// Long lived: build it once, reuse it for every frame.
pub struct TilePool {
    pool: rayon::ThreadPool,
}

impl TilePool {
    /// Spin up `threads` workers (0 picks the hardware concurrency).
    pub fn new(threads: usize) -> Result<Self, RenderError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("glint-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Execute every queued job once and wait for all of them.
    ///
    /// Returns the number of jobs executed, or the first captured error
    /// after the remaining jobs have still run to completion.
    pub fn run(&self, jobs: Vec<TileJob<'_>>) -> Result<usize, RenderError> {
        let executed = AtomicUsize::new(0);
        let failure: Mutex<Option<RenderError>> = Mutex::new(None);

        self.pool.install(|| {
            jobs.par_iter().for_each(|job| {
                executed.fetch_add(1, Ordering::Relaxed);
                if let Err(error) = job() {
                    let mut slot = failure.lock().unwrap();
                    // keep the first failure, let everyone else finish
                    if slot.is_none() {
                        *slot = Some(error);
                    }
                }
            });
        });

        match failure.into_inner().unwrap() {
            Some(error) => Err(error),
            None => Ok(executed.into_inner()),
        }
    }
}
