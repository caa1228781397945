//! Glint Renderer - CPU path tracing.
//!
//! The ray-scene intersection engine (a two-phase BVH instantiated over
//! mesh triangles and over mesh instances) and the tile-parallel shading
//! pipeline that consumes it.

mod bvh;
mod error;
mod frame;
mod hit;
mod instance;
mod integrator;
mod mesh_accel;
mod primitive;
mod renderer;
mod sampler;
mod tile;
mod triangle;
mod world;

pub use bvh::{Bvh, FlatNode};
pub use error::RenderError;
pub use frame::Frame;
pub use hit::{RayHit, INVALID_INDEX};
pub use instance::MeshInstance;
pub use integrator::{trace, MAX_TRACE_DEPTH};
pub use mesh_accel::MeshAccel;
pub use primitive::Primitive;
pub use renderer::{Renderer, RenderSettings};
pub use sampler::{hammersley, pcg_hash, Sampler};
pub use tile::{generate_tiles, Tile, TileJob, TilePool};
pub use triangle::MeshTri;
pub use world::World;

/// Re-export math and scene types used in this crate's public API.
pub use glint_core::Scene;
pub use glint_math::{Aabb, Interval, Ray, RayKind, Vec3};
