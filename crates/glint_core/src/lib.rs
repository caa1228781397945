//! Glint Core - renderer-agnostic scene model.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Mesh`, `Material`, `Texture`, `PointLight`,
//!   `Camera`
//! - **Scene loading**: the JSON scene description format
//! - **Geometry export**: Wavefront OBJ dump of a loaded scene
//!
//! # Example
//!
//! ```ignore
//! use glint_core::Scene;
//!
//! let scene = Scene::load("scene.json")?;
//! println!("Loaded {} objects, {} materials",
//!     scene.objects.len(),
//!     scene.materials.len());
//! ```

pub mod camera;
pub mod error;
pub mod light;
pub mod material;
pub mod mesh;
pub mod obj;
pub mod scene;
pub mod texture;

pub use camera::Camera;
pub use error::{SceneError, SceneResult};
pub use light::PointLight;
pub use material::{Albedo, Material, MaterialKind};
pub use mesh::Mesh;
pub use scene::{Scene, SceneObject};
pub use texture::Texture;
