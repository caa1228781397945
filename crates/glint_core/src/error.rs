use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a scene.
///
/// All of these are raised during construction; nothing on the render path
/// returns them.
#[derive(Error, Debug)]
pub enum SceneError {
    /// Structurally valid JSON describing an invalid scene.
    #[error("invalid scene: {0}")]
    Config(String),

    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scene file is not the JSON shape we expect.
    #[error("malformed scene JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A bitmap texture could not be decoded.
    #[error("failed to decode texture {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl SceneError {
    pub fn config(msg: impl Into<String>) -> Self {
        SceneError::Config(msg.into())
    }
}

pub type SceneResult<T> = Result<T, SceneError>;
