use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the rendering pipeline.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("tile job failed: {0}")]
    TileFailed(String),

    #[error("failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode image {path}: {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
