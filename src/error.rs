use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    /// The file could not be opened or decoded as an image.
    /// Recoverable: the pipeline skips the file and keeps going.
    #[error("Error decoding image {path:?}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// Not enough processable images to form the requested clusters.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("The cluster count must be at least 1, got {0}.")]
    InvalidClusterCount(usize),
    #[error("The path {0:?} is not a directory.")]
    NotADirectory(PathBuf),
    #[error("No images found in {0:?}.")]
    NoImagesFound(PathBuf),
    #[error("No cluster directories found in {0:?}.")]
    NoClusterDirectories(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
