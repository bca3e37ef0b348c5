use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebpifyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageDecoding(#[from] image::ImageError),

    #[error("WebP encoding error: {0}")]
    WebpEncoding(String),

    #[error("Invalid quality value: {0}. Must be between 0 and 100")]
    InvalidQuality(u8),

    #[error("Invalid thread count: {0}. Must be at least 1")]
    InvalidThreadCount(usize),

    #[error("No MIME types to convert: the accepted type list is empty")]
    EmptyAcceptedTypes,

    #[error("Input path does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    InputNotDirectory(PathBuf),

    #[error("Failed to create output directory {0}: {1}")]
    DirectoryCreationFailed(PathBuf, #[source] std::io::Error),

    #[error("Output path exists but is not a directory: {0}")]
    OutputNotDirectory(PathBuf),

    #[error("Unreadable file content: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Invalid image dimensions: {0}x{1}. Maximum allowed: {2}x{2}")]
    InvalidDimensions(u32, u32, u32),

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("Path {0} is outside of input directory {1}")]
    OutsideInputDirectory(PathBuf, PathBuf),

    #[error("Output {0} is already produced by {1} in this run")]
    OutputCollision(PathBuf, PathBuf),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to start signal handler: {0}")]
    SignalHandler(String),
}

impl WebpifyError {
    /// Errors that abort the whole run before any file is touched.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            WebpifyError::InvalidQuality(_)
                | WebpifyError::InvalidThreadCount(_)
                | WebpifyError::EmptyAcceptedTypes
                | WebpifyError::InputNotFound(_)
                | WebpifyError::InputNotDirectory(_)
                | WebpifyError::DirectoryCreationFailed(..)
                | WebpifyError::OutputNotDirectory(_)
        )
    }
}

/// Failure to determine what kind of content a file holds.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("file is empty")]
    Empty,

    #[error("unrecognized image format")]
    Unrecognized,

    #[error("failed to read file header: {0}")]
    Unreadable(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WebpifyError>;
