use crate::constants::{MAX_FILE_SIZE, WEBP_MAX_DIMENSION};
use crate::error::{Result, WebpifyError};
use std::fs;
use std::path::{Path, PathBuf};

/// Validate the input directory and return its canonical path
pub fn validate_input_directory(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(WebpifyError::InputNotFound(path.to_path_buf()));
    }

    if !path.is_dir() {
        return Err(WebpifyError::InputNotDirectory(path.to_path_buf()));
    }

    path.canonicalize()
        .map_err(|_| WebpifyError::InputNotFound(path.to_path_buf()))
}

/// Create the output directory if needed and return its canonical path.
///
/// Safe to call concurrently for the same path.
pub fn ensure_output_directory(path: &Path) -> Result<PathBuf> {
    if path.exists() && !path.is_dir() {
        return Err(WebpifyError::OutputNotDirectory(path.to_path_buf()));
    }

    fs::create_dir_all(path)
        .map_err(|e| WebpifyError::DirectoryCreationFailed(path.to_path_buf(), e))?;

    path.canonicalize()
        .map_err(|e| WebpifyError::DirectoryCreationFailed(path.to_path_buf(), e))
}

/// Make `path` absolute without touching the file system beyond reading the
/// current directory. Used where the target may not exist yet.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Check the source file size before decoding it
pub fn validate_source_size(path: &Path) -> Result<u64> {
    let size = fs::metadata(path)?.len();
    if size > MAX_FILE_SIZE {
        return Err(WebpifyError::FileTooLarge(size, MAX_FILE_SIZE));
    }
    Ok(size)
}

/// Check decoded dimensions against what libwebp can encode
pub fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(WebpifyError::InvalidDimensions(
            width,
            height,
            WEBP_MAX_DIMENSION,
        ));
    }
    Ok(())
}
