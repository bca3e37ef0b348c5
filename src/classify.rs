//! Content sniffing and the convert/skip decision
//!
//! Classification never looks at file extensions: a PNG saved as `photo.jpg`
//! is reported as `image/png`. The decision itself is plain set membership so
//! it can be tested without touching the file system.

use crate::constants::SNIFF_HEADER_LEN;
use crate::error::ClassificationError;
use image::ImageFormat;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A normalised MIME type label such as `image/jpeg`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MimeType(String);

impl MimeType {
    /// Trims whitespace and lowercases, so `" Image/PNG "` equals `image/png`.
    pub fn new(value: &str) -> Self {
        MimeType(value.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MimeType {
    fn from(value: &str) -> Self {
        MimeType::new(value)
    }
}

/// Outcome of checking a MIME type against the configured sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Convert,
    /// Listed in the skip set. Wins over the accepted set.
    Skip,
    NotAccepted,
}

/// Maps a detected container format to its MIME label.
pub fn mime_for_format(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        ImageFormat::Qoi => "image/x-qoi",
        ImageFormat::Tga => "image/x-tga",
        ImageFormat::Hdr => "image/vnd.radiance",
        ImageFormat::OpenExr => "image/x-exr",
        ImageFormat::Pnm => "image/x-portable-anymap",
        _ => "application/octet-stream",
    }
}

/// Determines the MIME type of an in-memory file header.
///
/// Only the leading magic bytes are inspected, so passing the first few
/// dozen bytes of a file is enough.
pub fn classify(bytes: &[u8]) -> Result<MimeType, ClassificationError> {
    if bytes.is_empty() {
        return Err(ClassificationError::Empty);
    }

    let format = image::guess_format(bytes).map_err(|_| ClassificationError::Unrecognized)?;
    Ok(MimeType::new(mime_for_format(format)))
}

/// Reads the header of `path` and classifies it.
pub fn classify_file(path: &Path) -> Result<MimeType, ClassificationError> {
    let mut file = File::open(path).map_err(ClassificationError::Unreadable)?;
    let mut header = Vec::with_capacity(SNIFF_HEADER_LEN);
    file.by_ref()
        .take(SNIFF_HEADER_LEN as u64)
        .read_to_end(&mut header)
        .map_err(ClassificationError::Unreadable)?;

    classify(&header)
}

/// Skip set first, then accepted set.
pub fn decide(
    mime: &MimeType,
    accepted: &BTreeSet<MimeType>,
    skip: &BTreeSet<MimeType>,
) -> Decision {
    if skip.contains(mime) {
        Decision::Skip
    } else if accepted.contains(mime) {
        Decision::Convert
    } else {
        Decision::NotAccepted
    }
}
