use crate::classify::MimeType;
use crate::constants::WEBP_EXTENSION;
use crate::error::{Result, WebpifyError};
use crate::validation::{validate_dimensions, validate_source_size};
use image::{DynamicImage, GenericImageView, ImageReader};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// A classified source file and where its WebP counterpart goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub source_path: PathBuf,
    pub mime_type: MimeType,
    pub output_path: PathBuf,
}

impl ImageFile {
    pub fn new(
        source_path: &Path,
        mime_type: MimeType,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<Self> {
        let output_path = generate_output_path(source_path, input_dir, output_dir)?;
        Ok(Self {
            source_path: source_path.to_path_buf(),
            mime_type,
            output_path,
        })
    }
}

/// Output paths handed out during one run, keyed to the source that owns them.
///
/// `a.jpg` and `a.png` in the same directory both map to `a.webp`. Only the
/// first source to claim it is converted.
#[derive(Debug, Default)]
pub struct OutputClaims {
    claimed: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl OutputClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `image.output_path` for `image.source_path`.
    pub fn claim(&self, image: &ImageFile) -> Result<()> {
        let mut claimed = self.claimed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match claimed.get(&image.output_path) {
            Some(owner) if owner != &image.source_path => Err(WebpifyError::OutputCollision(
                image.output_path.clone(),
                owner.clone(),
            )),
            Some(_) => Ok(()),
            None => {
                claimed.insert(image.output_path.clone(), image.source_path.clone());
                Ok(())
            }
        }
    }
}

/// What happened to one converted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub original_size: u64,
    pub webp_size: u64,
    pub original_deleted: bool,
    /// Set when deletion was requested but failed. The WebP file is kept.
    pub delete_error: Option<String>,
}

/// Mirrors `source_path` from below `input_dir` to below `output_dir`,
/// with the extension replaced by `.webp`.
///
/// # Example
/// ```
/// use std::path::{Path, PathBuf};
/// use webpify::generate_output_path;
///
/// let out = generate_output_path(
///     Path::new("/photos/2024/beach.jpg"),
///     Path::new("/photos"),
///     Path::new("/webp"),
/// ).unwrap();
/// assert_eq!(out, PathBuf::from("/webp/2024/beach.webp"));
/// ```
pub fn generate_output_path(
    source_path: &Path,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<PathBuf> {
    let relative = source_path.strip_prefix(input_dir).map_err(|_| {
        WebpifyError::OutsideInputDirectory(source_path.to_path_buf(), input_dir.to_path_buf())
    })?;

    Ok(output_dir.join(relative).with_extension(WEBP_EXTENSION))
}

/// Loads an image file and returns it along with its size in bytes.
///
/// The decoder is picked from the file content, not its extension.
pub fn load_image_with_metadata(input_path: &Path) -> Result<(DynamicImage, u64)> {
    let file_size = validate_source_size(input_path)?;
    let img = ImageReader::open(input_path)?
        .with_guessed_format()?
        .decode()?;

    Ok((img, file_size))
}

/// Encodes `img` as lossy WebP.
pub fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    validate_dimensions(width, height)?;

    let quality = quality as f32;
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
        encoder.encode_simple(false, quality)
    } else {
        let rgb = img.to_rgb8();
        let encoder = webp::Encoder::from_rgb(rgb.as_raw(), width, height);
        encoder.encode_simple(false, quality)
    }
    .map_err(|e| WebpifyError::WebpEncoding(format!("{:?}", e)))?;

    Ok(encoded.to_vec())
}

/// Writes `bytes` to `output_path` through a temporary file in the same
/// directory, so readers never observe a half-written file. Returns the
/// number of bytes written.
pub fn write_output(bytes: &[u8], output_path: &Path, permissions_from: Option<&Path>) -> Result<u64> {
    let parent = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|e| WebpifyError::DirectoryCreationFailed(parent.to_path_buf(), e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".webpify-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;

    if let Some(source) = permissions_from {
        let permissions = fs::metadata(source)?.permissions();
        fs::set_permissions(temp.path(), permissions)?;
    }

    temp.persist(output_path).map_err(|e| WebpifyError::Io(e.error))?;
    Ok(bytes.len() as u64)
}

/// Decode -> encode -> write, then optionally delete the source.
///
/// The source is only removed once the WebP file has been persisted, and
/// never when the output path is the source itself.
pub fn convert_image(image: &ImageFile, quality: u8, delete_original: bool) -> Result<ConversionResult> {
    let (img, original_size) = load_image_with_metadata(&image.source_path)?;
    debug!(
        "Decoded {} ({}x{}, {})",
        image.source_path.display(),
        img.width(),
        img.height(),
        image.mime_type
    );

    let bytes = encode_webp(&img, quality)?;
    drop(img);

    let webp_size = write_output(&bytes, &image.output_path, Some(&image.source_path))?;

    let mut result = ConversionResult {
        original_size,
        webp_size,
        original_deleted: false,
        delete_error: None,
    };

    if delete_original {
        remove_original(image, &mut result);
    }

    Ok(result)
}

/// Deletes the source of an already written conversion. A failure is
/// recorded on `result` and leaves the WebP file in place.
pub(crate) fn remove_original(image: &ImageFile, result: &mut ConversionResult) {
    if is_same_file(&image.source_path, &image.output_path) {
        warn!(
            "Not deleting {}: it was overwritten by its own conversion",
            image.source_path.display()
        );
        return;
    }

    match fs::remove_file(&image.source_path) {
        Ok(()) => result.original_deleted = true,
        Err(e) => result.delete_error = Some(e.to_string()),
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// True when `bytes` starts with a RIFF/WEBP container header.
pub fn is_webp_container(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb, Rgba};
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, ((x + y) % 256) as u8])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn write_sample(path: &Path, format: ImageFormat) {
        gradient(64, 48).save_with_format(path, format).unwrap();
    }

    fn image_file(source: &Path, input: &Path, output: &Path) -> ImageFile {
        ImageFile::new(source, MimeType::new("image/png"), input, output).unwrap()
    }

    #[test]
    fn test_generate_output_path_mirrors_tree() {
        let out = generate_output_path(
            Path::new("/in/a/b/photo.JPG"),
            Path::new("/in"),
            Path::new("/out"),
        )
        .unwrap();
        assert_eq!(out, PathBuf::from("/out/a/b/photo.webp"));
    }

    #[test]
    fn test_generate_output_path_without_extension() {
        let out = generate_output_path(Path::new("/in/raw"), Path::new("/in"), Path::new("/out")).unwrap();
        assert_eq!(out, PathBuf::from("/out/raw.webp"));
    }

    #[test]
    fn test_generate_output_path_outside_input() {
        let result = generate_output_path(Path::new("/elsewhere/a.png"), Path::new("/in"), Path::new("/out"));
        assert!(matches!(result, Err(WebpifyError::OutsideInputDirectory(_, _))));
    }

    #[test]
    fn test_encode_webp_produces_container() {
        let bytes = encode_webp(&gradient(32, 32), 80).unwrap();
        assert!(is_webp_container(&bytes));
    }

    #[test]
    fn test_encode_webp_with_alpha() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(16, 16, Rgba([1, 2, 3, 128])));
        let bytes = encode_webp(&img, 50).unwrap();
        assert!(is_webp_container(&bytes));
    }

    #[test]
    fn test_encode_webp_quality_trend() {
        let img = gradient(256, 256);
        let low = encode_webp(&img, 10).unwrap();
        let high = encode_webp(&img, 95).unwrap();
        assert!(high.len() >= low.len());
    }

    #[test]
    fn test_encode_webp_is_deterministic() {
        let img = gradient(64, 64);
        assert_eq!(encode_webp(&img, 75).unwrap(), encode_webp(&img, 75).unwrap());
    }

    #[test]
    fn test_convert_image_writes_mirrored_output() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::create_dir(input.path().join("nested")).unwrap();
        let source = input.path().join("nested/pic.png");
        write_sample(&source, ImageFormat::Png);

        let file = image_file(&source, input.path(), output.path());
        let result = convert_image(&file, 80, false).unwrap();

        let written = output.path().join("nested/pic.webp");
        assert_eq!(file.output_path, written);
        assert!(is_webp_container(&fs::read(&written).unwrap()));
        assert_eq!(result.webp_size, fs::metadata(&written).unwrap().len());
        assert!(!result.original_deleted);
        assert!(source.exists());
    }

    #[test]
    fn test_convert_image_deletes_after_write() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let source = input.path().join("pic.jpg");
        write_sample(&source, ImageFormat::Jpeg);

        let file = image_file(&source, input.path(), output.path());
        let result = convert_image(&file, 50, true).unwrap();

        assert!(result.original_deleted);
        assert!(!source.exists());
        assert!(output.path().join("pic.webp").exists());
    }

    #[test]
    fn test_convert_image_failure_keeps_original() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let source = input.path().join("broken.png");
        fs::write(&source, b"\x89PNG\r\n\x1a\ntruncated").unwrap();

        let file = image_file(&source, input.path(), output.path());
        assert!(convert_image(&file, 80, true).is_err());

        assert!(source.exists());
        assert!(!output.path().join("broken.webp").exists());
    }

    #[test]
    fn test_convert_image_overwrites_existing_output() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let source = input.path().join("pic.png");
        write_sample(&source, ImageFormat::Png);
        fs::write(output.path().join("pic.webp"), b"stale").unwrap();

        let file = image_file(&source, input.path(), output.path());
        convert_image(&file, 80, false).unwrap();

        assert!(is_webp_container(&fs::read(output.path().join("pic.webp")).unwrap()));
    }

    #[test]
    fn test_convert_image_never_deletes_its_own_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("pic.webp");
        fs::write(&source, encode_webp(&gradient(16, 16), 90).unwrap()).unwrap();

        let file = ImageFile::new(&source, MimeType::new("image/webp"), dir.path(), dir.path()).unwrap();
        let result = convert_image(&file, 60, true).unwrap();

        assert!(!result.original_deleted);
        assert!(source.exists());
    }

    #[test]
    fn test_write_output_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("sub/out.webp");

        write_output(b"RIFF\0\0\0\0WEBP", &target, None).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path().join("sub")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_is_webp_container() {
        assert!(is_webp_container(b"RIFF\x10\x00\x00\x00WEBPVP8 "));
        assert!(!is_webp_container(b"RIFF\x10\x00\x00\x00WAVE"));
        assert!(!is_webp_container(b"short"));
    }

    #[test]
    fn test_load_image_with_metadata_not_found() {
        let result = load_image_with_metadata(Path::new("nonexistent.jpg"));
        assert!(matches!(result, Err(WebpifyError::Io(_))));
    }

    #[test]
    fn test_remove_original_records_failure() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let file = image_file(&input.path().join("vanished.png"), input.path(), output.path());
        let mut result = ConversionResult {
            original_size: 10,
            webp_size: 4,
            original_deleted: false,
            delete_error: None,
        };

        remove_original(&file, &mut result);

        assert!(!result.original_deleted);
        assert!(result.delete_error.is_some());
    }

    #[test]
    fn test_output_claims_reject_second_source() {
        let input = Path::new("/in");
        let output = Path::new("/out");
        let jpg = image_file(Path::new("/in/a.jpg"), input, output);
        let png = image_file(Path::new("/in/a.png"), input, output);
        let claims = OutputClaims::new();

        assert!(claims.claim(&jpg).is_ok());
        assert!(claims.claim(&jpg).is_ok());
        match claims.claim(&png) {
            Err(WebpifyError::OutputCollision(path, owner)) => {
                assert_eq!(path, PathBuf::from("/out/a.webp"));
                assert_eq!(owner, PathBuf::from("/in/a.jpg"));
            }
            other => panic!("unexpected claim result: {:?}", other),
        }
        assert!(claims.claim(&image_file(Path::new("/in/b.png"), input, output)).is_ok());
    }
}
