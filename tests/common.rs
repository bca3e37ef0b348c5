#![allow(dead_code)]

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn sample_image(width: u32, height: u32) -> DynamicImage {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x ^ y) & 0xff) as u8,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn write_image(path: &Path, format: ImageFormat) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    sample_image(48, 32).save_with_format(path, format).unwrap();
    path.to_path_buf()
}

/// `a.jpg`, `b.png`, `c.webp` and a text file in `dir`.
pub fn create_mixed_directory(dir: &Path) -> Vec<PathBuf> {
    let files = vec![
        write_image(&dir.join("a.jpg"), ImageFormat::Jpeg),
        write_image(&dir.join("b.png"), ImageFormat::Png),
        write_image(&dir.join("c.webp"), ImageFormat::WebP),
    ];

    File::create(dir.join("notes.txt"))
        .unwrap()
        .write_all(b"not an image")
        .unwrap();

    files
}

pub fn create_nested_directory_structure(dir: &Path) -> PathBuf {
    let subdir = dir.join("subdir");
    write_image(&subdir.join("nested.gif"), ImageFormat::Gif);
    write_image(&subdir.join("deeper").join("deep.png"), ImageFormat::Png);
    subdir
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

pub fn is_webp_file(path: &Path) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        Err(_) => false,
    }
}
