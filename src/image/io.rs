//! I/O helpers for colour images, 16-bit depth maps and JSON.
//!
//! - `load_image` / `save_image`: any format supported by the `image` crate.
//! - `load_depth_png` / `save_depth_png`: 16-bit grayscale PNG with a metric
//!   scale (stored value × scale = depth); 0 marks missing depth.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageF32, ImageView};
use crate::error::{Error, Result};
use image::{DynamicImage, ImageBuffer, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk, keeping its native colour type.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Save an image, inferring the format from the file extension.
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    image.save(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a 16-bit grayscale depth PNG and convert it to metric depth.
pub fn load_depth_png(path: &Path, scale: f32) -> Result<ImageF32> {
    let raw = load_image(path)?.into_luma16();
    let (w, h) = (raw.width() as usize, raw.height() as usize);
    let data = raw.into_raw().into_iter().map(|v| v as f32 * scale).collect();
    ImageF32::from_vec(w, h, data)
}

/// Store metric depth as a 16-bit grayscale PNG, clamping to the u16 range.
pub fn save_depth_png(depth: &ImageF32, path: &Path, scale: f32) -> Result<()> {
    let inv = if scale > 0.0 { 1.0 / scale } else { 0.0 };
    let mut data = Vec::with_capacity(depth.w * depth.h);
    for row in depth.rows() {
        data.extend(row.iter().map(|&d| {
            if d.is_finite() {
                (d * inv).round().clamp(0.0, u16::MAX as f32) as u16
            } else {
                0
            }
        }));
    }
    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(depth.w as u32, depth.h as u32, data).ok_or(
            Error::RowCountMismatch {
                indices: depth.w * depth.h,
                rows: depth.data.len(),
            },
        )?;
    save_image(&DynamicImage::ImageLuma16(buffer), path)
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_png_round_trip_keeps_millimetres() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("depth.png");
        let depth = ImageF32::from_fn(4, 3, |x, y| 0.001 * (100 * y + x) as f32);
        save_depth_png(&depth, &path, 0.001).unwrap();
        let back = load_depth_png(&path, 0.001).unwrap();
        assert_eq!((back.w, back.h), (4, 3));
        for (a, b) in depth.data.iter().zip(&back.data) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn missing_image_reports_path() {
        let err = load_image(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }
}
