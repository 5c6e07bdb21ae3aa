use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array3;

/// Generates a simple high-contrast checkerboard image.
pub fn checkerboard_rgb(width: u32, height: u32, cell: u32) -> DynamicImage {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(cell > 0, "cell size must be positive");

    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let sum = x / cell + y / cell;
        let val = if sum & 1 == 0 { 32u8 } else { 220u8 };
        Rgb([val, val, val])
    }))
}

/// Dark image with a bright square of edge `2 * half + 1` centred on `(cx, cy)`.
pub fn bright_square(width: u32, height: u32, cx: u32, cy: u32, half: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let inside = x.abs_diff(cx) <= half && y.abs_diff(cy) <= half;
        let val = if inside { 255u8 } else { 0u8 };
        Rgb([val, val, val])
    }))
}

/// Intensity-weighted centroid of the red channel above `threshold`.
pub fn bright_centroid(image: &DynamicImage, threshold: u8) -> Option<[f64; 2]> {
    let rgb = image.to_rgb8();
    let (mut sx, mut sy, mut sw) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y, px) in rgb.enumerate_pixels() {
        if px[0] > threshold {
            let w = px[0] as f64;
            sx += w * x as f64;
            sy += w * y as f64;
            sw += w;
        }
    }
    (sw > 0.0).then(|| [sx / sw, sy / sw])
}

/// `[C, H, W]` image whose every pixel value encodes `(c, y, x)`.
pub fn coded_chw(c: usize, h: usize, w: usize) -> Array3<f32> {
    Array3::from_shape_fn((c, h, w), |(ch, y, x)| (ch * 10_000 + y * 100 + x) as f32)
}
