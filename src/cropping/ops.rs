//! Crop and rescale operations that keep images and intrinsics in sync.
use super::ImageList;
use crate::camera::{camera_matrix_of_crop, CropBox, CropOffset, Intrinsics, Resolution};
use crate::error::{Error, Result};
use crate::image::{resize_nearest, ImageF32};
use image::imageops::FilterType;
use log::debug;

/// Added to the scale factor so `floor(size * scale)` never lands one pixel
/// short of the target because of rounding.
const SCALE_EPS: f64 = 1e-8;

/// Scale factor and output size chosen by [`rescale_image`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RescalePlan {
    pub input: Resolution,
    pub output: Resolution,
    pub scale: f64,
}

impl RescalePlan {
    /// Smallest uniform scale for which `input` covers `target` on both axes.
    pub fn covering(input: Resolution, target: Resolution) -> Result<Self> {
        if target.width == 0 || target.height == 0 {
            return Err(Error::InvalidResolution(target.width, target.height));
        }
        if input.width == 0 || input.height == 0 {
            return Err(Error::InvalidResolution(input.width, input.height));
        }
        let sx = target.width as f64 / input.width as f64;
        let sy = target.height as f64 / input.height as f64;
        let scale = sx.max(sy) + SCALE_EPS;
        let output = Resolution::new(
            (input.width as f64 * scale).floor() as u32,
            (input.height as f64 * scale).floor() as u32,
        );
        Ok(Self {
            input,
            output,
            scale,
        })
    }

    fn intrinsics(&self, k: &Intrinsics) -> Result<Intrinsics> {
        camera_matrix_of_crop(
            k,
            self.input,
            self.output,
            self.scale,
            CropOffset::default(),
        )
    }
}

/// Crop all images to `bbox` and move the principal point accordingly.
pub fn crop_image(
    images: impl Into<ImageList>,
    k: &Intrinsics,
    bbox: CropBox,
) -> Result<(ImageList, Intrinsics)> {
    let images = images.into();
    images.size()?;
    let cropped = images.crop(bbox)?;
    debug!("crop_image bbox={bbox:?}");
    Ok((cropped, k.shifted(-bbox.left as f64, -bbox.top as f64)))
}

/// Jointly crop images and an optional depth map.
pub fn crop_image_depthmap(
    images: impl Into<ImageList>,
    depth: Option<&ImageF32>,
    k: &Intrinsics,
    bbox: CropBox,
) -> Result<(ImageList, Option<ImageF32>, Intrinsics)> {
    let images = images.into();
    let (w, h) = images.size()?;
    if let Some(depth) = depth {
        check_depth_shape(depth, w, h)?;
    }
    let (cropped, k) = crop_image(images, k, bbox)?;
    let depth = depth.map(|d| d.crop_padded(bbox)).transpose()?;
    Ok((cropped, depth, k))
}

/// Rescale images so that the result covers `target` on both axes.
///
/// The aspect ratio is preserved; resampling uses Lanczos3. The intrinsics
/// follow the same scale with no crop offset beyond the sub-pixel remainder
/// of the floor.
pub fn rescale_image(
    images: impl Into<ImageList>,
    k: &Intrinsics,
    target: Resolution,
) -> Result<(ImageList, Intrinsics)> {
    let (images, _, k) = rescale_image_depthmap(images, None, k, target)?;
    Ok((images, k))
}

/// Jointly rescale images and an optional depth map (nearest-neighbour).
pub fn rescale_image_depthmap(
    images: impl Into<ImageList>,
    depth: Option<&ImageF32>,
    k: &Intrinsics,
    target: Resolution,
) -> Result<(ImageList, Option<ImageF32>, Intrinsics)> {
    let images = images.into();
    let (w, h) = images.size()?;
    if let Some(depth) = depth {
        check_depth_shape(depth, w, h)?;
    }
    let plan = RescalePlan::covering(Resolution::new(w, h), target)?;
    debug!(
        "rescale {}x{} -> {}x{} (scale={:.6})",
        w, h, plan.output.width, plan.output.height, plan.scale
    );

    let resized = images.resize(plan.output.width, plan.output.height, FilterType::Lanczos3);
    let depth = depth.map(|d| {
        resize_nearest(d, plan.output.width as usize, plan.output.height as usize)
    });
    let k = plan.intrinsics(k)?;
    Ok((resized, depth, k))
}

fn check_depth_shape(depth: &ImageF32, w: u32, h: u32) -> Result<()> {
    if depth.w != w as usize || depth.h != h as usize {
        return Err(Error::DepthShapeMismatch {
            depth_w: depth.w,
            depth_h: depth.h,
            image_w: w,
            image_h: h,
        });
    }
    Ok(())
}
