//! End-to-end view preparation: principal-point centring, orientation-aware
//! target selection, rescale and final crop.
use super::ops::{crop_image_depthmap, rescale_image_depthmap};
use super::ImageList;
use crate::camera::{
    bbox_from_intrinsics_in_out, camera_matrix_of_crop, CropBox, CropOffset, Intrinsics,
    Resolution,
};
use crate::error::Result;
use crate::image::ImageF32;
use crate::orientation::Orientation;
use log::debug;
use serde::{Deserialize, Serialize};

/// Knobs for [`prepare_view`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareOptions {
    /// Target resolution; transposed when the input clearly has the other
    /// orientation.
    pub resolution: Resolution,
    /// Inputs with `H > portrait_ratio * W` are portrait, inputs with
    /// `W > portrait_ratio * H` are landscape; anything in between keeps
    /// `resolution` as configured.
    pub portrait_ratio: f64,
    /// Where the final window sits inside the rescaled image (0.5 = centre).
    pub offset_factor: f64,
    /// Crop to the largest window centred on the principal point first.
    pub centre_principal_point: bool,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::new(512, 384),
            portrait_ratio: 1.1,
            offset_factor: 0.5,
            centre_principal_point: true,
        }
    }
}

impl PrepareOptions {
    /// Target resolution for an input of `width x height`.
    pub fn target_for(&self, width: u32, height: u32) -> Resolution {
        let res = self.resolution;
        let (w, h) = (width as f64, height as f64);
        let portrait_input = h > self.portrait_ratio * w;
        let landscape_input = w > self.portrait_ratio * h;
        if (portrait_input && res.width > res.height) || (landscape_input && res.height > res.width)
        {
            res.transposed()
        } else {
            res
        }
    }
}

/// One camera view: co-registered images, optional depth and intrinsics.
#[derive(Clone, Debug)]
pub struct View {
    pub images: ImageList,
    pub depth: Option<ImageF32>,
    pub intrinsics: Intrinsics,
}

impl View {
    pub fn new(images: impl Into<ImageList>, intrinsics: Intrinsics) -> Self {
        Self {
            images: images.into(),
            depth: None,
            intrinsics,
        }
    }

    pub fn with_depth(mut self, depth: ImageF32) -> Self {
        self.depth = Some(depth);
        self
    }
}

/// Result of [`prepare_view`].
#[derive(Clone, Debug)]
pub struct PreparedView {
    pub images: ImageList,
    pub depth: Option<ImageF32>,
    pub intrinsics: Intrinsics,
    pub resolution: Resolution,
    pub orientation: Orientation,
    /// Principal-point centring window in input pixels, if applied.
    pub centre_crop: Option<CropBox>,
    /// Final window in rescaled pixels.
    pub final_crop: CropBox,
    pub scale: f64,
}

/// Bring a view to exactly the configured resolution (or its transpose).
pub fn prepare_view(view: View, opts: &PrepareOptions) -> Result<PreparedView> {
    let View {
        mut images,
        mut depth,
        mut intrinsics,
    } = view;

    let mut centre_crop = None;
    if opts.centre_principal_point {
        let (w, h) = images.size()?;
        let bbox = principal_point_window(&intrinsics, w, h);
        debug!("prepare_view centre crop {bbox:?} of {w}x{h}");
        let (i, d, k) = crop_image_depthmap(images, depth.as_ref(), &intrinsics, bbox)?;
        images = i;
        depth = d;
        intrinsics = k;
        centre_crop = Some(bbox);
    }

    let (w, h) = images.size()?;
    let target = opts.target_for(w, h);
    let (images, depth, k_scaled) =
        rescale_image_depthmap(images, depth.as_ref(), &intrinsics, target)?;
    let (sw, sh) = images.size()?;
    let scale = sw as f64 / w as f64;

    let k_target = camera_matrix_of_crop(
        &k_scaled,
        Resolution::new(sw, sh),
        target,
        1.0,
        CropOffset::Factor(opts.offset_factor),
    )?;
    let final_crop = bbox_from_intrinsics_in_out(&k_scaled, &k_target, target);
    debug!("prepare_view final crop {final_crop:?} of {sw}x{sh} -> {target:?}");
    let (images, depth, intrinsics) =
        crop_image_depthmap(images, depth.as_ref(), &k_scaled, final_crop)?;

    Ok(PreparedView {
        images,
        depth,
        intrinsics,
        resolution: target,
        orientation: Orientation::of(target.width as usize, target.height as usize),
        centre_crop,
        final_crop,
        scale,
    })
}

/// Largest window of the image that is symmetric about the rounded principal point.
fn principal_point_window(k: &Intrinsics, width: u32, height: u32) -> CropBox {
    let [cx, cy] = k.principal_point();
    let cx = cx.round_ties_even() as i32;
    let cy = cy.round_ties_even() as i32;
    let mx = cx.min(width as i32 - cx);
    let my = cy.min(height as i32 - cy);
    CropBox::new(cx - mx, cy - my, cx + mx, cy + my)
}
