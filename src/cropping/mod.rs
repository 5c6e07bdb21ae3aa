//! Geometric preprocessing of images together with their camera matrix.
//!
//! Every operation here returns the transformed images and the intrinsics
//! that describe them, so a 3-D point keeps projecting onto the same scene
//! content after cropping and rescaling.
mod image_list;
mod ops;
mod view;

pub use image_list::ImageList;
pub use ops::{
    crop_image, crop_image_depthmap, rescale_image, rescale_image_depthmap, RescalePlan,
};
pub use view::{prepare_view, PrepareOptions, PreparedView, View};
