//! A set of images that must be transformed in lock-step.
//!
//! Colour frames, masks and other per-view rasters share one pixel grid with
//! the camera matrix; every geometric operation is therefore applied to the
//! whole set at once and the set refuses to mix sizes.
use crate::camera::CropBox;
use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug, Default)]
pub struct ImageList {
    images: Vec<DynamicImage>,
}

impl ImageList {
    pub fn new(images: Vec<DynamicImage>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DynamicImage> {
        self.images.iter()
    }

    /// Common `(width, height)` of all images.
    pub fn size(&self) -> Result<(u32, u32)> {
        let first = self.images.first().ok_or(Error::EmptyImageList)?;
        let expected = first.dimensions();
        for image in &self.images[1..] {
            let found = image.dimensions();
            if found != expected {
                return Err(Error::InconsistentSizes { expected, found });
            }
        }
        Ok(expected)
    }

    /// Resample every image to exactly `width x height`.
    pub fn resize(&self, width: u32, height: u32, filter: FilterType) -> Self {
        self.dispatch(|image| image.resize_exact(width, height, filter))
    }

    /// Cut `bbox` out of every image. Pixels outside the source are zero.
    pub fn crop(&self, bbox: CropBox) -> Result<Self> {
        bbox.validate()?;
        Ok(self.dispatch(|image| crop_padded(image, bbox)))
    }

    pub fn into_vec(self) -> Vec<DynamicImage> {
        self.images
    }

    /// The image when the list holds exactly one.
    pub fn into_single(self) -> Option<DynamicImage> {
        if self.images.len() == 1 {
            self.images.into_iter().next()
        } else {
            None
        }
    }

    #[cfg(feature = "parallel")]
    fn dispatch<F>(&self, op: F) -> Self
    where
        F: Fn(&DynamicImage) -> DynamicImage + Sync + Send,
    {
        Self::new(self.images.par_iter().map(op).collect())
    }

    #[cfg(not(feature = "parallel"))]
    fn dispatch<F>(&self, op: F) -> Self
    where
        F: Fn(&DynamicImage) -> DynamicImage,
    {
        Self::new(self.images.iter().map(op).collect())
    }
}

impl From<DynamicImage> for ImageList {
    fn from(image: DynamicImage) -> Self {
        Self::new(vec![image])
    }
}

impl From<Vec<DynamicImage>> for ImageList {
    fn from(images: Vec<DynamicImage>) -> Self {
        Self::new(images)
    }
}

impl IntoIterator for ImageList {
    type Item = DynamicImage;
    type IntoIter = std::vec::IntoIter<DynamicImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}

// Both paths keep the native pixel type; padding is the zero pixel.
fn crop_padded(image: &DynamicImage, bbox: CropBox) -> DynamicImage {
    let (w, h) = image.dimensions();
    if bbox.is_inside(w, h) {
        return image.crop_imm(
            bbox.left as u32,
            bbox.top as u32,
            bbox.width(),
            bbox.height(),
        );
    }
    match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(pad_buffer(buf, bbox)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(pad_buffer(buf, bbox)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(pad_buffer(buf, bbox)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(pad_buffer(buf, bbox)),
        DynamicImage::ImageLuma16(buf) => DynamicImage::ImageLuma16(pad_buffer(buf, bbox)),
        DynamicImage::ImageLumaA16(buf) => DynamicImage::ImageLumaA16(pad_buffer(buf, bbox)),
        DynamicImage::ImageRgb16(buf) => DynamicImage::ImageRgb16(pad_buffer(buf, bbox)),
        DynamicImage::ImageRgba16(buf) => DynamicImage::ImageRgba16(pad_buffer(buf, bbox)),
        DynamicImage::ImageRgb32F(buf) => DynamicImage::ImageRgb32F(pad_buffer(buf, bbox)),
        DynamicImage::ImageRgba32F(buf) => DynamicImage::ImageRgba32F(pad_buffer(buf, bbox)),
        other => DynamicImage::ImageRgba32F(pad_buffer(&other.to_rgba32f(), bbox)),
    }
}

fn pad_buffer<P: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    bbox: CropBox,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let mut out = ImageBuffer::new(bbox.width(), bbox.height());
    imageops::replace(&mut out, src, -(bbox.left as i64), -(bbox.top as i64));
    out
}
