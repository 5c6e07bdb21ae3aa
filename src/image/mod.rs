pub mod f32;
pub mod io;
pub mod resize;
pub mod traits;

pub use self::f32::ImageF32;
pub use self::resize::resize_nearest;
pub use self::traits::{ImageView, ImageViewMut, Rows};
