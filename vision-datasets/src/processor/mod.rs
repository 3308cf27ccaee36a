//! Image loading and pixel transforms.

mod image_ops;
mod pixel_subtract;

pub use image_ops::*;
pub use pixel_subtract::*;
