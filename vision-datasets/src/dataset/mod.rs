//! Dataset processing toolkit.

mod cub;
mod dataset_;
mod loader;
mod record;
mod utils;
mod voc;

pub use cub::*;
pub use dataset_::*;
pub use loader::*;
pub use record::*;
pub use utils::*;
pub use voc::*;
