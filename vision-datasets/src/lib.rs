//! Dataset loaders for object detection and keypoint annotations.

mod common;
pub mod config;
pub mod dataset;
pub mod error;
pub mod processor;

pub use error::{error_kind, DatasetError};
