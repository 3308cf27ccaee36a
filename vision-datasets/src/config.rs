//! Dataset configuration format.

use crate::{
    common::*,
    dataset::{CubMode, VocSplit},
    processor::{PixelSubtract, PixelSubtractInit, PixelValue},
};

pub use dataset::*;

/// The main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub preprocessor: PreprocessorConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config = Self::from_json5(&text)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        Ok(config)
    }

    pub fn from_json5(text: &str) -> Result<Self> {
        let config = json5::from_str(text)?;
        Ok(config)
    }
}

mod dataset {
    use super::*;

    /// Dataset options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DatasetConfig {
        /// The dataset configuration.
        pub kind: DatasetKind,
    }

    /// Variants of dataset and options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type")]
    pub enum DatasetKind {
        /// PASCAL VOC detection dataset options.
        Voc {
            dataset_dir: PathBuf,
            split: VocSplit,
            #[serde(default)]
            use_difficult: bool,
            #[serde(default = "default_true")]
            bgr: bool,
            /// Class names file. The 20 VOC classes are used if not set.
            #[serde(default)]
            classes_file: Option<PathBuf>,
        },
        /// CUB-200-2011 keypoint dataset options.
        CubKeypoint {
            dataset_dir: PathBuf,
            mode: CubMode,
            #[serde(default = "default_true")]
            crop_bbox: bool,
            #[serde(default = "default_true")]
            bgr: bool,
            test_ids_file: PathBuf,
        },
    }

    fn default_true() -> bool {
        true
    }
}

/// Data preprocessing options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    /// The pixel value subtracted from images. Disabled if not set.
    #[serde(default)]
    pub pixel_subtract: Option<PixelValue>,
}

impl PreprocessorConfig {
    pub fn build(&self) -> Option<PixelSubtract> {
        let pixel_value = self.pixel_subtract.clone()?;
        Some(PixelSubtractInit { pixel_value }.build())
    }
}
