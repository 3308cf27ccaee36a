use super::*;
use crate::{
    common::*,
    config::{DatasetConfig, DatasetKind},
};

/// A dataset built from [DatasetConfig].
///
/// The variants produce different example types, so match on the variant
/// to call [RandomAccessDataset::get].
#[derive(Debug, Clone)]
pub enum Dataset {
    Voc(VocDetectionDataset),
    CubKeypoint(CubKeypointDataset),
}

impl Dataset {
    pub fn load(config: &DatasetConfig) -> Result<Self> {
        let dataset = match &config.kind {
            DatasetKind::Voc {
                dataset_dir,
                split,
                use_difficult,
                bgr,
                classes_file,
            } => {
                let labels = match classes_file {
                    Some(classes_file) => load_classes_file(classes_file)?,
                    None => LabelSet::voc(),
                };
                let dataset = VocDetectionDatasetInit {
                    dataset_dir: dataset_dir.clone(),
                    split: *split,
                    use_difficult: *use_difficult,
                    bgr: *bgr,
                    labels,
                }
                .load()
                .with_context(|| {
                    format!("failed to load VOC dataset '{}'", dataset_dir.display())
                })?;
                Self::Voc(dataset)
            }
            DatasetKind::CubKeypoint {
                dataset_dir,
                mode,
                crop_bbox,
                bgr,
                test_ids_file,
            } => {
                let dataset = CubKeypointDatasetInit {
                    dataset_dir: dataset_dir.clone(),
                    mode: *mode,
                    crop_bbox: *crop_bbox,
                    bgr: *bgr,
                    test_ids_file: test_ids_file.clone(),
                }
                .load()
                .with_context(|| {
                    format!("failed to load CUB dataset '{}'", dataset_dir.display())
                })?;
                Self::CubKeypoint(dataset)
            }
        };
        Ok(dataset)
    }
}

impl GenericDataset for Dataset {
    fn input_channels(&self) -> usize {
        match self {
            Self::Voc(dataset) => dataset.input_channels(),
            Self::CubKeypoint(dataset) => dataset.input_channels(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Voc(dataset) => dataset.len(),
            Self::CubKeypoint(dataset) => dataset.len(),
        }
    }
}
