use crate::{common::*, error::DatasetError};

/// One annotated object instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    /// The image file name relative to the image directory.
    pub filename: String,
    pub name: String,
    pub pose: String,
    pub truncated: u8,
    pub difficult: u8,
    /// The 0-indexed bounding box in pixel units.
    pub bbox: TLBR<f32>,
}

impl ObjectRecord {
    pub fn is_difficult(&self) -> bool {
        self.difficult == 1
    }

    pub fn label(&self, labels: &LabelSet) -> Result<Label<TLBR<f32>, usize>, DatasetError> {
        let class = labels.index_of(&self.name)?;
        Ok(Label {
            rect: self.bbox,
            class,
        })
    }

    /// Build the `[xmin, ymin, xmax, ymax, label_index]` vector.
    pub fn label_vector(&self, labels: &LabelSet) -> Result<Array1<f32>, DatasetError> {
        let xyxyc = self.label(labels)?.to_xyxyc().ok_or_else(|| {
            DatasetError::Lookup(format!("label index of '{}' overflows", self.name))
        })?;
        Ok(Array1::from(xyxyc.to_vec()))
    }
}

/// The keypoints of one image ordered by part id.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointRecord {
    /// Keypoint locations in `[x, y]` order.
    pub points: Vec<[f32; 2]>,
    pub visible: Vec<bool>,
}

impl KeypointRecord {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Pack the locations into a `[K, 2]` array.
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn([self.points.len(), 2], |(index, axis)| {
            self.points[index][axis]
        })
    }
}

/// A detection example with a CHW image.
#[derive(Debug, Clone)]
pub struct DetectionExample {
    pub image: Array3<f32>,
    /// `[xmin, ymin, xmax, ymax, label_index]`
    pub label: Array1<f32>,
}

/// A detection example with the decoded RGB image in HWC layout.
#[derive(Debug, Clone)]
pub struct RawDetectionExample {
    pub image: Array3<u8>,
    pub label: Array1<f32>,
}

/// A keypoint example with a CHW image.
#[derive(Debug, Clone)]
pub struct KeypointExample {
    pub image: Array3<f32>,
    /// `[K, 2]` keypoint locations in `[x, y]` order.
    pub keypoints: Array2<f32>,
    pub visible: Vec<bool>,
}

/// A keypoint example with the RGB image in HWC layout.
#[derive(Debug, Clone)]
pub struct RawKeypointExample {
    pub image: Array3<u8>,
    pub keypoints: Array2<f32>,
    pub visible: Vec<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ObjectRecord {
        ObjectRecord {
            filename: "2007_000027.jpg".into(),
            name: "person".into(),
            pose: "unspecified".into(),
            truncated: 0,
            difficult: 0,
            bbox: TLBR::from_tlbr([100.0, 173.0, 350.0, 348.0]),
        }
    }

    #[test]
    fn object_label_vector() {
        let record = person();
        let label = record.label_vector(&LabelSet::voc()).unwrap();
        assert_eq!(label.to_vec(), vec![173.0, 100.0, 348.0, 350.0, 14.0]);
    }

    #[test]
    fn unknown_object_label() {
        let record = ObjectRecord {
            name: "unicorn".into(),
            ..person()
        };
        let err = record.label_vector(&LabelSet::voc()).unwrap_err();
        assert!(matches!(err, DatasetError::Lookup(_)));
    }

    #[test]
    fn keypoints_to_array() {
        let record = KeypointRecord {
            points: vec![[1.0, 2.0], [3.0, 4.0]],
            visible: vec![true, false],
        };
        let array = record.to_array();
        assert_eq!(array.dim(), (2, 2));
        assert_eq!(array[[1, 0]], 3.0);
        assert_eq!(array[[1, 1]], 4.0);
    }
}
