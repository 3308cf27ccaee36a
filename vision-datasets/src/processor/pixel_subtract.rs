use crate::{common::*, error::DatasetError};

/// Mean pixel values of the VGG ImageNet models, in BGR order.
pub const VGG_PIXEL_SUBTRACT_BGR: [f32; 3] = [103.939, 116.779, 123.68];

/// The value subtracted from every pixel of a CHW image.
///
/// It is written as a number, a list of channel values, or a nested
/// `[channel][row][col]` list. The `{v, dim, data}` form of ndarray is
/// accepted for per-pixel values as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::PixelValue", into = "raw::PixelValue")]
pub enum PixelValue {
    /// Subtracted from every element.
    Scalar(f32),
    /// One value per channel.
    PerChannel(Vec<f32>),
    /// A full array with the same shape as the image.
    PerPixel(Array3<f32>),
}

impl Default for PixelValue {
    fn default() -> Self {
        Self::PerChannel(VGG_PIXEL_SUBTRACT_BGR.to_vec())
    }
}

impl TryFrom<ArrayD<f32>> for PixelValue {
    type Error = DatasetError;

    fn try_from(array: ArrayD<f32>) -> Result<Self, Self::Error> {
        let value = match array.ndim() {
            0 => Self::Scalar(array.iter().copied().next().unwrap_or_default()),
            1 => Self::PerChannel(array.iter().copied().collect()),
            3 => Self::PerPixel(
                array
                    .into_dimensionality()
                    .map_err(DatasetError::invalid_argument)?,
            ),
            ndim => {
                return Err(DatasetError::invalid_argument(format!(
                    "only 0d, 1d or 3d arrays are accepted for pixel value, but got a {}d array",
                    ndim
                )))
            }
        };
        Ok(value)
    }
}

impl TryFrom<raw::PixelValue> for PixelValue {
    type Error = DatasetError;

    fn try_from(value: raw::PixelValue) -> Result<Self, Self::Error> {
        let value = match value {
            raw::PixelValue::Scalar(value) => Self::Scalar(value),
            raw::PixelValue::PerChannel(values) => Self::PerChannel(values),
            raw::PixelValue::Nested(values) => Self::PerPixel(nested_to_array(values)?),
            raw::PixelValue::Array(array) => Self::PerPixel(array),
        };
        Ok(value)
    }
}

impl From<PixelValue> for raw::PixelValue {
    fn from(value: PixelValue) -> Self {
        match value {
            PixelValue::Scalar(value) => Self::Scalar(value),
            PixelValue::PerChannel(values) => Self::PerChannel(values),
            PixelValue::PerPixel(array) => Self::Nested(
                array
                    .outer_iter()
                    .map(|channel| channel.outer_iter().map(|row| row.to_vec()).collect())
                    .collect(),
            ),
        }
    }
}

fn nested_to_array(values: Vec<Vec<Vec<f32>>>) -> Result<Array3<f32>, DatasetError> {
    let channels = values.len();
    let height = values.first().map(|rows| rows.len()).unwrap_or(0);
    let width = values
        .first()
        .and_then(|rows| rows.first())
        .map(|row| row.len())
        .unwrap_or(0);

    let is_ragged = values
        .iter()
        .any(|rows| rows.len() != height || rows.iter().any(|row| row.len() != width));
    if is_ragged {
        return Err(DatasetError::invalid_argument(
            "nested pixel value lists must have equal lengths on each level",
        ));
    }

    let data: Vec<f32> = values.into_iter().flatten().flatten().collect();
    Array3::from_shape_vec([channels, height, width], data).map_err(DatasetError::invalid_argument)
}

mod raw {
    use crate::common::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum PixelValue {
        Scalar(f32),
        PerChannel(Vec<f32>),
        Nested(Vec<Vec<Vec<f32>>>),
        Array(Array3<f32>),
    }
}

#[derive(Debug, Clone, Default)]
pub struct PixelSubtractInit {
    pub pixel_value: PixelValue,
}

impl PixelSubtractInit {
    pub fn build(self) -> PixelSubtract {
        let Self { pixel_value } = self;
        PixelSubtract { pixel_value }
    }
}

/// Subtracts a fixed pixel value from CHW images.
#[derive(Debug, Clone)]
pub struct PixelSubtract {
    pixel_value: PixelValue,
}

impl PixelSubtract {
    pub fn pixel_value(&self) -> &PixelValue {
        &self.pixel_value
    }

    pub fn forward(&self, image: &Array3<f32>) -> Result<Array3<f32>, DatasetError> {
        let (channels, _, _) = image.dim();

        let output = match &self.pixel_value {
            PixelValue::Scalar(value) => image - *value,
            PixelValue::PerChannel(values) => {
                if values.len() != channels {
                    return Err(DatasetError::invalid_argument(format!(
                        "expect {} channel values, but got {}",
                        channels,
                        values.len()
                    )));
                }
                let values = Array3::from_shape_fn([channels, 1, 1], |(channel, _, _)| {
                    values[channel]
                });
                image - &values
            }
            PixelValue::PerPixel(values) => {
                if values.dim() != image.dim() {
                    return Err(DatasetError::invalid_argument(format!(
                        "pixel value shape {:?} does not match image shape {:?}",
                        values.shape(),
                        image.shape()
                    )));
                }
                image - values
            }
        };

        Ok(output)
    }
}
