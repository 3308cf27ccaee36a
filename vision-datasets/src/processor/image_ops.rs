use crate::{common::*, dataset::ensure_file, error::DatasetError};

/// Decode an image file into an RGB array in HWC layout.
pub fn load_rgb_image(path: impl AsRef<Path>) -> Result<Array3<u8>> {
    let path = path.as_ref();
    ensure_file(path)?;

    let image = image::io::Reader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| {
            format!(
                "failed to determine the image file format: {}",
                path.display()
            )
        })?
        .decode()
        .with_context(|| format!("failed to decode image file: {}", path.display()))?
        .to_rgb8();

    let (width, height) = image.dimensions();
    let array = Array3::from_shape_vec([height as usize, width as usize, 3], image.into_raw())?;
    Ok(array)
}

/// Convert an HWC array into a channel-first `f32` array.
///
/// The channel order is reversed if `bgr` is set.
pub fn to_chw(hwc: &Array3<u8>, bgr: bool) -> Array3<f32> {
    let (height, width, channels) = hwc.dim();
    Array3::from_shape_fn([channels, height, width], |(channel, row, col)| {
        let channel = if bgr { channels - 1 - channel } else { channel };
        hwc[[row, col, channel]] as f32
    })
}

/// Crop an HWC array to `rect`, clamping the region to the image boundary.
pub fn crop_hwc(hwc: &Array3<u8>, rect: &TLBR<usize>) -> Result<Array3<u8>, DatasetError> {
    let (height, width, _) = hwc.dim();
    let bound = HW::try_from_hw([height, width])
        .map_err(|_| DatasetError::invalid_argument("cannot crop an empty image"))?
        .to_rect();
    let [t, l, b, r] = rect
        .intersect_with(&bound)
        .ok_or_else(|| {
            DatasetError::invalid_argument(format!(
                "crop region {:?} lies outside the {}x{} image",
                rect.tlbr(),
                height,
                width
            ))
        })?
        .tlbr();
    Ok(hwc.slice(s![t..b, l..r, ..]).to_owned())
}
