use super::*;
use crate::{
    common::*,
    error::DatasetError,
    processor::{crop_hwc, load_rgb_image, to_chw},
};

/// The partitions of the CUB-200-2011 keypoint dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CubMode {
    Train,
    Test,
}

impl CubMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

impl FromStr for CubMode {
    type Err = DatasetError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "train" => Ok(Self::Train),
            "test" => Ok(Self::Test),
            _ => Err(DatasetError::invalid_argument(format!(
                "invalid mode '{}', expect 'train' or 'test'",
                text
            ))),
        }
    }
}

impl TryFrom<String> for CubMode {
    type Error = DatasetError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<CubMode> for String {
    fn from(mode: CubMode) -> Self {
        mode.as_str().to_owned()
    }
}

impl Display for CubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options to load a [CubKeypointDataset].
#[derive(Debug, Clone)]
pub struct CubKeypointDatasetInit {
    pub dataset_dir: PathBuf,
    pub mode: CubMode,
    /// Crop images to the bird bounding box.
    pub crop_bbox: bool,
    /// Produce images in BGR channel order.
    pub bgr: bool,
    /// The list of 1-indexed test image ids.
    pub test_ids_file: PathBuf,
}

impl CubKeypointDatasetInit {
    pub fn new(
        dataset_dir: impl AsRef<Path>,
        mode: CubMode,
        test_ids_file: impl AsRef<Path>,
    ) -> Self {
        Self {
            dataset_dir: dataset_dir.as_ref().to_owned(),
            mode,
            crop_bbox: true,
            bgr: true,
            test_ids_file: test_ids_file.as_ref().to_owned(),
        }
    }

    pub fn load(self) -> Result<CubKeypointDataset> {
        let Self {
            dataset_dir,
            mode,
            crop_bbox,
            bgr,
            test_ids_file,
        } = self;

        let file_names = load_image_list(dataset_dir.join("images.txt"))?;
        let num_images = file_names.len();

        let bboxes = load_bboxes(dataset_dir.join("bounding_boxes.txt"), num_images)?;
        let keypoints = load_part_locations(
            dataset_dir.join("parts").join("part_locs.txt"),
            num_images,
        )?;

        let image_dir = dataset_dir.join("images");
        file_names
            .iter()
            .try_for_each(|file_name| ensure_file(image_dir.join(file_name)))?;

        let test_ids = load_test_ids(&test_ids_file, num_images)?;
        let selected_ids = match mode {
            CubMode::Train => {
                let test_ids: HashSet<_> = test_ids.into_iter().collect();
                (0..num_images).filter(|id| !test_ids.contains(id)).collect()
            }
            CubMode::Test => test_ids,
        };

        info!(
            "loaded {} of {} images from '{}' ({} mode)",
            selected_ids.len(),
            num_images,
            dataset_dir.display(),
            mode
        );

        Ok(CubKeypointDataset {
            dataset_dir,
            mode,
            crop_bbox,
            bgr,
            file_names,
            bboxes,
            keypoints,
            selected_ids,
        })
    }
}

/// The CUB-200-2011 bird keypoint dataset.
#[derive(Debug, Clone)]
pub struct CubKeypointDataset {
    dataset_dir: PathBuf,
    mode: CubMode,
    crop_bbox: bool,
    bgr: bool,
    /// Image paths relative to the image directory, indexed by 0-indexed image id.
    file_names: Vec<PathBuf>,
    bboxes: Vec<TLBR<f32>>,
    keypoints: Vec<KeypointRecord>,
    /// 0-indexed image ids of the selected partition.
    selected_ids: Vec<usize>,
}

impl CubKeypointDataset {
    pub fn mode(&self) -> CubMode {
        self.mode
    }

    /// The total number of images in both partitions.
    pub fn num_images(&self) -> usize {
        self.file_names.len()
    }

    /// 0-indexed image ids of the selected partition.
    pub fn selected_ids(&self) -> &[usize] {
        &self.selected_ids
    }

    /// The bounding box of the image referred by the partition-local index.
    pub fn bbox(&self, index: usize) -> Result<&TLBR<f32>, DatasetError> {
        check_index(index, self.selected_ids.len())?;
        Ok(&self.bboxes[self.selected_ids[index]])
    }

    fn load_raw(&self, index: usize) -> Result<(Array3<u8>, KeypointRecord)> {
        check_index(index, self.selected_ids.len())?;
        let image_id = self.selected_ids[index];

        let record = &self.keypoints[image_id];
        if record.is_empty() {
            return Err(DatasetError::Lookup(format!(
                "no keypoints are recorded for image {}",
                image_id + 1
            ))
            .into());
        }

        let image_file = self.dataset_dir.join("images").join(&self.file_names[image_id]);
        let image = load_rgb_image(&image_file)?;

        if self.crop_bbox {
            let bbox = &self.bboxes[image_id];
            let pixel_bbox: TLBR<usize> = bbox.try_cast().ok_or_else(|| {
                DatasetError::invalid_argument(format!(
                    "bounding box {:?} of image {} is not on the pixel grid",
                    bbox.tlbr(),
                    image_id + 1
                ))
            })?;
            let image = crop_hwc(&image, &pixel_bbox)
                .with_context(|| format!("failed to crop image {}", image_file.display()))?;
            let record = crop_keypoints(record, &pixel_bbox.cast());
            Ok((image, record))
        } else {
            Ok((image, record.clone()))
        }
    }
}

impl GenericDataset for CubKeypointDataset {
    fn input_channels(&self) -> usize {
        3
    }

    fn len(&self) -> usize {
        self.selected_ids.len()
    }
}

impl RandomAccessDataset for CubKeypointDataset {
    type Example = KeypointExample;
    type RawExample = RawKeypointExample;

    fn get(&self, index: usize) -> Result<KeypointExample> {
        let (image, record) = self.load_raw(index)?;
        Ok(KeypointExample {
            image: to_chw(&image, self.bgr),
            keypoints: record.to_array(),
            visible: record.visible,
        })
    }

    fn get_raw_data(&self, index: usize) -> Result<RawKeypointExample> {
        let (image, record) = self.load_raw(index)?;
        Ok(RawKeypointExample {
            image,
            keypoints: record.to_array(),
            visible: record.visible,
        })
    }
}

/// Translate keypoints into the local frame of a crop region.
pub fn crop_keypoints(record: &KeypointRecord, crop: &TLBR<f32>) -> KeypointRecord {
    let transform = Transform::to_local(crop);
    KeypointRecord {
        points: record
            .points
            .iter()
            .map(|&point| transform.apply_xy(point))
            .collect(),
        visible: record.visible.clone(),
    }
}

/// Split a whitespace-separated row into exactly `N` fields.
fn split_row<'a, const N: usize>(
    line: &'a str,
    line_no: usize,
    path: &Path,
) -> Result<[&'a str; N], DatasetError> {
    let fields: Vec<_> = line.split_whitespace().collect();
    <[&str; N]>::try_from(fields).map_err(|fields| {
        DatasetError::parse(
            path,
            format!(
                "line {}: expect {} fields, but found {}",
                line_no + 1,
                N,
                fields.len()
            ),
        )
    })
}

/// Convert a 1-indexed image id into a 0-indexed one.
fn image_index(
    text: &str,
    num_images: usize,
    line_no: usize,
    path: &Path,
) -> Result<usize, DatasetError> {
    let id: usize = parse_field(text, "image id", path)?;
    if !(1..=num_images).contains(&id) {
        return Err(DatasetError::parse(
            path,
            format!(
                "line {}: image id {} is out of range 1..={}",
                line_no + 1,
                id,
                num_images
            ),
        ));
    }
    Ok(id - 1)
}

/// Load `images.txt`, where image ids must run from 1 to N in order.
pub fn load_image_list(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let content = read_to_string(path)?;

    let file_names: Vec<_> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .enumerate()
        .map(|(index, (line_no, line))| -> Result<_, DatasetError> {
            let [id, file_name] = split_row::<2>(line, line_no, path)?;
            let id: usize = parse_field(id, "image id", path)?;
            if id != index + 1 {
                return Err(DatasetError::parse(
                    path,
                    format!(
                        "line {}: expect image id {}, but found {}",
                        line_no + 1,
                        index + 1,
                        id
                    ),
                ));
            }
            Ok(PathBuf::from(file_name))
        })
        .try_collect()?;

    Ok(file_names)
}

/// Load `bounding_boxes.txt` with one `(x, y, width, height)` row per image.
pub fn load_bboxes(path: impl AsRef<Path>, num_images: usize) -> Result<Vec<TLBR<f32>>> {
    let path = path.as_ref();
    let content = read_to_string(path)?;

    let mut bboxes = vec![None; num_images];

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let [id, x, y, w, h] = split_row::<5>(line, line_no, path)?;
        let index = image_index(id, num_images, line_no, path)?;
        let x: f32 = parse_field(x, "x", path)?;
        let y: f32 = parse_field(y, "y", path)?;
        let w: f32 = parse_field(w, "width", path)?;
        let h: f32 = parse_field(h, "height", path)?;

        if x < 0.0 || y < 0.0 {
            return Err(DatasetError::parse(
                path,
                format!("line {}: bounding box origin must be non-negative", line_no + 1),
            )
            .into());
        }
        let bbox = TLBR::try_from_tlhw([y, x, h, w]).map_err(|err| {
            DatasetError::parse(path, format!("line {}: {}", line_no + 1, err))
        })?;
        bboxes[index] = Some(bbox);
    }

    let bboxes: Vec<_> = bboxes
        .into_iter()
        .enumerate()
        .map(|(index, bbox)| {
            bbox.ok_or_else(|| {
                DatasetError::parse(path, format!("missing bounding box of image {}", index + 1))
            })
        })
        .try_collect()?;

    Ok(bboxes)
}

/// Load `parts/part_locs.txt` and group keypoints by image, ordered by part id.
pub fn load_part_locations(
    path: impl AsRef<Path>,
    num_images: usize,
) -> Result<Vec<KeypointRecord>> {
    let path = path.as_ref();
    let content = read_to_string(path)?;

    let mut parts: Vec<Vec<(usize, [f32; 2], bool)>> = vec![vec![]; num_images];

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let [image_id, part_id, x, y, visible] = split_row::<5>(line, line_no, path)?;
        let index = image_index(image_id, num_images, line_no, path)?;
        let part_id: usize = parse_field(part_id, "part id", path)?;
        let x: f32 = parse_field(x, "x", path)?;
        let y: f32 = parse_field(y, "y", path)?;
        // visibility is written as an integer or a float depending on the release
        let visible: f32 = parse_field(visible, "visible", path)?;

        parts[index].push((part_id, [x, y], visible != 0.0));
    }

    let num_unlabeled = parts.iter().filter(|parts| parts.is_empty()).count();
    if num_unlabeled > 0 {
        warn!(
            "{} images have no keypoints in '{}'",
            num_unlabeled,
            path.display()
        );
    }

    let records = parts
        .into_iter()
        .map(|mut parts| {
            parts.sort_by_key(|&(part_id, _, _)| part_id);
            let (points, visible) = parts
                .into_iter()
                .map(|(_, point, visible)| (point, visible))
                .unzip();
            KeypointRecord { points, visible }
        })
        .collect();

    Ok(records)
}

/// Load the whitespace-separated, 1-indexed test image ids as 0-indexed ids.
pub fn load_test_ids(path: impl AsRef<Path>, num_images: usize) -> Result<Vec<usize>> {
    let path = path.as_ref();
    let content = read_to_string(path)?;

    let mut seen = HashSet::new();
    let ids: Vec<_> = content
        .split_whitespace()
        .map(|text| -> Result<_, DatasetError> {
            let id: usize = parse_field(text, "test image id", path)?;
            if !(1..=num_images).contains(&id) {
                return Err(DatasetError::invalid_argument(format!(
                    "test image id {} in '{}' is out of range 1..={}",
                    id,
                    path.display(),
                    num_images
                )));
            }
            Ok(id - 1)
        })
        .filter_ok(|id| seen.insert(*id))
        .try_collect()?;

    Ok(ids)
}
