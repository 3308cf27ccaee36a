use super::*;
use crate::{
    common::*,
    error::DatasetError,
    processor::{load_rgb_image, to_chw},
};

/// The image sets of Pascal VOC detection annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VocSplit {
    Train,
    TrainVal,
    Val,
}

impl VocSplit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::TrainVal => "trainval",
            Self::Val => "val",
        }
    }
}

impl FromStr for VocSplit {
    type Err = DatasetError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let split = match text {
            "train" => Self::Train,
            "trainval" => Self::TrainVal,
            "val" => Self::Val,
            _ => {
                return Err(DatasetError::invalid_argument(format!(
                    "unknown split '{}', please pick one from 'train', 'trainval', 'val'",
                    text
                )))
            }
        };
        Ok(split)
    }
}

impl TryFrom<String> for VocSplit {
    type Error = DatasetError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<VocSplit> for String {
    fn from(split: VocSplit) -> Self {
        split.as_str().to_owned()
    }
}

impl Display for VocSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options to load a [VocDetectionDataset].
#[derive(Debug, Clone)]
pub struct VocDetectionDatasetInit {
    pub dataset_dir: PathBuf,
    pub split: VocSplit,
    /// Keep objects marked as difficult.
    pub use_difficult: bool,
    /// Produce images in BGR channel order.
    pub bgr: bool,
    pub labels: LabelSet,
}

impl VocDetectionDatasetInit {
    pub fn new(dataset_dir: impl AsRef<Path>, split: VocSplit) -> Self {
        Self {
            dataset_dir: dataset_dir.as_ref().to_owned(),
            split,
            use_difficult: false,
            bgr: true,
            labels: LabelSet::voc(),
        }
    }

    pub fn load(self) -> Result<VocDetectionDataset> {
        let Self {
            dataset_dir,
            split,
            use_difficult,
            bgr,
            labels,
        } = self;

        let id_list_file = dataset_dir
            .join("ImageSets")
            .join("Main")
            .join(format!("{}.txt", split));
        let ids = read_id_list(&id_list_file)?;

        let objects = collect_objects(&dataset_dir, &ids, use_difficult)?;
        info!(
            "loaded {} objects of {} images from '{}' ({} split)",
            objects.len(),
            ids.len(),
            dataset_dir.display(),
            split
        );

        Ok(VocDetectionDataset {
            dataset_dir,
            split,
            use_difficult,
            bgr,
            labels,
            ids,
            objects,
        })
    }
}

/// The Pascal VOC detection dataset.
///
/// Each example corresponds to one annotated object, so an image with N
/// objects contributes N consecutive examples.
#[derive(Debug, Clone)]
pub struct VocDetectionDataset {
    dataset_dir: PathBuf,
    split: VocSplit,
    use_difficult: bool,
    bgr: bool,
    labels: LabelSet,
    ids: Vec<String>,
    objects: Vec<ObjectRecord>,
}

impl VocDetectionDataset {
    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    pub fn split(&self) -> VocSplit {
        self.split
    }

    pub fn use_difficult(&self) -> bool {
        self.use_difficult
    }

    /// The image ids listed for the split.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The number of image ids listed for the split.
    pub fn num_ids(&self) -> usize {
        self.ids.len()
    }

    pub fn objects(&self) -> &[ObjectRecord] {
        &self.objects
    }

    fn image_path(&self, record: &ObjectRecord) -> PathBuf {
        self.dataset_dir.join("JPEGImages").join(&record.filename)
    }

    fn load_raw(&self, index: usize) -> Result<(Array3<u8>, Array1<f32>)> {
        check_index(index, self.objects.len())?;
        let record = &self.objects[index];
        let label = record.label_vector(&self.labels)?;
        let image = load_rgb_image(self.image_path(record))?;
        Ok((image, label))
    }
}

impl GenericDataset for VocDetectionDataset {
    fn input_channels(&self) -> usize {
        3
    }

    fn len(&self) -> usize {
        self.objects.len()
    }
}

impl LabeledDataset for VocDetectionDataset {
    fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

impl RandomAccessDataset for VocDetectionDataset {
    type Example = DetectionExample;
    type RawExample = RawDetectionExample;

    fn get(&self, index: usize) -> Result<DetectionExample> {
        let (image, label) = self.load_raw(index)?;
        let image = to_chw(&image, self.bgr);
        Ok(DetectionExample { image, label })
    }

    fn get_raw_data(&self, index: usize) -> Result<RawDetectionExample> {
        let (image, label) = self.load_raw(index)?;
        Ok(RawDetectionExample { image, label })
    }
}

/// Scan the annotation directory and keep the objects of listed images.
pub fn collect_objects(
    dataset_dir: impl AsRef<Path>,
    ids: &[String],
    use_difficult: bool,
) -> Result<Vec<ObjectRecord>> {
    let dataset_dir = dataset_dir.as_ref();
    let annotation_dir = dataset_dir.join("Annotations");
    let image_dir = dataset_dir.join("JPEGImages");
    ensure_dir(&annotation_dir)?;

    let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();

    // glob yields paths in sorted order
    let pattern = format!(
        "{}/*.xml",
        glob::Pattern::escape(&annotation_dir.display().to_string())
    );
    let xml_files: Vec<_> = glob::glob(&pattern)?.try_collect()?;

    let mut objects = vec![];
    let mut num_difficult = 0;
    let mut annotated_ids = HashSet::new();

    for annotation_file in &xml_files {
        let annotation = parse_annotation_file(annotation_file)?;
        let image_id = match ids.get(annotation.image_id()) {
            Some(&image_id) => image_id,
            None => continue,
        };
        annotated_ids.insert(image_id);

        let image_file = image_dir.join(&annotation.filename);
        ensure_file(&image_file).with_context(|| {
            format!(
                "the image file of annotation '{}' does not exist",
                annotation_file.display()
            )
        })?;

        let VocAnnotation {
            filename,
            objects: records,
        } = annotation;

        let num_objects = records.len();
        let records: Vec<_> = records
            .into_iter()
            .filter(|record| use_difficult || !record.is_difficult())
            .collect();
        if records.len() < num_objects {
            debug!(
                "skip {} difficult objects in '{}'",
                num_objects - records.len(),
                filename
            );
            num_difficult += num_objects - records.len();
        }

        objects.extend(records);
    }

    debug!(
        "scanned {} annotation files, skipped {} difficult objects",
        xml_files.len(),
        num_difficult
    );

    let num_missing = ids.len() - annotated_ids.len();
    if num_missing > 0 {
        warn!(
            "{} listed images have no annotation file in '{}'",
            num_missing,
            annotation_dir.display()
        );
    }
    if !ids.is_empty() && objects.is_empty() {
        warn!(
            "no objects are kept for {} listed images in '{}'",
            ids.len(),
            dataset_dir.display()
        );
    }

    Ok(objects)
}

/// The validated content of one annotation file.
#[derive(Debug, Clone, PartialEq)]
pub struct VocAnnotation {
    pub filename: String,
    pub objects: Vec<ObjectRecord>,
}

impl VocAnnotation {
    /// The image id, which is the file name without extension.
    pub fn image_id(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.filename)
    }
}

pub fn parse_annotation_file(path: impl AsRef<Path>) -> Result<VocAnnotation> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    let annotation = parse_annotation(&text, path)?;
    Ok(annotation)
}

/// Parse and validate the XML text of an annotation file.
///
/// A single malformed object rejects the whole file.
pub fn parse_annotation(text: &str, path: &Path) -> Result<VocAnnotation, DatasetError> {
    let xml: raw::Annotation =
        serde_xml_rs::from_str(text).map_err(|err| DatasetError::parse(path, err))?;

    let filename = xml.filename.trim().to_owned();
    if filename.is_empty() {
        return Err(DatasetError::parse(path, "empty filename element"));
    }

    let objects: Vec<_> = xml
        .object
        .iter()
        .map(|obj| {
            let raw::BndBox {
                xmin,
                ymin,
                xmax,
                ymax,
            } = &obj.bndbox;

            // raw coordinates are 1-indexed
            let to_pixel = |field: &str, text: &str| -> Result<f32, DatasetError> {
                let value: i32 = parse_field(text, field, path)?;
                let value = value.checked_sub(1).ok_or_else(|| {
                    DatasetError::parse(path, format!("{} value {} is out of range", field, value))
                })?;
                Ok(value as f32)
            };
            let xmin = to_pixel("xmin", xmin.as_str())?;
            let ymin = to_pixel("ymin", ymin.as_str())?;
            let xmax = to_pixel("xmax", xmax.as_str())?;
            let ymax = to_pixel("ymax", ymax.as_str())?;

            if xmin < 0.0 || ymin < 0.0 {
                return Err(DatasetError::parse(
                    path,
                    format!(
                        "bounding box origin ({}, {}) must be positive",
                        xmin + 1.0,
                        ymin + 1.0
                    ),
                ));
            }
            let bbox = TLBR::try_from_tlbr([ymin, xmin, ymax, xmax]).map_err(|_| {
                DatasetError::parse(
                    path,
                    format!(
                        "invalid bounding box (xmin={}, ymin={}, xmax={}, ymax={})",
                        xmin + 1.0,
                        ymin + 1.0,
                        xmax + 1.0,
                        ymax + 1.0
                    ),
                )
            })?;

            let truncated = match &obj.truncated {
                Some(text) => parse_field(text, "truncated", path)?,
                None => 0,
            };
            let difficult = match &obj.difficult {
                Some(text) => parse_field(text, "difficult", path)?,
                None => 0,
            };
            let pose = obj
                .pose
                .as_deref()
                .map(|pose| pose.trim().to_lowercase())
                .filter(|pose| !pose.is_empty())
                .unwrap_or_else(|| "unspecified".to_owned());

            Ok(ObjectRecord {
                filename: filename.clone(),
                name: obj.name.trim().to_lowercase(),
                pose,
                truncated,
                difficult,
                bbox,
            })
        })
        .try_collect()?;

    Ok(VocAnnotation { filename, objects })
}

mod raw {
    use crate::common::*;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Annotation {
        pub filename: String,
        #[serde(default)]
        pub object: Vec<Object>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Object {
        pub name: String,
        pub pose: Option<String>,
        pub truncated: Option<String>,
        pub difficult: Option<String>,
        pub bndbox: BndBox,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct BndBox {
        pub xmin: String,
        pub ymin: String,
        pub xmax: String,
        pub ymax: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANNOTATION: &str = r#"
<annotation>
    <folder>VOC2012</folder>
    <filename>2007_000032.jpg</filename>
    <size>
        <width>500</width>
        <height>281</height>
        <depth>3</depth>
    </size>
    <segmented>1</segmented>
    <object>
        <name>aeroplane</name>
        <pose>Frontal</pose>
        <truncated>0</truncated>
        <difficult>0</difficult>
        <bndbox>
            <xmin>1</xmin>
            <ymin>1</ymin>
            <xmax>101</xmax>
            <ymax>101</ymax>
        </bndbox>
    </object>
    <object>
        <name> Person </name>
        <pose>Rear</pose>
        <truncated>1</truncated>
        <difficult>1</difficult>
        <bndbox>
            <xmin>195</xmin>
            <ymin>180</ymin>
            <xmax>213</xmax>
            <ymax>229</ymax>
        </bndbox>
    </object>
</annotation>
"#;

    #[test]
    fn parse_voc_annotation() {
        let annotation = parse_annotation(ANNOTATION, Path::new("2007_000032.xml")).unwrap();
        assert_eq!(annotation.filename, "2007_000032.jpg");
        assert_eq!(annotation.image_id(), "2007_000032");
        assert_eq!(annotation.objects.len(), 2);

        let plane = &annotation.objects[0];
        assert_eq!(plane.name, "aeroplane");
        assert_eq!(plane.pose, "frontal");
        assert!(!plane.is_difficult());
        assert_eq!(plane.bbox.tlbr(), [0.0, 0.0, 100.0, 100.0]);

        let person = &annotation.objects[1];
        assert_eq!(person.name, "person");
        assert_eq!(person.truncated, 1);
        assert!(person.is_difficult());
        assert_eq!(person.bbox.tlbr(), [179.0, 194.0, 228.0, 212.0]);
    }

    #[test]
    fn reject_malformed_annotations() {
        let path = Path::new("bad.xml");

        let bad_number = ANNOTATION.replace("<xmax>101</xmax>", "<xmax>10x</xmax>");
        let err = parse_annotation(&bad_number, path).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));

        let inverted = ANNOTATION.replace("<xmax>101</xmax>", "<xmax>1</xmax>");
        assert!(matches!(
            parse_annotation(&inverted, path),
            Err(DatasetError::Parse { .. })
        ));

        let zero_origin = ANNOTATION.replace("<ymin>1</ymin>", "<ymin>0</ymin>");
        assert!(matches!(
            parse_annotation(&zero_origin, path),
            Err(DatasetError::Parse { .. })
        ));

        let underflow = ANNOTATION.replace("<xmin>1</xmin>", "<xmin>-2147483648</xmin>");
        assert!(matches!(
            parse_annotation(&underflow, path),
            Err(DatasetError::Parse { .. })
        ));

        assert!(matches!(
            parse_annotation("<annotation><filename>", path),
            Err(DatasetError::Parse { .. })
        ));
    }

    #[test]
    fn split_names() {
        assert_eq!("trainval".parse::<VocSplit>(), Ok(VocSplit::TrainVal));
        assert_eq!(VocSplit::Val.to_string(), "val");
        assert!(matches!(
            "bogus".parse::<VocSplit>(),
            Err(DatasetError::InvalidArgument(_))
        ));
    }
}
