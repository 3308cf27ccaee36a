use anyhow::Result;
use bbox::RectNum;
use image::{Rgb, RgbImage};
use std::{fs, path::Path};
use vision_datasets::{
    config::{DatasetConfig, DatasetKind},
    dataset::{
        Dataset, GenericDataset, LabeledDataset, RandomAccessDataset, VocDetectionDatasetInit,
        VocSplit,
    },
    error_kind, DatasetError,
};

struct Object<'a> {
    name: &'a str,
    difficult: bool,
    bndbox: [i32; 4],
}

fn annotation_xml(filename: &str, objects: &[Object]) -> String {
    let objects: String = objects
        .iter()
        .map(|obj| {
            let [xmin, ymin, xmax, ymax] = obj.bndbox;
            format!(
                r#"
    <object>
        <name>{}</name>
        <pose>Unspecified</pose>
        <truncated>0</truncated>
        <difficult>{}</difficult>
        <bndbox>
            <xmin>{}</xmin>
            <ymin>{}</ymin>
            <xmax>{}</xmax>
            <ymax>{}</ymax>
        </bndbox>
    </object>"#,
                obj.name, obj.difficult as u8, xmin, ymin, xmax, ymax
            )
        })
        .collect();

    format!(
        r#"<annotation>
    <folder>VOC2012</folder>
    <filename>{}</filename>
    <size>
        <width>4</width>
        <height>3</height>
        <depth>3</depth>
    </size>{}
</annotation>
"#,
        filename, objects
    )
}

/// Build a VOC tree with images `a`, `b` (train) and `c` (val).
fn create_voc_tree(dir: &Path) -> Result<()> {
    let annotation_dir = dir.join("Annotations");
    let image_dir = dir.join("JPEGImages");
    let split_dir = dir.join("ImageSets").join("Main");
    fs::create_dir_all(&annotation_dir)?;
    fs::create_dir_all(&image_dir)?;
    fs::create_dir_all(&split_dir)?;

    let annotations = [
        (
            "a",
            vec![
                Object {
                    name: "aeroplane",
                    difficult: false,
                    bndbox: [1, 1, 101, 101],
                },
                Object {
                    name: "person",
                    difficult: true,
                    bndbox: [2, 1, 4, 3],
                },
            ],
        ),
        (
            "b",
            vec![Object {
                name: "dog",
                difficult: false,
                bndbox: [1, 2, 4, 3],
            }],
        ),
        (
            "c",
            vec![Object {
                name: "cat",
                difficult: false,
                bndbox: [1, 1, 2, 2],
            }],
        ),
    ];

    for (id, objects) in &annotations {
        let filename = format!("{}.png", id);
        fs::write(
            annotation_dir.join(format!("{}.xml", id)),
            annotation_xml(&filename, objects),
        )?;
        RgbImage::from_fn(4, 3, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 200]))
            .save(image_dir.join(&filename))?;
    }

    fs::write(split_dir.join("train.txt"), "a\nb\n")?;
    fs::write(split_dir.join("val.txt"), "c\n")?;
    fs::write(split_dir.join("trainval.txt"), "a\nb\nc\n")?;
    Ok(())
}

fn kind_of<T>(result: Result<T>) -> DatasetError {
    let err = match result {
        Ok(_) => panic!("expect an error"),
        Err(err) => err,
    };
    error_kind(&err)
        .cloned()
        .unwrap_or_else(|| panic!("unexpected error: {:#}", err))
}

#[test]
fn voc_split_lengths() -> Result<()> {
    let dir = tempfile::tempdir()?;
    create_voc_tree(dir.path())?;

    for (split, num_lines) in [
        (VocSplit::Train, 2),
        (VocSplit::Val, 1),
        (VocSplit::TrainVal, 3),
    ] {
        let dataset = VocDetectionDatasetInit::new(dir.path(), split).load()?;
        assert_eq!(dataset.num_ids(), num_lines);
    }

    let dataset = VocDetectionDatasetInit::new(dir.path(), VocSplit::Train).load()?;
    assert_eq!(dataset.ids(), ["a", "b"]);
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.input_channels(), 3);
    assert_eq!(dataset.labels().len(), 20);

    Ok(())
}

#[test]
fn voc_difficult_objects() -> Result<()> {
    let dir = tempfile::tempdir()?;
    create_voc_tree(dir.path())?;

    let without = VocDetectionDatasetInit::new(dir.path(), VocSplit::TrainVal).load()?;
    let with = VocDetectionDatasetInit {
        use_difficult: true,
        ..VocDetectionDatasetInit::new(dir.path(), VocSplit::TrainVal)
    }
    .load()?;

    assert!(without.len() <= with.len());
    assert_eq!(without.len(), 3);
    assert_eq!(with.len(), 4);
    assert!(without.objects().iter().all(|obj| !obj.is_difficult()));

    // objects of one image are consecutive
    let names: Vec<_> = with.objects().iter().map(|obj| obj.name.as_str()).collect();
    assert_eq!(names, ["aeroplane", "person", "dog", "cat"]);

    for obj in with.objects() {
        let [ymin, xmin, ymax, xmax] = obj.bbox.tlbr();
        assert!(0.0 <= xmin && xmin < xmax);
        assert!(0.0 <= ymin && ymin < ymax);
    }

    Ok(())
}

#[test]
fn voc_get_example() -> Result<()> {
    let dir = tempfile::tempdir()?;
    create_voc_tree(dir.path())?;
    let dataset = VocDetectionDatasetInit::new(dir.path(), VocSplit::Train).load()?;

    let example = dataset.get(0)?;
    assert_eq!(example.label.to_vec(), vec![0.0, 0.0, 100.0, 100.0, 0.0]);
    assert_eq!(example.image.dim(), (3, 3, 4));
    // BGR, channel first
    assert_eq!(example.image[[0, 1, 3]], 200.0);
    assert_eq!(example.image[[1, 2, 0]], 20.0);
    assert_eq!(example.image[[2, 1, 3]], 30.0);

    let example = dataset.get(1)?;
    assert_eq!(example.label.to_vec(), vec![0.0, 1.0, 3.0, 2.0, 11.0]);

    let raw = dataset.get_raw_data(1)?;
    assert_eq!(raw.label, example.label);
    assert_eq!(raw.image.dim(), (3, 4, 3));
    // RGB, channel last
    assert_eq!(raw.image[[2, 1, 0]], 10);
    assert_eq!(raw.image[[2, 1, 1]], 20);
    assert_eq!(raw.image[[2, 1, 2]], 200);

    let rgb = VocDetectionDatasetInit {
        bgr: false,
        ..VocDetectionDatasetInit::new(dir.path(), VocSplit::Train)
    }
    .load()?;
    assert_eq!(rgb.get(0)?.image[[0, 1, 3]], 30.0);

    Ok(())
}

#[test]
fn voc_index_out_of_range() -> Result<()> {
    let dir = tempfile::tempdir()?;
    create_voc_tree(dir.path())?;
    let dataset = VocDetectionDatasetInit::new(dir.path(), VocSplit::Train).load()?;

    assert_eq!(
        kind_of(dataset.get(2)),
        DatasetError::Index { index: 2, len: 2 }
    );
    assert!(matches!(
        kind_of(dataset.get_raw_data(5)),
        DatasetError::Index { .. }
    ));
    Ok(())
}

#[test]
fn voc_unknown_label() -> Result<()> {
    let dir = tempfile::tempdir()?;
    create_voc_tree(dir.path())?;
    let dataset = VocDetectionDatasetInit {
        labels: label::LabelSet::new(["aeroplane", "person"])?,
        ..VocDetectionDatasetInit::new(dir.path(), VocSplit::Train)
    }
    .load()?;

    assert_eq!(dataset.get(0)?.label[4], 0.0);
    assert!(matches!(kind_of(dataset.get(1)), DatasetError::Lookup(_)));
    Ok(())
}

#[test]
fn voc_invalid_inputs() -> Result<()> {
    assert!(matches!(
        "bogus".parse::<VocSplit>(),
        Err(DatasetError::InvalidArgument(_))
    ));

    let dir = tempfile::tempdir()?;
    assert!(matches!(
        kind_of(VocDetectionDatasetInit::new(dir.path(), VocSplit::Train).load()),
        DatasetError::NotFound(_)
    ));

    create_voc_tree(dir.path())?;
    fs::remove_file(dir.path().join("JPEGImages").join("b.png"))?;
    assert!(matches!(
        kind_of(VocDetectionDatasetInit::new(dir.path(), VocSplit::Train).load()),
        DatasetError::NotFound(_)
    ));
    // images outside the split are not required
    VocDetectionDatasetInit::new(dir.path(), VocSplit::Val).load()?;

    fs::write(
        dir.path().join("Annotations").join("c.xml"),
        "<annotation><filename>c.png</filename><object><name>cat",
    )?;
    assert!(matches!(
        kind_of(VocDetectionDatasetInit::new(dir.path(), VocSplit::Val).load()),
        DatasetError::Parse { .. }
    ));

    Ok(())
}

#[test]
fn voc_from_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    create_voc_tree(dir.path())?;
    let classes_file = dir.path().join("classes.txt");
    fs::write(&classes_file, "cat\ndog\naeroplane\nperson\n")?;

    let config = DatasetConfig {
        kind: DatasetKind::Voc {
            dataset_dir: dir.path().to_owned(),
            split: VocSplit::TrainVal,
            use_difficult: false,
            bgr: true,
            classes_file: Some(classes_file),
        },
    };

    let dataset = match Dataset::load(&config)? {
        Dataset::Voc(dataset) => dataset,
        _ => panic!("expect VOC dataset"),
    };
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.get(0)?.label[4], 2.0);
    assert_eq!(dataset.get(2)?.label[4], 0.0);
    Ok(())
}

#[test]
fn voc_root_with_glob_characters() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path().join("VOC[2012]");
    create_voc_tree(&root)?;

    let dataset = VocDetectionDatasetInit::new(&root, VocSplit::Train).load()?;
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.get(1)?.label[4], 11.0);
    Ok(())
}
