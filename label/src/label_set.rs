use indexmap::IndexSet;
use thiserror::Error;

/// The 20 object categories of Pascal VOC, in their canonical order.
pub const VOC_LABELS: [&str; 20] = [
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelSetError {
    #[error("duplicated label name '{0}'")]
    Duplicated(String),
    #[error("the label set is empty")]
    Empty,
    #[error("unknown label name '{0}'")]
    Unknown(String),
}

/// An ordered vocabulary of category names.
///
/// The label index of a name is its position in the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: IndexSet<String>,
}

impl LabelSet {
    pub fn new<I, S>(names: I) -> Result<Self, LabelSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = IndexSet::new();
        for name in names {
            let name = name.into();
            if set.contains(&name) {
                return Err(LabelSetError::Duplicated(name));
            }
            set.insert(name);
        }
        if set.is_empty() {
            return Err(LabelSetError::Empty);
        }
        Ok(Self { names: set })
    }

    /// The Pascal VOC vocabulary.
    pub fn voc() -> Self {
        Self {
            names: VOC_LABELS.iter().map(|name| name.to_string()).collect(),
        }
    }

    pub fn index_of(&self, name: &str) -> Result<usize, LabelSetError> {
        self.names
            .get_index_of(name)
            .ok_or_else(|| LabelSetError::Unknown(name.to_owned()))
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get_index(index).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::voc()
    }
}
