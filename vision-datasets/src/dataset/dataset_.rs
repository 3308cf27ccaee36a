use crate::common::*;

/// The generic dataset trait.
///
/// Datasets are immutable after loading and can be shared across threads.
pub trait GenericDataset
where
    Self: Debug + Send + Sync,
{
    /// The number of color channels of the dataset.
    fn input_channels(&self) -> usize;

    /// The number of addressable examples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The dataset that can be random accessed.
pub trait RandomAccessDataset
where
    Self: GenericDataset,
{
    /// The preprocessed example type.
    type Example;
    /// The example type without color or layout conversion.
    type RawExample;

    /// Get the nth example in the dataset.
    fn get(&self, index: usize) -> Result<Self::Example>;

    /// Get the nth example in the dataset as it is stored on disk.
    fn get_raw_data(&self, index: usize) -> Result<Self::RawExample>;
}

/// The dataset with a category vocabulary.
pub trait LabeledDataset
where
    Self: GenericDataset,
{
    fn labels(&self) -> &LabelSet;
}
