use crate::{common::*, error::DatasetError};

/// Load a class list with one name per line.
pub fn load_classes_file(path: impl AsRef<Path>) -> Result<LabelSet> {
    let path = path.as_ref();
    let content = read_to_string(path)?;
    let names: Vec<_> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let labels = LabelSet::new(names)
        .map_err(DatasetError::from)
        .with_context(|| format!("invalid classes file '{}'", path.display()))?;
    Ok(labels)
}

/// Read a newline-separated list of image ids.
pub fn read_id_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = read_to_string(path)?;
    let ids: Vec<_> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    Ok(ids)
}

/// Read a text file, reporting a missing file as [DatasetError::NotFound].
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    ensure_file(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    Ok(content)
}

pub fn ensure_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DatasetError::NotFound(path.to_owned()).into());
    }
    Ok(())
}

pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(DatasetError::NotFound(path.to_owned()).into());
    }
    Ok(())
}

/// Parse a numeric text field found in `path`.
pub fn parse_field<T>(text: &str, field: &str, path: &Path) -> Result<T, DatasetError>
where
    T: FromStr,
    T::Err: Display,
{
    let text = text.trim();
    text.parse().map_err(|err| {
        DatasetError::parse(path, format!("invalid {} value '{}': {}", field, text, err))
    })
}

pub fn check_index(index: usize, len: usize) -> Result<(), DatasetError> {
    if index >= len {
        return Err(DatasetError::Index { index, len });
    }
    Ok(())
}
