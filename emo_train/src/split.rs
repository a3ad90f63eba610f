use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// The two partitions of a development dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitKind {
    Train,
    Validate,
}

impl FromStr for SplitKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, DataError> {
        match s {
            "train" => Ok(Self::Train),
            "validate" => Ok(Self::Validate),
            other => Err(DataError::InvalidSplit(other.to_string())),
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => f.write_str("train"),
            Self::Validate => f.write_str("validate"),
        }
    }
}

/// Dataset positions selected by a manifest, plus how many manifest rows had
/// no matching filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitResolution {
    pub indices: Vec<usize>,
    pub dropped: usize,
}

/// Map manifest filenames to dataset positions.
///
/// Order follows the manifest. A filename occurring more than once in the
/// dataset resolves to its first position; a filename absent from the dataset
/// is skipped and counted in `dropped`.
pub fn resolve_indices<S: AsRef<str>>(filenames: &[String], manifest: &[S]) -> SplitResolution {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(filenames.len());
    for (i, name) in filenames.iter().enumerate() {
        positions.entry(name.as_str()).or_insert(i);
    }

    let mut resolution = SplitResolution::default();
    for name in manifest {
        match positions.get(name.as_ref()) {
            Some(&i) => resolution.indices.push(i),
            None => resolution.dropped += 1,
        }
    }
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_split_names() {
        assert_eq!("train".parse::<SplitKind>().unwrap(), SplitKind::Train);
        assert_eq!("validate".parse::<SplitKind>().unwrap(), SplitKind::Validate);
        assert!(matches!("test".parse::<SplitKind>(), Err(DataError::InvalidSplit(s)) if s == "test"));
        assert_eq!(SplitKind::Validate.to_string(), "validate");
    }

    #[test]
    fn follows_manifest_order_and_counts_drops() {
        let dataset = names(&["a.wav", "b.wav", "c.wav", "d.wav"]);
        let res = resolve_indices(&dataset, &["d.wav", "zz.wav", "a.wav", "c.wav"]);
        assert_eq!(res.indices, vec![3, 0, 2]);
        assert_eq!(res.dropped, 1);
    }

    #[test]
    fn duplicate_dataset_names_resolve_to_first() {
        let dataset = names(&["a.wav", "b.wav", "a.wav"]);
        let res = resolve_indices(&dataset, &["a.wav"]);
        assert_eq!(res.indices, vec![0]);
    }

    #[test]
    fn matching_is_exact() {
        let dataset = names(&["a.wav"]);
        let res = resolve_indices(&dataset, &["A.wav", " a.wav"]);
        assert!(res.indices.is_empty());
        assert_eq!(res.dropped, 2);
    }
}
