use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;

#[derive(Debug, Deserialize)]
struct RawVocabulary {
    labels: Vec<String>,
    #[serde(default)]
    aliases: HashMap<String, String>,
}

/// Closed mapping from emotion label to a contiguous integer code.
///
/// `labels` fixes the code order. `aliases` translates source labels (for
/// example the Italian abbreviations in file metadata) to canonical names;
/// a label without an alias is looked up as-is.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawVocabulary")]
pub struct LabelVocabulary {
    labels: Vec<String>,
    aliases: HashMap<String, String>,
    codes: HashMap<String, usize>,
}

impl TryFrom<RawVocabulary> for LabelVocabulary {
    type Error = DataError;

    fn try_from(raw: RawVocabulary) -> Result<Self, DataError> {
        Self::new(raw.labels, raw.aliases)
    }
}

impl LabelVocabulary {
    pub fn new(labels: Vec<String>, aliases: HashMap<String, String>) -> Result<Self, DataError> {
        let mut codes = HashMap::with_capacity(labels.len());
        for (code, label) in labels.iter().enumerate() {
            if codes.insert(label.clone(), code).is_some() {
                return Err(DataError::InvalidVocabulary(format!("duplicate label {label:?}")));
            }
        }
        if let Some((src, dst)) = aliases.iter().find(|(_, dst)| !codes.contains_key(*dst)) {
            return Err(DataError::InvalidVocabulary(format!(
                "alias {src:?} points at unknown label {dst:?}"
            )));
        }
        Ok(Self { labels, aliases, codes })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Code of a source label, after alias translation.
    pub fn code(&self, label: &str) -> Result<usize, DataError> {
        let canonical = self.aliases.get(label).map(String::as_str).unwrap_or(label);
        self.codes
            .get(canonical)
            .copied()
            .ok_or_else(|| DataError::UnknownLabel(label.to_string()))
    }

    pub fn label(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
