use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use emo_core::ExtractionConfig;
use emo_train::LabelVocabulary;

/// Contents of the `--config` YAML file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub extraction: ExtractionConfig,
    pub vocabulary: Option<LabelVocabulary>,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        serde_yaml::from_str(&yaml)
            .with_context(|| format!("failed to parse settings: {}", path.display()))
    }

    pub fn vocabulary(&self) -> Result<&LabelVocabulary> {
        self.vocabulary
            .as_ref()
            .context("settings file has no `vocabulary` section (pass --config)")
    }
}
