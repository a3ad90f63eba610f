use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, serde::Deserialize)]
struct Row {
    filename: String,
    #[serde(default)]
    emo: Option<String>,
}

/// One recording listed in a dataset meta CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    pub filename: String,
    /// Source emotion label; absent for unlabelled (test) datasets.
    pub emotion_label: Option<String>,
}

/// Read a comma-separated meta file with a header naming `filename` and,
/// for labelled data, `emo`. Other columns are ignored.
pub fn read_meta<P: AsRef<Path>>(meta_csv: P) -> Result<Vec<MetaEntry>> {
    let meta_csv = meta_csv.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(meta_csv)
        .with_context(|| format!("Failed to open meta CSV: {}", meta_csv.display()))?;

    let mut entries = Vec::new();
    let mut skipped_empty_name = 0usize;

    for result in rdr.deserialize::<Row>() {
        let row = result
            .with_context(|| format!("Failed to parse a row of {}", meta_csv.display()))?;

        let filename = row.filename.trim();
        if filename.is_empty() {
            skipped_empty_name += 1;
            continue;
        }

        entries.push(MetaEntry {
            filename: filename.to_string(),
            emotion_label: row
                .emo
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        });
    }

    if skipped_empty_name > 0 {
        tracing::warn!(
            meta = %meta_csv.display(),
            skipped_empty_name,
            "skipped meta rows with an empty filename"
        );
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_labelled_meta() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "speaker,filename,emo\ns01,rab_s01_a1.wav,rab\ns02,,gio\ns02,gio_s02_a4.wav,gio\n"
        )
        .unwrap();

        let entries = read_meta(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "rab_s01_a1.wav");
        assert_eq!(entries[1].emotion_label.as_deref(), Some("gio"));
    }

    #[test]
    fn reads_unlabelled_meta() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "filename\nx1.wav\nx2.wav\n").unwrap();

        let entries = read_meta(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.emotion_label.is_none()));
    }
}
