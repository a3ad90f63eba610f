use std::path::{Path, PathBuf};

use thiserror::Error;

/// Position of the audio filename inside the comma-separated first column.
const FILENAME_FIELD: usize = 3;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("manifest {path}, row {row}: no filename in field {field} of {column:?}")]
    MissingFilename {
        path: PathBuf,
        row: usize,
        field: usize,
        column: String,
    },
}

/// Read the audio filenames listed in a split manifest, in row order.
///
/// Rows are tab-delimited; the first column is itself comma-delimited and
/// carries the filename in its fourth field.
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ManifestError> {
    let path = path.as_ref();
    let read_err = |source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;

    let mut filenames = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(read_err)?;
        let column = record.get(0).unwrap_or_default();
        let filename = column
            .split(',')
            .nth(FILENAME_FIELD)
            .ok_or_else(|| ManifestError::MissingFilename {
                path: path.to_path_buf(),
                row,
                field: FILENAME_FIELD,
                column: column.to_string(),
            })?;
        filenames.push(filename.to_string());
    }
    Ok(filenames)
}
