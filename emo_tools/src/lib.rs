//! Readers for the tabular files that describe a dataset: split manifests
//! and the per-dataset meta CSV.

pub mod manifest;
pub mod meta;

pub use manifest::{read_manifest, ManifestError};
pub use meta::{read_meta, MetaEntry};
