// artifact.rs
use crate::domain::listing::ListingReference;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes `url,source` rows, header first.
pub fn write_references(path: &Path, refs: &[ListingReference]) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let file = File::create(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(["url", "source"])?;
    for reference in refs {
        writer.write_record([reference.url.as_str(), reference.source_name.as_str()])?;
    }
    writer.flush().map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

pub fn read_references(path: &Path) -> Result<Vec<ListingReference>, ArtifactError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut refs = Vec::new();
    for row in reader.deserialize() {
        refs.push(row?);
    }
    Ok(refs)
}
