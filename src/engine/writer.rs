//! Schema output: flat file names derived from the nested entry path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SampleError, SampleResult};
use crate::utils::config::{SCHEMA_SUFFIX, SEPARATOR_MARKER};

/// Full nested path of an entry, from the top-level file name down to the leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaIdentity {
    segments: Vec<String>,
}

impl SchemaIdentity {
    /// Identity of a top-level input file.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// Identity one level down. Empty names (the synthetic plain-file entry) add nothing.
    pub fn child(&self, name: &str) -> Self {
        let name = name.trim_end_matches('/');
        let mut segments = self.segments.clone();
        if !name.is_empty() {
            segments.push(name.to_string());
        }
        Self { segments }
    }

    /// Human-readable path used in logs and errors, e.g. `data.zip/dir/a.csv`.
    pub fn display_path(&self) -> String {
        self.segments.join("/")
    }

    /// Output file name with every separator replaced by the marker.
    pub fn file_name(&self) -> String {
        let flat = self
            .segments
            .iter()
            .map(|s| s.replace(['/', '\\'], SEPARATOR_MARKER))
            .collect::<Vec<_>>()
            .join(SEPARATOR_MARKER);
        format!("{flat}{SCHEMA_SUFFIX}")
    }
}

/// Persists samples under the schema directory. Writers for distinct identities never
/// share a path, so no coordination is needed between them.
#[derive(Clone, Debug)]
pub struct SchemaWriter {
    dir: PathBuf,
}

impl SchemaWriter {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path_for(&self, identity: &SchemaIdentity) -> PathBuf {
        self.dir.join(identity.file_name())
    }

    pub fn write(&self, identity: &SchemaIdentity, bytes: &[u8]) -> SampleResult<PathBuf> {
        let dest = self.path_for(identity);
        fs::write(&dest, bytes).map_err(|source| SampleError::WriteFailed {
            path: dest.clone(),
            source,
        })?;
        Ok(dest)
    }
}
