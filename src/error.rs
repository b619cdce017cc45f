//! Error kinds reported by the sampler. Every variant names the failing unit so
//! the error policy can report it without extra context.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("unsupported file type: {mime} ({path})")]
    UnsupportedFormat { path: String, mime: String },

    #[error("path not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("corrupt archive {path}: {reason}")]
    CorruptArchive { path: String, reason: String },

    #[error("corrupt entry {path}: {reason}")]
    CorruptEntry { path: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("failed to write schema {}: {source}", path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error("nesting depth limit ({limit}) exceeded at {path}")]
    DepthExceeded { path: String, limit: usize },

    #[error("run cancelled")]
    Cancelled,
}

impl SampleError {
    pub fn corrupt_archive(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptArchive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn corrupt_entry(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptEntry {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short kind label used in log lines and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "UnsupportedFormat",
            Self::NotFound { .. } => "NotFound",
            Self::CorruptArchive { .. } => "CorruptArchive",
            Self::CorruptEntry { .. } => "CorruptEntry",
            Self::Io { .. } => "IOError",
            Self::WriteFailed { .. } => "WriteFailed",
            Self::DepthExceeded { .. } => "DepthExceeded",
            Self::Cancelled => "Cancelled",
        }
    }
}

pub type SampleResult<T> = std::result::Result<T, SampleError>;
