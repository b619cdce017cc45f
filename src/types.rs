//! Public and internal types for the schemadump API and pipeline.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::utils::config::DefaultArgs;

/// Run-wide rule for disposing of every recoverable failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abandon the failing unit silently.
    Skip,
    /// Log the failing unit and continue.
    #[default]
    Warn,
    /// Abort the branch and surface the error as the run result.
    Raise,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "warn" => Ok(Self::Warn),
            "raise" => Ok(Self::Raise),
            other => Err(format!("unknown error policy '{other}' (skip|warn|raise)")),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Skip => "skip",
            Self::Warn => "warn",
            Self::Raise => "raise",
        };
        f.write_str(s)
    }
}

/// Structural kind of an archive member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    /// Never produced by listing. The traversal assigns it once an entry's leading bytes
    /// sniff as a container.
    NestedArchive,
}

/// One named member inside an archive. `name` is archive-relative and uses `/` separators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    /// Uncompressed size when the format records it.
    pub size: Option<u64>,
    /// Position in the backend's own listing; `None` for directories implied by member paths.
    pub(crate) slot: Option<usize>,
}

impl Entry {
    pub fn new(name: impl Into<String>, kind: EntryKind, size: Option<u64>, slot: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
            slot: Some(slot),
        }
    }

    pub(crate) fn implied_dir(name: String) -> Self {
        Self {
            name,
            kind: EntryKind::Directory,
            size: None,
            slot: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Immutable configuration for one invocation. Shared by reference with every task.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Directory whose immediate children are sampled.
    pub data_path: PathBuf,
    /// Output directory for `.schema` files (created if absent).
    pub schema_path: PathBuf,
    /// Worker count across top-level input files.
    pub top_level_concurrency: usize,
    /// Worker count across entries of one archive level.
    pub entry_concurrency: usize,
    /// Lines kept per sample.
    pub lines_per_sample: usize,
    pub on_error: ErrorPolicy,
    /// Glob patterns (`*`, `?`) of top-level names to ignore.
    pub exclude: Vec<String>,
    /// Maximum nested-archive depth below a top-level file.
    pub max_depth: usize,
    /// Show a progress bar over top-level files.
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DefaultArgs::DATA_PATH),
            schema_path: PathBuf::from(DefaultArgs::SCHEMA_PATH),
            top_level_concurrency: DefaultArgs::PROCESS_COUNT,
            entry_concurrency: DefaultArgs::THREAD_POOL_COUNT,
            lines_per_sample: DefaultArgs::LINES,
            on_error: ErrorPolicy::default(),
            exclude: Vec::new(),
            max_depth: DefaultArgs::MAX_DEPTH,
            progress: false,
        }
    }
}

impl RunConfig {
    pub fn new(data_path: impl Into<PathBuf>, schema_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            schema_path: schema_path.into(),
            ..Self::default()
        }
    }

    /// Clamp pool sizes to at least one worker.
    pub fn normalized(mut self) -> Self {
        self.top_level_concurrency = self.top_level_concurrency.max(1);
        self.entry_concurrency = self.entry_concurrency.max(1);
        self
    }
}

/// Totals reported once the run completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Top-level files submitted.
    pub inputs: usize,
    pub schemas_written: usize,
    /// Errors disposed of by the policy (skipped or warned).
    pub errors: usize,
}
