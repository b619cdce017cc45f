use log::debug;
use std::fs::File;
use std::io::{BufReader, Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::source::Source;
use super::{ArchiveBackend, EntryStream, normalize_entry_name};
use crate::error::{SampleError, SampleResult};
use crate::utils::config::{PackagePaths, SourceConsts};
use crate::{Entry, EntryKind};

/// How one member's bytes are handed to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MemberRead {
    /// Decompress into memory.
    Memory,
    /// Extract to a temp file and stream from disk.
    Spill,
}

/// Members above `threshold` bytes, or of unknown size, go through a temp file.
fn member_read(size: Option<u64>, threshold: u64) -> MemberRead {
    match size {
        Some(n) if n <= threshold => MemberRead::Memory,
        _ => MemberRead::Spill,
    }
}

/// RAR backend. The unrar library only opens archives by path, so nested RAR data is
/// written to a named temp file that lives as long as the handle.
pub struct RarBackend {
    path: PathBuf,
    spill: Option<NamedTempFile>,
    entries: Vec<Entry>,
    dir_flags: Vec<bool>,
    /// Largest member decompressed into memory.
    spill_threshold: u64,
    label: String,
}

impl RarBackend {
    pub fn open_path(path: &Path, label: &str) -> SampleResult<Self> {
        Self::open(path.to_path_buf(), None, label)
    }

    pub fn open_source(source: &Source, label: &str) -> SampleResult<Self> {
        let mut spill = tempfile::Builder::new()
            .prefix(PackagePaths::get().spill_prefix())
            .suffix(".rar")
            .tempfile()
            .map_err(|e| SampleError::io(label, e))?;
        spill
            .write_all(source.as_ref())
            .and_then(|()| spill.flush())
            .map_err(|e| SampleError::io(label, e))?;
        let path = spill.path().to_path_buf();
        Self::open(path, Some(spill), label)
    }

    fn open(path: PathBuf, spill: Option<NamedTempFile>, label: &str) -> SampleResult<Self> {
        let listing = unrar::Archive::new(&path)
            .open_for_listing()
            .map_err(|e| SampleError::corrupt_archive(label, e))?;
        let mut entries = Vec::new();
        let mut dir_flags = Vec::new();
        for (slot, header) in listing.enumerate() {
            let header = header.map_err(|e| SampleError::corrupt_archive(label, e))?;
            let is_dir = header.is_directory();
            dir_flags.push(is_dir);
            let name = normalize_entry_name(&header.filename.to_string_lossy());
            if name.is_empty() {
                continue;
            }
            let kind = if is_dir {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(Entry::new(name, kind, Some(header.unpacked_size), slot));
        }
        Ok(Self {
            path,
            spill,
            entries,
            dir_flags,
            spill_threshold: SourceConsts::SPILL_THRESHOLD,
            label: label.to_string(),
        })
    }

    /// Override the in-memory member limit.
    pub fn with_spill_threshold(mut self, threshold: u64) -> Self {
        self.spill_threshold = threshold;
        self
    }

    /// Remove the spill file, if any.
    pub fn close(self) -> SampleResult<()> {
        match self.spill {
            Some(spill) => {
                debug!("{}: removing spill file {}", self.label, self.path.display());
                spill.close().map_err(|e| SampleError::io(&self.label, e))
            }
            None => Ok(()),
        }
    }
}

impl ArchiveBackend for RarBackend {
    fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn is_directory(&self, entry: &Entry) -> bool {
        entry
            .slot
            .and_then(|slot| self.dir_flags.get(slot).copied())
            .unwrap_or(true)
    }

    /// Walks headers up to the entry's slot. Small members are decompressed into memory;
    /// larger ones are extracted to a temp file so only the sampled prefix is ever buffered.
    fn open_entry<T>(
        &self,
        entry: &Entry,
        visit: impl FnOnce(EntryStream<'_>) -> SampleResult<T>,
    ) -> SampleResult<T> {
        let path = format!("{}/{}", self.label, entry.name);
        let slot = entry
            .slot
            .ok_or_else(|| SampleError::corrupt_entry(&path, "entry is not a rar member"))?;
        let mut cursor = unrar::Archive::new(&self.path)
            .open_for_processing()
            .map_err(|e| SampleError::corrupt_archive(&self.label, e))?;
        let mut index = 0;
        loop {
            let header = cursor
                .read_header()
                .map_err(|e| SampleError::corrupt_entry(&path, e))?
                .ok_or_else(|| SampleError::corrupt_entry(&path, "member missing on reopen"))?;
            if index == slot {
                return match member_read(entry.size, self.spill_threshold) {
                    MemberRead::Memory => {
                        let (data, _rest) = header
                            .read()
                            .map_err(|e| SampleError::corrupt_entry(&path, e))?;
                        let len = Some(data.len() as u64);
                        visit(EntryStream {
                            reader: Box::new(Cursor::new(data)),
                            len,
                        })
                    }
                    MemberRead::Spill => {
                        let spill_dir = tempfile::Builder::new()
                            .prefix(PackagePaths::get().spill_prefix())
                            .tempdir()
                            .map_err(|e| SampleError::io(&path, e))?;
                        let member_path = spill_dir.path().join("member");
                        debug!("{}: extracting to {}", path, member_path.display());
                        header
                            .extract_to(&member_path)
                            .map_err(|e| SampleError::corrupt_entry(&path, e))?;
                        let file = File::open(&member_path).map_err(|e| SampleError::io(&path, e))?;
                        let len = file.metadata().map_err(|e| SampleError::io(&path, e))?.len();
                        let result = visit(EntryStream {
                            reader: Box::new(BufReader::with_capacity(
                                SourceConsts::SAMPLE_BUFFER_SIZE,
                                file,
                            )),
                            len: Some(len),
                        });
                        drop(spill_dir);
                        result
                    }
                };
            }
            cursor = header
                .skip()
                .map_err(|e| SampleError::corrupt_entry(&path, e))?;
            index += 1;
        }
    }
}
