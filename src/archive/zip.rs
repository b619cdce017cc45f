use std::io::Cursor;

use zip::ZipArchive;
use zip::read::ZipFile;

use super::source::Source;
use super::{ArchiveBackend, EntryStream, normalize_entry_name};
use crate::error::{SampleError, SampleResult};
use crate::{Entry, EntryKind};

/// Directory bit of the Unix mode stored in the high half of the external attributes.
const UNIX_DIR_BIT: u32 = 0x4000;

pub struct ZipBackend {
    /// Cloning shares the parsed central directory; each clone reads through its own cursor.
    archive: ZipArchive<Cursor<Source>>,
    entries: Vec<Entry>,
    label: String,
}

fn zip_is_dir<R: std::io::Read>(file: &ZipFile<'_, R>) -> bool {
    file.is_dir() || file.unix_mode().is_some_and(|mode| mode & UNIX_DIR_BIT != 0)
}

impl ZipBackend {
    pub fn open(source: Source, label: &str) -> SampleResult<Self> {
        let mut archive = ZipArchive::new(source.cursor())
            .map_err(|e| SampleError::corrupt_archive(label, e))?;
        let mut entries = Vec::with_capacity(archive.len());
        for slot in 0..archive.len() {
            let file = archive
                .by_index_raw(slot)
                .map_err(|e| SampleError::corrupt_archive(label, e))?;
            let name = normalize_entry_name(file.name());
            if name.is_empty() {
                continue;
            }
            let kind = if zip_is_dir(&file) {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(Entry::new(name, kind, Some(file.size()), slot));
        }
        Ok(Self {
            archive,
            entries,
            label: label.to_string(),
        })
    }
}

impl ArchiveBackend for ZipBackend {
    fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn is_directory(&self, entry: &Entry) -> bool {
        let Some(slot) = entry.slot else {
            return true;
        };
        let mut archive = self.archive.clone();
        archive
            .by_index_raw(slot)
            .map(|file| zip_is_dir(&file))
            .unwrap_or(entry.is_dir())
    }

    fn open_entry<T>(
        &self,
        entry: &Entry,
        visit: impl FnOnce(EntryStream<'_>) -> SampleResult<T>,
    ) -> SampleResult<T> {
        let path = format!("{}/{}", self.label, entry.name);
        let slot = entry
            .slot
            .ok_or_else(|| SampleError::corrupt_entry(&path, "entry is not a zip member"))?;
        let mut archive = self.archive.clone();
        let file = archive
            .by_index(slot)
            .map_err(|e| SampleError::corrupt_entry(&path, e))?;
        let len = Some(file.size());
        visit(EntryStream {
            reader: Box::new(file),
            len,
        })
    }
}
