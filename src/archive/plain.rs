use std::io::Cursor;

use super::source::Source;
use super::{ArchiveBackend, EntryStream};
use crate::error::SampleResult;
use crate::{Entry, EntryKind};

/// A non-archive file: exactly one synthetic, unnamed entry covering the whole stream.
pub struct PlainBackend {
    source: Source,
    entries: [Entry; 1],
}

impl PlainBackend {
    pub fn new(source: Source) -> Self {
        let len = source.len();
        Self {
            source,
            entries: [Entry::new(String::new(), EntryKind::File, Some(len), 0)],
        }
    }

    /// The synthetic entry standing for the file itself.
    pub fn itself(&self) -> &Entry {
        &self.entries[0]
    }
}

impl ArchiveBackend for PlainBackend {
    fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn is_directory(&self, _entry: &Entry) -> bool {
        false
    }

    fn open_entry<T>(
        &self,
        _entry: &Entry,
        visit: impl FnOnce(EntryStream<'_>) -> SampleResult<T>,
    ) -> SampleResult<T> {
        visit(EntryStream {
            reader: Box::new(Cursor::new(self.source.clone())),
            len: Some(self.source.len()),
        })
    }
}
