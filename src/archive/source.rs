//! Shared, immutable byte sources that archive backends read from.
//!
//! A [`Source`] is cheap to clone; every clone reads the same bytes, so each worker
//! can hold its own cursor over an archive without locking.

use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::utils::config::SourceConsts;

#[derive(Clone, Debug)]
pub enum Source {
    Mapped(Arc<Mmap>),
    Memory(Arc<[u8]>),
}

impl AsRef<[u8]> for Source {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Mapped(m) => &m[..],
            Self::Memory(b) => &b[..],
        }
    }
}

impl Source {
    pub fn empty() -> Self {
        Self::Memory(Arc::from(Vec::new()))
    }

    pub fn len(&self) -> u64 {
        self.as_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.as_ref().is_empty()
    }

    /// Independent read cursor positioned at byte zero.
    pub fn cursor(&self) -> Cursor<Source> {
        Cursor::new(self.clone())
    }

    /// Memory-map a file on disk. Zero-length files become an empty in-memory source.
    pub fn map_path(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::map_file(&file)
    }

    fn map_file(file: &File) -> io::Result<Self> {
        if file.metadata()?.len() == 0 {
            return Ok(Self::empty());
        }
        // Inputs are treated as read-only for the lifetime of the run.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self::Mapped(Arc::new(mmap)))
    }

    /// Drain `reader` into an anonymous temp file and map it.
    pub fn spill<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut file = tempfile::tempfile()?;
        let mut writer = io::BufWriter::with_capacity(SourceConsts::COPY_BUFFER_SIZE, &mut file);
        io::copy(reader, &mut writer)?;
        writer.flush()?;
        drop(writer);
        Self::map_file(&file)
    }

    /// Materialize a stream: small streams stay in memory, large ones are spilled to disk.
    pub fn from_reader<R: Read>(reader: &mut R, size_hint: Option<u64>) -> io::Result<Self> {
        match size_hint {
            Some(n) if n <= SourceConsts::SPILL_THRESHOLD => {
                let mut buf = Vec::with_capacity(n as usize);
                reader.read_to_end(&mut buf)?;
                Ok(Self::Memory(Arc::from(buf)))
            }
            _ => Self::spill(reader),
        }
    }

    /// Slice `[offset, offset + len)` as its own source. Shares the mapping; no copy.
    pub fn slice(&self, offset: u64, len: u64) -> io::Result<SourceSlice> {
        let end = offset.checked_add(len).filter(|end| *end <= self.len());
        match end {
            Some(end) => Ok(SourceSlice {
                source: self.clone(),
                start: offset as usize,
                end: end as usize,
            }),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "range {}..{} past end of {}-byte source",
                    offset,
                    offset.saturating_add(len),
                    self.len()
                ),
            )),
        }
    }
}

/// Window into a [`Source`].
#[derive(Clone, Debug)]
pub struct SourceSlice {
    source: Source,
    start: usize,
    end: usize,
}

impl AsRef<[u8]> for SourceSlice {
    fn as_ref(&self) -> &[u8] {
        &self.source.as_ref()[self.start..self.end]
    }
}

impl SourceSlice {
    pub fn len(&self) -> u64 {
        (self.end - self.start) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}
