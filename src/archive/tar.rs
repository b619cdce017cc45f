use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use log::debug;
use std::io::{self, Read};
use tar::EntryType;
use xz2::read::XzDecoder;

use super::detect::TarCompression;
use super::source::Source;
use super::{ArchiveBackend, EntryStream, normalize_entry_name};
use crate::error::{SampleError, SampleResult};
use crate::{Entry, EntryKind};

/// Where a member's data lives inside the decoded tar stream.
struct TarMember {
    entry_type: EntryType,
    offset: u64,
    size: u64,
}

/// Tar backend. Compressed streams are decoded once into a mapped temp file so every
/// member is a plain byte range that workers can read independently.
pub struct TarBackend {
    data: Source,
    members: Vec<TarMember>,
    entries: Vec<Entry>,
    label: String,
}

/// Decode a compressed tar into a [`Source`]. `None` passes the bytes through.
fn decode(source: Source, compression: TarCompression) -> io::Result<Source> {
    let raw = source.cursor();
    match compression {
        TarCompression::None => Ok(source),
        TarCompression::Gzip => Source::spill(&mut MultiGzDecoder::new(raw)),
        TarCompression::Bzip2 => Source::spill(&mut MultiBzDecoder::new(raw)),
        TarCompression::Xz => Source::spill(&mut XzDecoder::new_multi_decoder(raw)),
    }
}

/// Extension headers are folded into the member they describe and never listed.
fn is_metadata_header(entry_type: EntryType) -> bool {
    entry_type.is_pax_global_extensions()
        || entry_type.is_pax_local_extensions()
        || entry_type.is_gnu_longname()
        || entry_type.is_gnu_longlink()
}

/// Members that carry a readable data stream.
fn has_data(entry_type: EntryType) -> bool {
    entry_type.is_file() || entry_type.is_contiguous()
}

impl TarBackend {
    pub fn open(source: Source, compression: TarCompression, label: &str) -> SampleResult<Self> {
        let data = decode(source, compression)
            .map_err(|e| SampleError::corrupt_archive(label, format!("decode failed: {e}")))?;
        debug!(
            "{}: {} bytes of tar data ({:?})",
            label,
            data.len(),
            compression
        );

        let mut archive = tar::Archive::new(data.cursor());
        let iter = archive
            .entries_with_seek()
            .map_err(|e| SampleError::corrupt_archive(label, e))?;
        let mut members = Vec::new();
        let mut entries = Vec::new();
        for item in iter {
            let member = item.map_err(|e| SampleError::corrupt_archive(label, e))?;
            let entry_type = member.header().entry_type();
            if is_metadata_header(entry_type) {
                continue;
            }
            let name = normalize_entry_name(&String::from_utf8_lossy(&member.path_bytes()));
            if name.is_empty() {
                continue;
            }
            let kind = if entry_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let slot = members.len();
            members.push(TarMember {
                entry_type,
                offset: member.raw_file_position(),
                size: member.size(),
            });
            entries.push(Entry::new(name, kind, Some(member.size()), slot));
        }
        Ok(Self {
            data,
            members,
            entries,
            label: label.to_string(),
        })
    }
}

impl ArchiveBackend for TarBackend {
    fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn is_directory(&self, entry: &Entry) -> bool {
        entry
            .slot
            .and_then(|slot| self.members.get(slot))
            .map_or(true, |m| m.entry_type.is_dir())
    }

    /// Links, devices and fifos are listed but have no data; opening one is `CorruptEntry`.
    fn open_entry<T>(
        &self,
        entry: &Entry,
        visit: impl FnOnce(EntryStream<'_>) -> SampleResult<T>,
    ) -> SampleResult<T> {
        let path = format!("{}/{}", self.label, entry.name);
        let member = entry
            .slot
            .and_then(|slot| self.members.get(slot))
            .ok_or_else(|| SampleError::corrupt_entry(&path, "entry is not a tar member"))?;
        if !has_data(member.entry_type) {
            return Err(SampleError::corrupt_entry(
                &path,
                format!("member has no data stream ({:?})", member.entry_type),
            ));
        }
        let slice = self
            .data
            .slice(member.offset, member.size)
            .map_err(|e| SampleError::corrupt_entry(&path, e))?;
        let len = Some(slice.len());
        let reader: Box<dyn Read + '_> = Box::new(io::Cursor::new(slice));
        visit(EntryStream { reader, len })
    }
}
