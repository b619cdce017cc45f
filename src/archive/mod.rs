//! Archive adapters: one backend per container format behind a closed [`ArchiveHandle`] variant.
//!
//! - `detect.rs` - content sniffing (magic numbers, MIME table)
//! - `source.rs` - shared byte sources (mmap, memory, temp-file spill)
//! - `zip.rs`, `tar.rs`, `rar.rs` - format backends
//! - `plain.rs` - degenerate backend with one synthetic entry
//!
//! Entries are listed once, when the handle is opened. Every `open_entry` call gets an
//! independent sub-stream, so workers may read different entries of one handle concurrently.

pub mod detect;
pub mod plain;
pub mod rar;
pub mod source;
pub mod tar;
pub mod zip;

use log::debug;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::{SampleError, SampleResult};
use crate::{Entry, EntryKind};

pub use detect::{ContainerKind, TarCompression, detect_format, detect_path, sniff_stream};
pub use source::Source;

/// Readable sub-stream for one entry. `len` is the uncompressed length when known.
pub struct EntryStream<'a> {
    pub reader: Box<dyn Read + 'a>,
    pub len: Option<u64>,
}

/// Capabilities every format backend provides.
pub trait ArchiveBackend {
    /// Entries in format-defined order.
    fn entries(&self) -> &[Entry];

    /// Normalized directory flag for a listed entry.
    fn is_directory(&self, entry: &Entry) -> bool;

    /// Open `entry` and hand its stream to `visit`. The stream does not outlive the call.
    fn open_entry<T>(
        &self,
        entry: &Entry,
        visit: impl FnOnce(EntryStream<'_>) -> SampleResult<T>,
    ) -> SampleResult<T>;
}

/// An open container. Owned by the traversal branch that opened it and closed exactly once
/// through [`ArchiveHandle::close`].
pub enum ArchiveHandle {
    Zip(zip::ZipBackend),
    Rar(rar::RarBackend),
    Tar(tar::TarBackend),
    Plain(plain::PlainBackend),
}

macro_rules! dispatch {
    ($handle:expr, $b:ident => $body:expr) => {
        match $handle {
            ArchiveHandle::Zip($b) => $body,
            ArchiveHandle::Rar($b) => $body,
            ArchiveHandle::Tar($b) => $body,
            ArchiveHandle::Plain($b) => $body,
        }
    };
}

impl ArchiveHandle {
    /// Classify and open a file on disk. `label` names the unit in errors.
    pub fn open_path(path: &Path, label: &str) -> SampleResult<Self> {
        let kind = detect_path(path)?;
        if let ContainerKind::Unsupported(mime) = kind {
            return Err(SampleError::UnsupportedFormat {
                path: label.to_string(),
                mime,
            });
        }
        if kind == ContainerKind::Rar {
            // The RAR backend reads from a path, so the file is not mapped.
            return rar::RarBackend::open_path(path, label).map(Self::Rar);
        }
        let source = Source::map_path(path).map_err(|e| SampleError::io(label, e))?;
        Self::open_source(&kind, source, label)
    }

    /// Open an already materialized container of a known kind.
    pub fn open_source(kind: &ContainerKind, source: Source, label: &str) -> SampleResult<Self> {
        debug!("opening {} as {}", label, kind.mime());
        match kind {
            ContainerKind::Zip => zip::ZipBackend::open(source, label).map(Self::Zip),
            ContainerKind::Rar => rar::RarBackend::open_source(&source, label).map(Self::Rar),
            ContainerKind::Tar(compression) => {
                tar::TarBackend::open(source, *compression, label).map(Self::Tar)
            }
            ContainerKind::PlainText => Ok(Self::Plain(plain::PlainBackend::new(source))),
            ContainerKind::Unsupported(mime) => Err(SampleError::UnsupportedFormat {
                path: label.to_string(),
                mime: mime.clone(),
            }),
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain(_))
    }

    pub fn list_entries(&self) -> &[Entry] {
        dispatch!(self, b => b.entries())
    }

    pub fn is_directory(&self, entry: &Entry) -> bool {
        if entry.slot.is_none() {
            return entry.is_dir();
        }
        dispatch!(self, b => b.is_directory(entry))
    }

    pub fn open_entry<T>(
        &self,
        entry: &Entry,
        visit: impl FnOnce(EntryStream<'_>) -> SampleResult<T>,
    ) -> SampleResult<T> {
        dispatch!(self, b => b.open_entry(entry, visit))
    }

    /// Release the handle. Consuming `self` makes a second close impossible.
    pub fn close(self) -> SampleResult<()> {
        match self {
            Self::Rar(b) => b.close(),
            _ => Ok(()),
        }
    }
}

/// Sniff an entry stream. Returns the archive kind when the entry is itself a container,
/// plus a reader that replays the stream from its first byte.
pub fn is_nested_archive<'a, R: Read + 'a>(
    stream: R,
) -> std::io::Result<(Option<ContainerKind>, Box<dyn Read + 'a>)> {
    let (kind, head, tail) = sniff_stream(stream)?;
    let replay: Box<dyn Read + 'a> = Box::new(head.chain(tail));
    Ok((kind.is_archive().then_some(kind), replay))
}

/// Member names use `/` separators with no leading `./` or `/`.
pub(crate) fn normalize_entry_name(raw: &str) -> String {
    let mut name = raw.replace('\\', "/");
    while let Some(rest) = name.strip_prefix("./") {
        name = rest.to_string();
    }
    name.trim_start_matches('/').to_string()
}

/// Immediate children of directory `prefix` (empty for the archive root, otherwise ending
/// in `/`). Directories implied by deeper member paths are synthesized once each.
pub fn children_of(entries: &[Entry], prefix: &str) -> Vec<Entry> {
    let mut seen_dirs: HashSet<String> = HashSet::new();
    let mut children = Vec::new();
    for entry in entries {
        let Some(rest) = entry.name.strip_prefix(prefix) else {
            continue;
        };
        let rest = rest.trim_start_matches('/');
        let trimmed = rest.trim_end_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.split_once('/') {
            Some((first, _)) => {
                let dir = format!("{prefix}{first}/");
                if seen_dirs.insert(dir.clone()) {
                    children.push(Entry::implied_dir(dir));
                }
            }
            None if entry.is_dir() => {
                let dir = format!("{prefix}{trimmed}/");
                if seen_dirs.insert(dir.clone()) {
                    children.push(Entry {
                        name: dir,
                        ..entry.clone()
                    });
                }
            }
            None => children.push(entry.clone()),
        }
    }
    children
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, slot: usize) -> Entry {
        Entry::new(name, EntryKind::File, None, slot)
    }

    fn dir(name: &str, slot: usize) -> Entry {
        Entry::new(name, EntryKind::Directory, None, slot)
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn root_children_with_explicit_dirs() {
        let entries = vec![dir("a/", 0), file("a/x.csv", 1), file("top.txt", 2)];
        let root = children_of(&entries, "");
        assert_eq!(names(&root), vec!["a/", "top.txt"]);
        assert_eq!(root[0].slot, Some(0));
        assert_eq!(names(&children_of(&entries, "a/")), vec!["a/x.csv"]);
    }

    #[test]
    fn implied_dirs_are_synthesized_once() {
        let entries = vec![file("a/b/1.txt", 0), file("a/b/2.txt", 1), file("a/3.txt", 2)];
        let root = children_of(&entries, "");
        assert_eq!(names(&root), vec!["a/"]);
        assert_eq!(root[0].slot, None);
        assert!(root[0].is_dir());
        assert_eq!(names(&children_of(&entries, "a/")), vec!["a/b/", "a/3.txt"]);
        assert_eq!(
            names(&children_of(&entries, "a/b/")),
            vec!["a/b/1.txt", "a/b/2.txt"]
        );
    }

    #[test]
    fn tar_style_dir_without_trailing_slash() {
        let entries = vec![dir("data", 0), file("data/rows.csv", 1)];
        let root = children_of(&entries, "");
        assert_eq!(names(&root), vec!["data/"]);
        assert_eq!(names(&children_of(&entries, "data/")), vec!["data/rows.csv"]);
    }

    #[test]
    fn entry_names_are_normalized() {
        assert_eq!(normalize_entry_name("./data/a.csv"), "data/a.csv");
        assert_eq!(normalize_entry_name("dir\\sub\\b.txt"), "dir/sub/b.txt");
        assert_eq!(normalize_entry_name("/abs/c.txt"), "abs/c.txt");
        assert_eq!(normalize_entry_name("./"), "");
    }

    #[test]
    fn nested_archive_sniff_replays() {
        let (kind, mut replay) = is_nested_archive(&b"plain,csv\n1,2\n"[..]).unwrap();
        assert!(kind.is_none());
        let mut out = String::new();
        replay.read_to_string(&mut out).unwrap();
        assert_eq!(out, "plain,csv\n1,2\n");

        let (kind, _) = is_nested_archive(&[0x1F, 0x8B, 0x08, 0x00][..]).unwrap();
        assert_eq!(kind, Some(ContainerKind::Tar(TarCompression::Gzip)));
    }
}
