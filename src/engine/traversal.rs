//! Traversal engine: open a container, fan its entries out over a bounded worker pool,
//! recurse into directories and nested archives, and sample every leaf.
//!
//! Each archive level runs its workers inside a `thread::scope`, so the level's handle is
//! borrowed by every worker and is closed only after the scope has joined all of them.

use crossbeam_channel::bounded;
use log::{debug, trace};
use std::io::BufReader;
use std::path::Path;
use std::sync::Mutex;
use std::thread;

use crate::archive::{ArchiveHandle, ContainerKind, EntryStream, Source, children_of, is_nested_archive};
use crate::engine::sampler::sample;
use crate::engine::writer::{SchemaIdentity, SchemaWriter};
use crate::error::{SampleError, SampleResult};
use crate::pipeline::context::RunContext;
use crate::pipeline::error_handler::{dispose, guarded};
use crate::utils::config::SourceConsts;
use crate::{Entry, EntryKind, RunConfig};

/// What opening one entry produced.
enum Opened {
    Sample(Vec<u8>),
    Nested(ContainerKind, Source),
}

impl Opened {
    fn kind(&self) -> EntryKind {
        match self {
            Self::Sample(_) => EntryKind::File,
            Self::Nested(..) => EntryKind::NestedArchive,
        }
    }
}

/// Per-run traversal state. Cheap to share: everything is borrowed and read-only
/// except the counters in [`RunContext`].
pub struct Traversal<'r> {
    config: &'r RunConfig,
    writer: &'r SchemaWriter,
    ctx: &'r RunContext,
}

impl<'r> Traversal<'r> {
    pub fn new(config: &'r RunConfig, writer: &'r SchemaWriter, ctx: &'r RunContext) -> Self {
        Self {
            config,
            writer,
            ctx,
        }
    }

    fn dispose(&self, err: SampleError) -> SampleResult<()> {
        dispose(self.config.on_error, self.ctx, err)
    }

    /// Traverse one top-level input file. Recoverable errors are disposed of by the error
    /// policy; `Err` is returned only when the policy raises or the run was cancelled.
    pub fn run_file(&self, path: &Path) -> SampleResult<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let identity = SchemaIdentity::root(name);
        debug!("processing {}", path.display());
        let opened = ArchiveHandle::open_path(path, &identity.display_path());
        self.traverse_owned(opened, &identity, 0)
    }

    /// Opening -> Listing -> Dispatching for a freshly opened handle, then close it once.
    fn traverse_owned(
        &self,
        opened: SampleResult<ArchiveHandle>,
        identity: &SchemaIdentity,
        depth: usize,
    ) -> SampleResult<()> {
        let handle = match opened {
            Ok(handle) => handle,
            Err(err) => return self.dispose(err),
        };
        let result = self.traverse(&handle, identity, depth);
        let closed = handle.close().or_else(|err| self.dispose(err));
        result.and(closed)
    }

    fn traverse(
        &self,
        handle: &ArchiveHandle,
        identity: &SchemaIdentity,
        depth: usize,
    ) -> SampleResult<()> {
        if let ArchiveHandle::Plain(plain) = handle {
            return self.process_entry(handle, &[], plain.itself(), identity, depth);
        }
        let entries = handle.list_entries();
        debug!("{}: {} entries", identity.display_path(), entries.len());
        self.dispatch(handle, entries, "", identity, depth)
    }

    /// Fan the immediate children of `prefix` out over `min(children, entry_concurrency)`
    /// workers and wait for all of them. Returns the first raised error, if any.
    fn dispatch(
        &self,
        handle: &ArchiveHandle,
        all: &[Entry],
        prefix: &str,
        archive_id: &SchemaIdentity,
        depth: usize,
    ) -> SampleResult<()> {
        let children = children_of(all, prefix);
        if children.is_empty() {
            return Ok(());
        }
        let workers = children.len().min(self.config.entry_concurrency);
        let (entry_tx, entry_rx) = bounded::<Entry>(children.len());
        for child in children {
            // Capacity equals the child count, so this never blocks.
            if entry_tx.send(child).is_err() {
                break;
            }
        }
        drop(entry_tx);

        let raised: Mutex<Option<SampleError>> = Mutex::new(None);
        let raised_ref = &raised;
        thread::scope(|scope| {
            for _ in 0..workers {
                let entry_rx = entry_rx.clone();
                scope.spawn(move || {
                    while let Ok(entry) = entry_rx.recv() {
                        if self.ctx.should_stop() {
                            break;
                        }
                        if let Err(err) = self.process_entry(handle, all, &entry, archive_id, depth)
                        {
                            self.ctx.abort();
                            raised_ref
                                .lock()
                                .unwrap_or_else(|poisoned| poisoned.into_inner())
                                .get_or_insert(err);
                            break;
                        }
                    }
                });
            }
        });

        match raised.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Classifying: directory -> re-dispatch its children against the same handle;
    /// nested archive -> new traversal on the entry's bytes; leaf -> sample and write.
    fn process_entry(
        &self,
        handle: &ArchiveHandle,
        all: &[Entry],
        entry: &Entry,
        archive_id: &SchemaIdentity,
        depth: usize,
    ) -> SampleResult<()> {
        if !handle.is_plain() && handle.is_directory(entry) {
            let prefix = format!("{}/", entry.name.trim_end_matches('/'));
            return self.dispatch(handle, all, &prefix, archive_id, depth);
        }

        let identity = archive_id.child(&entry.name);
        let opened = match self.open_and_classify(handle, entry, &identity, depth) {
            Ok(opened) => opened,
            Err(err) => return self.dispose(err),
        };
        trace!("{} -> {:?}", identity.display_path(), opened.kind());
        match opened {
            Opened::Sample(bytes) => guarded(self.config.on_error, self.ctx, || {
                let dest = self.writer.write(&identity, &bytes)?;
                trace!("wrote {}", dest.display());
                self.ctx.record_written();
                Ok(())
            }),
            Opened::Nested(kind, source) => {
                let label = identity.display_path();
                let child = ArchiveHandle::open_source(&kind, source, &label);
                self.traverse_owned(child, &identity, depth + 1)
            }
        }
    }

    fn open_and_classify(
        &self,
        handle: &ArchiveHandle,
        entry: &Entry,
        identity: &SchemaIdentity,
        depth: usize,
    ) -> SampleResult<Opened> {
        let label = identity.display_path();
        handle.open_entry(entry, |EntryStream { reader, len }| {
            let (nested, mut replay) =
                is_nested_archive(reader).map_err(|e| SampleError::io(&label, e))?;
            match nested {
                Some(kind) => {
                    if depth + 1 > self.config.max_depth {
                        return Err(SampleError::DepthExceeded {
                            path: label.clone(),
                            limit: self.config.max_depth,
                        });
                    }
                    debug!("{} is a nested {}", label, kind.mime());
                    let source = Source::from_reader(&mut replay, len)
                        .map_err(|e| SampleError::io(&label, e))?;
                    Ok(Opened::Nested(kind, source))
                }
                None => {
                    let mut buffered =
                        BufReader::with_capacity(SourceConsts::SAMPLE_BUFFER_SIZE, replay);
                    let bytes = sample(&mut buffered, self.config.lines_per_sample, len)
                        .map_err(|e| SampleError::io(&label, e))?;
                    Ok(Opened::Sample(bytes))
                }
            }
        })
    }
}
