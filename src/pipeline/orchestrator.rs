//! Run coordinator: enumerate the data directory and fan top-level files out over the
//! process-level pool.

use log::{debug, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use walkdir::WalkDir;

use crate::engine::progress::{ProgressBar, create_progress_bar, finish_bar, update_progress_bar};
use crate::engine::tools::{canonicalize_or_keep, should_include_input};
use crate::engine::traversal::Traversal;
use crate::engine::writer::SchemaWriter;
use crate::error::SampleError;
use crate::utils::fd_limit::cap_pool_sizes;
use crate::{RunConfig, RunSummary};

use super::context::RunContext;

/// Immediate children of `data_path` that should be sampled, in file-name order.
/// Subdirectories are listed too (they classify as unsupported); they are not recursed.
pub fn collect_inputs(config: &RunConfig) -> Result<Vec<PathBuf>, SampleError> {
    let root = &config.data_path;
    if !root.is_dir() {
        return Err(SampleError::NotFound { path: root.clone() });
    }
    let root_canonical = canonicalize_or_keep(root);
    let schema_canonical = config.schema_path.canonicalize().ok();

    let mut inputs = Vec::new();
    for item in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = item.map_err(|e| {
            let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
            match e.into_io_error() {
                Some(source) => SampleError::io(path.display().to_string(), source),
                None => SampleError::NotFound { path },
            }
        })?;
        let path = entry.into_path();
        if should_include_input(
            &canonicalize_or_keep(&path),
            &root_canonical,
            &schema_canonical,
            &config.exclude,
        ) {
            inputs.push(path);
        } else {
            debug!("excluded {}", path.display());
        }
    }
    Ok(inputs)
}

/// Run every top-level file through the traversal engine.
///
/// Under `skip`/`warn` the run always completes and the summary counts the disposed errors.
/// Under `raise` the first raised error stops new submissions and is returned; work that is
/// already in flight finishes and its output stays intact.
pub fn run(config: &RunConfig, cancel: Option<Arc<AtomicBool>>) -> Result<RunSummary, SampleError> {
    let (top_level, entry) =
        cap_pool_sizes(config.top_level_concurrency, config.entry_concurrency);
    let config = RunConfig {
        top_level_concurrency: top_level,
        entry_concurrency: entry,
        ..config.clone()
    };

    std::fs::create_dir_all(&config.schema_path).map_err(|source| SampleError::WriteFailed {
        path: config.schema_path.clone(),
        source,
    })?;
    let inputs = collect_inputs(&config)?;
    info!(
        "Sampling {} files from {} ({} top-level workers, {} entry workers, {} lines)",
        inputs.len(),
        config.data_path.display(),
        config.top_level_concurrency,
        config.entry_concurrency,
        config.lines_per_sample
    );

    let ctx = RunContext::new(cancel);
    let writer = SchemaWriter::new(&config.schema_path);
    let traversal = Traversal::new(&config, &writer, &ctx);
    let bar: Option<ProgressBar> = config
        .progress
        .then(|| create_progress_bar(inputs.len(), "Sampling"));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.top_level_concurrency)
        .thread_name(|i| format!("schemadump-top-{i}"))
        .build()
        .map_err(|e| SampleError::io("thread pool", std::io::Error::other(e)))?;

    let outcome = pool.install(|| {
        inputs.par_iter().try_for_each(|path| {
            if ctx.should_stop() {
                return Ok(());
            }
            let result = traversal.run_file(path);
            if let Some(bar) = &bar {
                update_progress_bar(bar, 1);
            }
            if result.is_err() {
                ctx.abort();
            }
            result
        })
    });
    if let Some(bar) = &bar {
        finish_bar(bar);
    }

    if ctx.cancelled() {
        return Err(SampleError::Cancelled);
    }
    outcome?;
    Ok(ctx.summary(inputs.len()))
}
