//! Application configuration constants.
//! Defaults, limits and buffer sizes in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    spill_prefix: String,
    env_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                spill_prefix: format!(".{pkg}-"),
                env_prefix: format!("{}_", pkg.to_uppercase()),
            }
        })
    }

    /// File config looked up in the working directory, e.g. `.schemadump.toml`.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Prefix for named temp files (nested RAR spills).
    pub fn spill_prefix(&self) -> &str {
        &self.spill_prefix
    }

    /// Environment variable name for a setting, e.g. `SCHEMADUMP_ON_ERROR`.
    pub fn env_var(&self, key: &str) -> String {
        format!("{}{}", self.env_prefix, key.to_uppercase())
    }
}

// ---- Defaults ----

/// Defaults shared by the CLI, the file config and [`crate::RunConfig::default`].
pub struct DefaultArgs;

impl DefaultArgs {
    pub const DATA_PATH: &'static str = "./data/";
    pub const SCHEMA_PATH: &'static str = "./schema/";
    /// Concurrent top-level files.
    pub const PROCESS_COUNT: usize = 10;
    /// Concurrent entries per archive level.
    pub const THREAD_POOL_COUNT: usize = 5;
    pub const LINES: usize = 2;
    /// Nested-archive depth guard.
    pub const MAX_DEPTH: usize = 32;
}

// ---- Detection / output ----

/// Bytes read from the start of a stream for content sniffing.
pub const SNIFF_LEN: usize = 512;

/// Replaces path separators in output file names.
pub const SEPARATOR_MARKER: &str = "-sep-";

/// Appended to every output file name.
pub const SCHEMA_SUFFIX: &str = ".schema";

// ---- Byte sources ----

/// Buffer and materialization thresholds for entry streams.
pub struct SourceConsts;

impl SourceConsts {
    /// Nested archives up to this size are held in memory; larger ones are spilled
    /// to a temp file and memory-mapped. 64 MB.
    pub const SPILL_THRESHOLD: u64 = 64 * 1024 * 1024;
    /// Copy buffer when spilling a stream to disk. 1 MB.
    pub const COPY_BUFFER_SIZE: usize = 1024 * 1024;
    /// Read buffer for line sampling. 64 KB.
    pub const SAMPLE_BUFFER_SIZE: usize = 64 * 1024;
}
