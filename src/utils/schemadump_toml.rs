//! Load `.schemadump.toml` (CLI only). Library callers build [`RunConfig`] themselves.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;
use crate::{ErrorPolicy, RunConfig};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SchemadumpToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    data_path: Option<PathBuf>,
    schema_path: Option<PathBuf>,
    process_count: Option<usize>,
    thread_pool_count: Option<usize>,
    lines: Option<usize>,
    on_error: Option<ErrorPolicy>,
    exclude: Option<Vec<String>>,
    max_depth: Option<usize>,
    progress: Option<bool>,
    verbose: Option<bool>,
}

impl SchemadumpToml {
    pub(crate) fn verbose(&self) -> Option<bool> {
        self.settings.verbose
    }
}

/// Parse a config file. Missing or unreadable files give `None`; malformed ones are warned about.
pub(crate) fn load_schemadump_toml(path: &Path) -> Option<SchemadumpToml> {
    let s = std::fs::read_to_string(path).ok()?;
    parse_schemadump_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_schemadump_toml(s: &str) -> Result<SchemadumpToml, toml::de::Error> {
    toml::from_str(s)
}

/// Default config location: `.schemadump.toml` in `dir`.
pub(crate) fn default_config_path(dir: &Path) -> PathBuf {
    dir.join(PackagePaths::get().config_filename())
}

/// Overwrite config field from file when present.
macro_rules! apply_file_opt {
    ($file:expr, $config:expr, $file_field:ident => $config_field:ident) => {
        if let Some(v) = $file.$file_field.clone() {
            $config.$config_field = v;
        }
    };
}

/// Apply file settings to `config` (only fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_config(file: &SchemadumpToml, config: &mut RunConfig) {
    let s = &file.settings;
    apply_file_opt!(s, config, data_path => data_path);
    apply_file_opt!(s, config, schema_path => schema_path);
    apply_file_opt!(s, config, process_count => top_level_concurrency);
    apply_file_opt!(s, config, thread_pool_count => entry_concurrency);
    apply_file_opt!(s, config, lines => lines_per_sample);
    apply_file_opt!(s, config, on_error => on_error);
    apply_file_opt!(s, config, exclude => exclude);
    apply_file_opt!(s, config, max_depth => max_depth);
    apply_file_opt!(s, config, progress => progress);
}

/// Apply `SCHEMADUMP_ON_ERROR` when set to a valid policy.
pub(crate) fn apply_env_to_config(config: &mut RunConfig) {
    let key = PackagePaths::get().env_var("on_error");
    if let Ok(value) = std::env::var(&key) {
        match value.parse::<ErrorPolicy>() {
            Ok(policy) => config.on_error = policy,
            Err(e) => log::warn!("{key}: {e}"),
        }
    }
}
