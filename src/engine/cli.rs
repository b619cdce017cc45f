//! CLI command handler: merge settings, install Ctrl+C, run, report.

use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::arg_parser::Cli;
use crate::utils::schemadump_toml::{
    SchemadumpToml, apply_env_to_config, apply_file_to_config, default_config_path,
    load_schemadump_toml,
};
use crate::utils::setup_logging;
use crate::{RunConfig, dump_schemas};

/// Overwrite config field from CLI when the flag was given.
macro_rules! apply_cli_opt {
    ($cli:expr, $config:expr, $cli_field:ident => $config_field:ident) => {
        if let Some(v) = $cli.$cli_field.clone() {
            $config.$config_field = v;
        }
    };
}

/// Defaults < settings file < environment < CLI flags.
pub(crate) fn build_config(cli: &Cli, file: Option<&SchemadumpToml>) -> RunConfig {
    let mut config = RunConfig::default();
    if let Some(file) = file {
        apply_file_to_config(file, &mut config);
    }
    apply_env_to_config(&mut config);
    apply_cli_opt!(cli, config, data_path => data_path);
    apply_cli_opt!(cli, config, schema_path => schema_path);
    apply_cli_opt!(cli, config, process_count => top_level_concurrency);
    apply_cli_opt!(cli, config, thread_pool_count => entry_concurrency);
    apply_cli_opt!(cli, config, lines => lines_per_sample);
    apply_cli_opt!(cli, config, on_error => on_error);
    apply_cli_opt!(cli, config, max_depth => max_depth);
    apply_cli_opt!(cli, config, progress => progress);
    if !cli.exclude.is_empty() {
        config.exclude = cli.exclude.clone();
    }
    config.normalized()
}

/// Sample the configured data directory and print a one-line summary.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("resolve working directory")?;
    let env_path = cwd.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
    }

    let config_path = cli.config.clone().unwrap_or_else(|| default_config_path(&cwd));
    let file = load_schemadump_toml(&config_path);
    let verbose = cli
        .verbose
        .or_else(|| file.as_ref().and_then(SchemadumpToml::verbose))
        .unwrap_or(false);
    setup_logging(verbose);
    if cli.config.is_some() && file.is_none() {
        log::warn!("Config file {} not loaded", config_path.display());
    }

    let config = build_config(cli, file.as_ref());
    debug!("settings file: {}", config_path.display());

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    let summary = dump_schemas(&config, Some(cancel_requested))?;
    let label = format!("[{}]", env!("CARGO_PKG_NAME")).cyan().bold();
    println!(
        "{} Dumped {} schemas from {} files",
        label, summary.schemas_written, summary.inputs
    );
    if summary.errors > 0 {
        info!("{} errors were {}", summary.errors, config.on_error);
    }
    Ok(())
}
