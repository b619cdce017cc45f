//! schemadump CLI: sample the first lines of every file under the data directory.

use anyhow::Result;
use clap::Parser;
use schemadump::engine::arg_parser::Cli;
use schemadump::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
