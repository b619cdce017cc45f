//! schemadump: concurrent, recursive archive traversal that samples the first lines of
//! every leaf file into `.schema` files.

pub mod archive;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use error::{SampleError, SampleResult};
pub use types::*;

use log::debug;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Single entry point: sample every immediate child of `config.data_path` into
/// `config.schema_path` and return the run totals.
///
/// - **`cancel: None`** → run to completion.
/// - **`cancel: Some(flag)`** → setting `flag` stops new work; the call then returns
///   [`SampleError::Cancelled`]. Schema files already written stay in place.
///
/// Errors are disposed of according to `config.on_error`; only `raise` turns a failing file or
/// entry into an `Err`.
pub fn dump_schemas(
    config: &RunConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> SampleResult<RunSummary> {
    let config = config.clone().normalized();
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        config
    );
    pipeline::run(&config, cancel)
}
