//! Pipeline components: run context, error disposal, top-level orchestration.

pub mod context;
pub mod error_handler;
pub mod orchestrator;

pub use context::RunContext;
pub use error_handler::{dispose, guarded};
pub use orchestrator::{collect_inputs, run};
